//! Data models for payslip extraction.

mod draft;
mod evidence;
mod field;
mod raw_text;
mod rubrica;

pub use draft::{HoleriteDraft, ValidationStatus};
pub use evidence::{StructuredEvidence, TableGrid};
pub use field::Field;
pub use raw_text::{AcquisitionStrategy, RawText};
pub use rubrica::RubricaEntry;
