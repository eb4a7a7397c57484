//! holerite - Brazilian payslip field extraction.
//!
//! Core library: the payslip data model, value normalization, field rules,
//! rubrica parsing, candidate aggregation, and draft assembly. Text
//! acquisition (native layer, OCR, cloud analysis) lives in
//! `holerite-analysis`.

// Model types use `from_str` methods that return Option<Self>,
// not Result<Self, Error> as std::str::FromStr requires.
#![allow(clippy::should_implement_trait)]

pub mod candidates;
pub mod config;
pub mod derive;
pub mod error;
pub mod extract;
pub mod identity;
pub mod models;
pub mod pipeline;
pub mod rubricas;
pub mod structured;
pub mod utils;

pub use candidates::{aggregate, FieldCandidates, PrimaryValues};
pub use error::{ConfigError, RuleError};
pub use extract::FieldRegistry;
pub use models::{
    AcquisitionStrategy, Field, HoleriteDraft, RawText, RubricaEntry, StructuredEvidence,
    ValidationStatus,
};
pub use pipeline::{Acquisition, DraftAssembler, Extraction, JobContext};
pub use utils::money::Money;
