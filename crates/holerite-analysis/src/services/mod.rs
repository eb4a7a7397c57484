//! Job-level services built on acquisition and draft assembly.

pub mod extraction;

pub use extraction::{
    BatchSummary, DocumentJob, ExtractionEvent, ExtractionReport, ExtractionService, JobOutcome,
};
