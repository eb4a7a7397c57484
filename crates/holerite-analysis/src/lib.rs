//! Text acquisition and batch extraction for holerite.
//!
//! Turns document bytes into the acquisition attempts the core assembler
//! consumes: the embedded PDF text layer (poppler), local OCR (tesseract),
//! and optionally a cloud document-analysis service. The extraction service
//! runs single jobs and bounded-concurrency batches on top of that.

pub mod acquisition;
pub mod cloud;
pub mod ocr;
pub mod services;

pub use acquisition::{AcquisitionOutcome, AttemptSummary, DocumentError, TextAcquirer};
pub use cloud::{CloudError, DocumentAnalyzer};
pub use ocr::{ExtractionError, OcrBackend, OcrError, TesseractBackend, TextExtractor, TextLayer};
pub use services::{
    BatchSummary, DocumentJob, ExtractionEvent, ExtractionReport, ExtractionService, JobOutcome,
};
