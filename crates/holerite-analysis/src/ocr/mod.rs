//! Local text extraction.
//!
//! - pdftotext/pdfinfo (poppler) for the embedded PDF text layer
//! - pdftoppm (poppler) to rasterize pages for OCR
//! - Tesseract for recognition, after grayscale and contrast preprocessing
//!
//! Everything here shells out to blocking tools; callers run it on
//! `spawn_blocking`.

mod backend;
mod extractor;
mod pdf_utils;
mod preprocess;
mod tesseract;
mod tools;

pub use backend::{OcrBackend, OcrConfig, OcrError};
pub use extractor::{ExtractionError, TextExtractor, TextLayer};
pub use pdf_utils::{find_page_image, pdf_page_to_image};
pub use preprocess::preprocess_image;
pub use tesseract::TesseractBackend;
pub use tools::{check_binary, check_tools, REQUIRED_TOOLS};
