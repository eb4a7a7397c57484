//! OCR backend abstraction.

use std::path::Path;

use tempfile::TempDir;
use thiserror::Error;
use tracing::warn;

use holerite::config::AcquisitionConfig;

use super::pdf_utils;
use super::preprocess::preprocess_image;

/// Errors from OCR backends.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Recognition settings shared by OCR backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrConfig {
    /// Tesseract language list (e.g. "por+eng").
    pub language: String,
    /// Rasterization resolution for PDF pages.
    pub dpi: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "por+eng".to_string(),
            dpi: 300,
        }
    }
}

impl From<&AcquisitionConfig> for OcrConfig {
    fn from(config: &AcquisitionConfig) -> Self {
        Self {
            language: config.ocr_language.clone(),
            dpi: config.ocr_dpi,
        }
    }
}

/// An engine that turns page images into text.
pub trait OcrBackend: Send + Sync {
    /// Short name for logs and attempt summaries.
    fn name(&self) -> &'static str;

    /// Check if this backend can run (binaries installed).
    fn is_available(&self) -> bool;

    /// What is needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Core OCR: recognize text in an image file as-is.
    fn run_ocr(&self, image_path: &Path) -> Result<String, OcrError>;

    /// Recognize an image after grayscale and contrast preprocessing.
    ///
    /// Falls back to the unprocessed image when preprocessing fails.
    fn ocr_image(&self, image_path: &Path) -> Result<String, OcrError> {
        let temp_dir = TempDir::new()?;
        match preprocess_image(image_path, temp_dir.path()) {
            Ok(prepared) => self.run_ocr(&prepared),
            Err(e) => {
                warn!(
                    "Preprocessing {} failed, using raw image: {}",
                    image_path.display(),
                    e
                );
                self.run_ocr(image_path)
            }
        }
    }

    /// Rasterize one PDF page and recognize it.
    fn ocr_pdf_page(&self, pdf_path: &Path, page: u32, dpi: u32) -> Result<String, OcrError> {
        let temp_dir = TempDir::new()?;
        let image_path = pdf_utils::pdf_page_to_image(pdf_path, page, dpi, temp_dir.path())?;
        self.ocr_image(&image_path)
    }
}
