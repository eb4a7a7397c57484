//! PDF text-layer extraction using poppler's pdftotext and pdfinfo.

use std::path::Path;
use std::process::Command;

use thiserror::Error;

use super::tools::check_binary;

/// Errors from the native text-layer tools.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stdout of a finished command, or the matching error.
fn handle_cmd_output(
    result: std::io::Result<std::process::Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, ExtractionError> {
    match result {
        Ok(output) if output.status.success() => {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(ExtractionError::ExtractionFailed(format!(
                "{}: {}",
                error_prefix,
                stderr.trim()
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

/// Source of a PDF's embedded text, page by page.
pub trait TextLayer: Send + Sync {
    /// Number of pages. `ExtractionFailed` means the file was rejected as a
    /// PDF; `ToolNotFound` means the page count is unknown.
    fn page_count(&self, pdf_path: &Path) -> Result<u32, ExtractionError>;

    /// Layout-preserving text of one page (1-based).
    fn page_text(&self, pdf_path: &Path, page: u32) -> Result<String, ExtractionError>;
}

/// Text layer read with poppler command-line tools.
#[derive(Debug, Clone, Default)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Whether pdftotext and pdfinfo are installed.
    pub fn is_available() -> bool {
        check_binary("pdftotext") && check_binary("pdfinfo")
    }
}

fn parse_page_count(info: &str) -> Option<u32> {
    info.lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|rest| rest.trim().parse().ok())
}

impl TextLayer for TextExtractor {
    fn page_count(&self, pdf_path: &Path) -> Result<u32, ExtractionError> {
        let output = Command::new("pdfinfo").arg(pdf_path).output();
        let info = handle_cmd_output(output, "pdfinfo (install poppler-utils)", "pdfinfo failed")?;
        Ok(parse_page_count(&info).unwrap_or(1).max(1))
    }

    fn page_text(&self, pdf_path: &Path, page: u32) -> Result<String, ExtractionError> {
        let page_str = page.to_string();
        let output = Command::new("pdftotext")
            .args(["-layout", "-enc", "UTF-8", "-f", &page_str, "-l", &page_str])
            .arg(pdf_path)
            .arg("-")
            .output();

        handle_cmd_output(
            output,
            "pdftotext (install poppler-utils)",
            &format!("pdftotext failed on page {}", page),
        )
    }
}
