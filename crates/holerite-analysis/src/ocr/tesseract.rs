//! Tesseract OCR backend via the command-line tool.

use std::path::Path;
use std::process::Command;

use super::backend::{OcrBackend, OcrConfig, OcrError};
use super::tools::{check_binary, PDFTOPPM_NOT_FOUND};

pub struct TesseractBackend {
    config: OcrConfig,
}

impl TesseractBackend {
    pub fn new() -> Self {
        Self::with_config(OcrConfig::default())
    }

    pub fn with_config(config: OcrConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// Installed language packs, from `tesseract --list-langs`.
    pub fn installed_languages() -> Result<Vec<String>, OcrError> {
        let output = match Command::new("tesseract").arg("--list-langs").output() {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OcrError::BackendNotAvailable(
                    "tesseract not found (install tesseract-ocr)".to_string(),
                ))
            }
            Err(e) => return Err(OcrError::Io(e)),
        };
        // Older releases print the list on stderr.
        let listing = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).to_string()
        } else {
            String::from_utf8_lossy(&output.stdout).to_string()
        };
        Ok(parse_language_list(&listing))
    }

    /// Language packs named in the configured language list but not installed.
    pub fn missing_languages(&self) -> Result<Vec<String>, OcrError> {
        let installed = Self::installed_languages()?;
        Ok(self
            .config
            .language
            .split('+')
            .filter(|lang| !lang.is_empty() && !installed.iter().any(|i| i == lang))
            .map(String::from)
            .collect())
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_language_list(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("List of available languages"))
        .map(String::from)
        .collect()
}

impl OcrBackend for TesseractBackend {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        check_binary("tesseract") && check_binary("pdftoppm")
    }

    fn availability_hint(&self) -> String {
        if !check_binary("tesseract") {
            "Tesseract not installed. Install with: apt install tesseract-ocr tesseract-ocr-por"
                .to_string()
        } else if !check_binary("pdftoppm") {
            PDFTOPPM_NOT_FOUND.to_string()
        } else {
            "Tesseract is available".to_string()
        }
    }

    fn run_ocr(&self, image_path: &Path) -> Result<String, OcrError> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.config.language])
            .output();

        match output {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(OcrError::OcrFailed(format!("tesseract failed: {}", stderr.trim())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                OcrError::BackendNotAvailable("tesseract not found (install tesseract-ocr)".to_string()),
            ),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_language_list() {
        let listing = "List of available languages in \"/usr/share/tessdata/\" (3):\neng\nosd\npor\n";
        assert_eq!(parse_language_list(listing), vec!["eng", "osd", "por"]);
    }

    #[test]
    fn test_default_config() {
        let backend = TesseractBackend::default();
        assert_eq!(backend.config().language, "por+eng");
        assert_eq!(backend.config().dpi, 300);
        assert_eq!(backend.name(), "tesseract");
    }
}
