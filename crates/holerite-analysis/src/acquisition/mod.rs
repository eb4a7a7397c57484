//! Tiered text acquisition.
//!
//! Tiers run cheapest first: the PDF text layer, then local OCR, then cloud
//! analysis when policy allows it. A tier is accepted when its text passes
//! the character and keyword-coverage thresholds, and acceptance stops the
//! run unless cross-validation asks for every tier. Tier failures are
//! recorded and never fatal; only unreadable input is a job error.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use holerite::config::{AcquisitionConfig, CloudConfig};
use holerite::structured::recover;
use holerite::utils::text::{keyword_hits, non_whitespace_len};
use holerite::{Acquisition, AcquisitionStrategy, RawText};

use crate::cloud::{CloudError, DocumentAnalyzer};
use crate::ocr::{ExtractionError, OcrBackend, OcrError, TextLayer};

/// Terminal per-job errors: the input is not a document we can read.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupt document: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Input formats the tiers understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    /// A scanned page image; skips the text-layer tier.
    Image,
}

/// Detect the document format from its leading bytes.
///
/// Returns the kind and the file extension to use for temp files.
pub fn sniff(bytes: &[u8]) -> Result<(DocumentKind, &'static str), DocumentError> {
    let kind = infer::get(bytes)
        .ok_or_else(|| DocumentError::UnsupportedFormat("unknown".to_string()))?;
    match kind.mime_type() {
        "application/pdf" => Ok((DocumentKind::Pdf, kind.extension())),
        "image/png" | "image/jpeg" | "image/tiff" | "image/bmp" | "image/gif" => {
            Ok((DocumentKind::Image, kind.extension()))
        }
        other => Err(DocumentError::UnsupportedFormat(other.to_string())),
    }
}

/// Audit record for one tier run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptSummary {
    pub strategy: AcquisitionStrategy,
    /// Non-whitespace characters produced.
    pub chars: usize,
    pub keyword_hits: usize,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything acquisition produced for one document.
#[derive(Debug, Clone)]
pub struct AcquisitionOutcome {
    /// Attempts to feed the assembler, best first. Holds a single failed
    /// attempt when no tier produced text.
    pub attempts: Vec<Acquisition>,
    pub summaries: Vec<AttemptSummary>,
    /// The tier that passed the thresholds, if any did.
    pub accepted: Option<AcquisitionStrategy>,
}

#[derive(Debug, Error)]
enum TierError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Ocr(#[from] OcrError),
    #[error(transparent)]
    Cloud(#[from] CloudError),
    #[error("worker task failed: {0}")]
    Join(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    TextLayer,
    Ocr,
    Cloud,
}

impl Tier {
    fn strategy(self) -> AcquisitionStrategy {
        match self {
            Tier::TextLayer => AcquisitionStrategy::NativeText,
            Tier::Ocr => AcquisitionStrategy::LocalOcr,
            Tier::Cloud => AcquisitionStrategy::CloudAnalysis,
        }
    }
}

struct TierRun {
    attempt: Option<Acquisition>,
    summary: AttemptSummary,
}

/// Runs the acquisition tiers for one document at a time.
pub struct TextAcquirer {
    text_layer: Arc<dyn TextLayer>,
    ocr: Arc<dyn OcrBackend>,
    analyzer: Option<Arc<dyn DocumentAnalyzer>>,
    config: AcquisitionConfig,
    cloud: CloudConfig,
}

impl TextAcquirer {
    pub fn new(
        text_layer: Arc<dyn TextLayer>,
        ocr: Arc<dyn OcrBackend>,
        config: AcquisitionConfig,
    ) -> Self {
        Self {
            text_layer,
            ocr,
            analyzer: None,
            config,
            cloud: CloudConfig {
                enabled: false,
                ..CloudConfig::default()
            },
        }
    }

    /// Enable the cloud tier under `cloud`'s size policy.
    pub fn with_analyzer(mut self, analyzer: Arc<dyn DocumentAnalyzer>, cloud: CloudConfig) -> Self {
        self.analyzer = Some(analyzer);
        self.cloud = cloud;
        self
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    pub fn has_cloud(&self) -> bool {
        self.analyzer.is_some() && self.cloud.enabled
    }

    fn plan(&self, kind: DocumentKind) -> Vec<Tier> {
        let mut tiers = Vec::with_capacity(3);
        if kind == DocumentKind::Pdf {
            tiers.push(Tier::TextLayer);
        }
        tiers.push(Tier::Ocr);
        if self.has_cloud() {
            tiers.push(Tier::Cloud);
        }
        tiers
    }

    fn min_chars(&self, tier: Tier) -> usize {
        match tier {
            Tier::TextLayer => self.config.min_native_chars,
            Tier::Ocr | Tier::Cloud => self.config.min_ocr_chars,
        }
    }

    /// Acquire text for one document.
    ///
    /// Fails only for unreadable input; tier failures end up in the
    /// summaries and, when nothing produced text, in a failed attempt.
    pub async fn acquire(
        &self,
        bytes: &[u8],
        filename: &str,
        cancel: &watch::Receiver<bool>,
    ) -> Result<AcquisitionOutcome, DocumentError> {
        let (kind, extension) = sniff(bytes)?;

        let mut file = tempfile::Builder::new()
            .prefix("holerite-")
            .suffix(&format!(".{}", extension))
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        let path = file.path().to_path_buf();

        let pages = match kind {
            DocumentKind::Pdf => self.page_count(&path).await?,
            DocumentKind::Image => 1,
        };
        debug!("{}: {:?}, {} page(s), {} bytes", filename, kind, pages, bytes.len());

        let mut runs: Vec<TierRun> = Vec::new();
        for tier in self.plan(kind) {
            if *cancel.borrow() {
                debug!("{}: cancelled before {:?} tier", filename, tier);
                break;
            }
            let result = match tier {
                Tier::TextLayer => self.run_text_layer(&path, pages).await,
                Tier::Ocr => self.run_ocr(&path, kind, pages).await,
                Tier::Cloud => self.run_cloud(bytes, filename, cancel.clone()).await,
            };
            let run = self.evaluate(tier, result);
            let accepted = run.summary.accepted;
            if let Some(error) = &run.summary.error {
                warn!("{}: {} tier failed: {}", filename, tier.strategy(), error);
            } else {
                debug!(
                    "{}: {} tier produced {} chars, {} keywords",
                    filename,
                    tier.strategy(),
                    run.summary.chars,
                    run.summary.keyword_hits
                );
            }
            runs.push(run);
            if accepted && !self.config.cross_validate {
                break;
            }
        }

        Ok(self.conclude(filename, runs))
    }

    fn evaluate(&self, tier: Tier, result: Result<Acquisition, TierError>) -> TierRun {
        match result {
            Ok(attempt) => {
                let content = attempt.raw.content();
                let chars = non_whitespace_len(content);
                let hits = keyword_hits(content, &self.config.coverage_keywords);
                let accepted = chars >= self.min_chars(tier) && hits >= self.config.min_keyword_hits;
                TierRun {
                    attempt: Some(attempt),
                    summary: AttemptSummary {
                        strategy: tier.strategy(),
                        chars,
                        keyword_hits: hits,
                        accepted,
                        error: None,
                    },
                }
            }
            Err(e) => TierRun {
                attempt: None,
                summary: AttemptSummary {
                    strategy: tier.strategy(),
                    chars: 0,
                    keyword_hits: 0,
                    accepted: false,
                    error: Some(e.to_string()),
                },
            },
        }
    }

    /// Order attempts for the assembler: the accepted tier (or the one with
    /// the most text) first, then, when cross-validating, every other tier
    /// that produced text.
    fn conclude(&self, filename: &str, runs: Vec<TierRun>) -> AcquisitionOutcome {
        let accepted_index = runs.iter().position(|r| r.summary.accepted);
        let lead = accepted_index.or_else(|| {
            runs.iter()
                .enumerate()
                .filter(|(_, r)| r.attempt.is_some() && r.summary.chars > 0)
                .fold(None, |best: Option<(usize, usize)>, (i, r)| match best {
                    Some((_, chars)) if chars >= r.summary.chars => best,
                    _ => Some((i, r.summary.chars)),
                })
                .map(|(i, _)| i)
        });

        match (accepted_index, lead) {
            (Some(i), _) => info!("{}: accepted {} text", filename, runs[i].summary.strategy),
            (None, Some(i)) => warn!(
                "{}: no tier passed coverage, using best effort {} text",
                filename, runs[i].summary.strategy
            ),
            (None, None) => warn!("{}: no acquisition tier produced text", filename),
        }

        let accepted = accepted_index.map(|i| runs[i].summary.strategy);
        let summaries: Vec<AttemptSummary> = runs.iter().map(|r| r.summary.clone()).collect();

        let mut attempts = Vec::new();
        let mut others = Vec::new();
        for (i, run) in runs.into_iter().enumerate() {
            let Some(attempt) = run.attempt else { continue };
            if Some(i) == lead {
                attempts.push(attempt);
            } else if self.config.cross_validate && run.summary.chars > 0 {
                others.push(attempt);
            }
        }
        attempts.extend(others);
        if attempts.is_empty() {
            attempts.push(Acquisition::text(RawText::failed()));
        }

        AcquisitionOutcome {
            attempts,
            summaries,
            accepted,
        }
    }

    async fn page_count(&self, path: &Path) -> Result<u32, DocumentError> {
        let layer = Arc::clone(&self.text_layer);
        let path = path.to_path_buf();
        let result = tokio::task::spawn_blocking(move || layer.page_count(&path))
            .await
            .map_err(|e| DocumentError::Io(std::io::Error::other(e.to_string())))?;
        match result {
            Ok(pages) => Ok(pages.max(1)),
            Err(ExtractionError::ExtractionFailed(reason)) => Err(DocumentError::Corrupt(reason)),
            Err(ExtractionError::ToolNotFound(tool)) => {
                warn!("{} not found, assuming a single page", tool);
                Ok(1)
            }
            Err(ExtractionError::Io(e)) => Err(DocumentError::Io(e)),
        }
    }

    async fn run_text_layer(&self, path: &Path, pages: u32) -> Result<Acquisition, TierError> {
        let layer = Arc::clone(&self.text_layer);
        let path: PathBuf = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || -> Result<String, ExtractionError> {
            let mut texts = Vec::with_capacity(pages as usize);
            for page in 1..=pages {
                match layer.page_text(&path, page) {
                    Ok(text) => texts.push(text),
                    Err(ExtractionError::ExtractionFailed(reason)) => {
                        warn!("Text layer unreadable on page {}: {}", page, reason);
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(texts.join("\n\n"))
        })
        .await
        .map_err(|e| TierError::Join(e.to_string()))??;

        Ok(Acquisition::text(RawText::new(
            text,
            AcquisitionStrategy::NativeText,
            pages,
        )))
    }

    async fn run_ocr(
        &self,
        path: &Path,
        kind: DocumentKind,
        pages: u32,
    ) -> Result<Acquisition, TierError> {
        let backend = Arc::clone(&self.ocr);
        let path = path.to_path_buf();
        let dpi = self.config.ocr_dpi;
        let text = tokio::task::spawn_blocking(move || -> Result<String, OcrError> {
            if kind == DocumentKind::Image {
                return backend.ocr_image(&path);
            }
            let mut texts = Vec::with_capacity(pages as usize);
            let mut last_error = None;
            for page in 1..=pages {
                match backend.ocr_pdf_page(&path, page, dpi) {
                    Ok(text) => texts.push(text),
                    Err(e @ OcrError::BackendNotAvailable(_)) => return Err(e),
                    Err(e) => {
                        warn!("OCR failed for page {}: {}", page, e);
                        last_error = Some(e);
                    }
                }
            }
            match last_error {
                Some(e) if texts.is_empty() => Err(e),
                _ => Ok(texts.join("\n\n")),
            }
        })
        .await
        .map_err(|e| TierError::Join(e.to_string()))??;

        Ok(Acquisition::text(RawText::new(
            text,
            AcquisitionStrategy::LocalOcr,
            pages,
        )))
    }

    async fn run_cloud(
        &self,
        bytes: &[u8],
        filename: &str,
        cancel: watch::Receiver<bool>,
    ) -> Result<Acquisition, TierError> {
        let analyzer = self
            .analyzer
            .as_ref()
            .ok_or_else(|| CloudError::NotConfigured("no analyzer".to_string()))?;
        let size = bytes.len() as u64;
        if !self.cloud.allows(size) {
            return Err(CloudError::TooLarge {
                size,
                limit: self.cloud.max_document_bytes,
            }
            .into());
        }

        debug!("{}: sending {} bytes to {}", filename, size, analyzer.name());
        let analysis = analyzer.analyze(bytes, filename, cancel).await?;
        let raw = RawText::new(
            analysis.text_lines(),
            AcquisitionStrategy::CloudAnalysis,
            analysis.page_count(),
        );
        Ok(Acquisition::structured(raw, recover(&analysis)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_pdf_and_images() {
        assert_eq!(sniff(b"%PDF-1.7\n%...").unwrap(), (DocumentKind::Pdf, "pdf"));
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(sniff(&png).unwrap(), (DocumentKind::Image, "png"));
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10];
        assert_eq!(sniff(&jpeg).unwrap().0, DocumentKind::Image);
    }

    #[test]
    fn test_sniff_rejects_other_formats() {
        assert!(matches!(
            sniff(b"just some text"),
            Err(DocumentError::UnsupportedFormat(m)) if m == "unknown"
        ));
        let gzip = [0x1f, 0x8b, 0x08, 0, 0, 0, 0, 0];
        assert!(matches!(
            sniff(&gzip),
            Err(DocumentError::UnsupportedFormat(m)) if m == "application/gzip"
        ));
    }
}
