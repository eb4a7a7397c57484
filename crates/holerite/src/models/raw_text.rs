//! Acquired document text.

use serde::{Deserialize, Serialize};

/// Which acquisition strategy produced a [`RawText`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionStrategy {
    /// Embedded PDF text layer.
    NativeText,
    /// Local OCR of rasterized pages.
    LocalOcr,
    /// Cloud document-analysis service.
    CloudAnalysis,
    /// Every strategy was exhausted without text.
    Failed,
}

impl AcquisitionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NativeText => "native_text",
            Self::LocalOcr => "local_ocr",
            Self::CloudAnalysis => "cloud_analysis",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for AcquisitionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Plain-text result of one acquisition attempt. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawText {
    content: String,
    strategy: AcquisitionStrategy,
    page_count: u32,
}

impl RawText {
    pub fn new(content: impl Into<String>, strategy: AcquisitionStrategy, page_count: u32) -> Self {
        Self {
            content: content.into(),
            strategy,
            page_count,
        }
    }

    /// Total-failure marker: empty content tagged [`AcquisitionStrategy::Failed`].
    pub fn failed() -> Self {
        Self::new(String::new(), AcquisitionStrategy::Failed, 0)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn strategy(&self) -> AcquisitionStrategy {
        self.strategy
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn is_failed(&self) -> bool {
        self.strategy == AcquisitionStrategy::Failed || self.content.trim().is_empty()
    }
}
