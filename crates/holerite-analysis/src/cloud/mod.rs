//! Cloud document analysis.
//!
//! A [`DocumentAnalyzer`] returns the service's block graph as a
//! [`DocumentAnalysis`]; the core crate recovers key-value pairs and tables
//! from it. Small documents are analyzed in one call. Larger ones are staged
//! in object storage and polled until the job finishes, fails, or runs out of
//! attempts.

mod poll;
mod staging;
#[cfg(feature = "textract")]
mod textract;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use holerite::structured::DocumentAnalysis;

pub use poll::{poll_until, JobPoll, PollPolicy};
pub use staging::{staging_key, ObjectStaging, StagedObject};
#[cfg(feature = "textract")]
pub use staging::S3Staging;
#[cfg(feature = "textract")]
pub use textract::TextractAnalyzer;

/// Errors from the cloud tier. All of them are recoverable at job level: the
/// tier is recorded as failed and acquisition continues without it.
#[derive(Debug, Error)]
pub enum CloudError {
    #[error("Cloud analysis not configured: {0}")]
    NotConfigured(String),

    #[error("Analysis service error: {0}")]
    Service(String),

    #[error("Staging upload failed: {0}")]
    Staging(String),

    #[error("Analysis job failed: {0}")]
    JobFailed(String),

    #[error("Analysis job still running after {attempts} polls")]
    Timeout { attempts: u32 },

    #[error("Analysis cancelled")]
    Cancelled,

    #[error("Document too large for cloud analysis ({size} bytes, limit {limit})")]
    TooLarge { size: u64, limit: u64 },
}

/// A service that analyzes a whole document into text, key-value and table
/// blocks.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    /// Short name for logs and attempt summaries.
    fn name(&self) -> &'static str;

    /// Analyze `bytes`. Long-running analyses stop waiting as soon as
    /// `cancel` flips to true; the remote job is left to finish on its own.
    async fn analyze(
        &self,
        bytes: &[u8],
        filename: &str,
        cancel: watch::Receiver<bool>,
    ) -> Result<DocumentAnalysis, CloudError>;
}
