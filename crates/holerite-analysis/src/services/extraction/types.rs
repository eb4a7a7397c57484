//! Types for the extraction service.

use std::path::Path;

use serde::Serialize;

use holerite::{FieldCandidates, HoleriteDraft, JobContext, RubricaEntry, ValidationStatus};

use crate::acquisition::AttemptSummary;

/// One document to extract.
#[derive(Debug, Clone)]
pub struct DocumentJob {
    pub bytes: Vec<u8>,
    pub context: JobContext,
}

impl DocumentJob {
    pub fn new(bytes: Vec<u8>, context: JobContext) -> Self {
        Self { bytes, context }
    }

    /// Read a document from disk. The context's `fonte_arquivo` is set to
    /// the file name when empty.
    pub async fn load(path: &Path, mut context: JobContext) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        if context.fonte_arquivo.is_empty() {
            context.fonte_arquivo = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
        }
        Ok(Self::new(bytes, context))
    }

    pub fn fonte(&self) -> &str {
        &self.context.fonte_arquivo
    }
}

/// Full result of an extracted job.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub draft: HoleriteDraft,
    pub candidates: FieldCandidates,
    pub rubricas: Vec<RubricaEntry>,
    pub attempts: Vec<AttemptSummary>,
}

/// Outcome of one job. Only unreadable input produces no draft.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobOutcome {
    Extracted(Box<ExtractionReport>),
    Rejected { fonte: String, error: String },
    Cancelled { fonte: String },
}

impl JobOutcome {
    pub fn fonte(&self) -> &str {
        match self {
            JobOutcome::Extracted(report) => &report.draft.fonte_arquivo,
            JobOutcome::Rejected { fonte, .. } | JobOutcome::Cancelled { fonte } => fonte,
        }
    }

    pub fn report(&self) -> Option<&ExtractionReport> {
        match self {
            JobOutcome::Extracted(report) => Some(report),
            _ => None,
        }
    }
}

/// Events emitted during a batch for progress tracking.
#[derive(Debug, Clone)]
pub enum ExtractionEvent {
    BatchStarted {
        total_jobs: usize,
    },
    JobStarted {
        index: usize,
        fonte: String,
    },
    TierAttempted {
        index: usize,
        summary: AttemptSummary,
    },
    JobCompleted {
        index: usize,
        fonte: String,
        status: ValidationStatus,
    },
    JobRejected {
        index: usize,
        fonte: String,
        error: String,
    },
    JobCancelled {
        index: usize,
        fonte: String,
    },
    BatchComplete {
        extracted: usize,
        pendente: usize,
        rejected: usize,
        cancelled: usize,
    },
}

/// Results of a batch, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<JobOutcome>,
    pub extracted: usize,
    /// Extracted drafts still flagged for review.
    pub pendente: usize,
    pub rejected: usize,
    pub cancelled: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: Vec<JobOutcome>) -> Self {
        let mut summary = Self::default();
        for outcome in &outcomes {
            match outcome {
                JobOutcome::Extracted(report) => {
                    summary.extracted += 1;
                    if report.draft.status_validacao == ValidationStatus::Pendente {
                        summary.pendente += 1;
                    }
                }
                JobOutcome::Rejected { .. } => summary.rejected += 1,
                JobOutcome::Cancelled { .. } => summary.cancelled += 1,
            }
        }
        summary.outcomes = outcomes;
        summary
    }
}
