//! Extraction service.
//!
//! Runs acquisition and draft assembly for single documents and for
//! batches. Jobs in a batch share only read-only configuration, run up to
//! `workers` at a time, and report outcomes independently. Emits events for
//! progress tracking; UI concerns stay with the caller.

mod types;

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use holerite::config::Config;
use holerite::DraftAssembler;

use crate::acquisition::TextAcquirer;
use crate::ocr::{OcrConfig, TesseractBackend, TextExtractor};

pub use types::{BatchSummary, DocumentJob, ExtractionEvent, ExtractionReport, JobOutcome};

pub struct ExtractionService {
    acquirer: TextAcquirer,
    assembler: DraftAssembler,
}

impl ExtractionService {
    pub fn new(acquirer: TextAcquirer, assembler: DraftAssembler) -> Self {
        Self {
            acquirer,
            assembler,
        }
    }

    /// Build the service with poppler, tesseract and, when the cloud tier is
    /// enabled, Textract.
    pub async fn from_config(config: &Config) -> Self {
        let ocr = TesseractBackend::with_config(OcrConfig::from(&config.acquisition));
        let acquirer = TextAcquirer::new(
            Arc::new(TextExtractor::new()),
            Arc::new(ocr),
            config.acquisition.clone(),
        );
        let acquirer = Self::attach_cloud(acquirer, config).await;
        Self::new(acquirer, DraftAssembler::from_config(&config.extraction))
    }

    #[cfg(feature = "textract")]
    async fn attach_cloud(acquirer: TextAcquirer, config: &Config) -> TextAcquirer {
        if !config.cloud.enabled {
            return acquirer;
        }
        let analyzer = crate::cloud::TextractAnalyzer::from_config(&config.cloud).await;
        acquirer.with_analyzer(Arc::new(analyzer), config.cloud.clone())
    }

    #[cfg(not(feature = "textract"))]
    async fn attach_cloud(acquirer: TextAcquirer, config: &Config) -> TextAcquirer {
        if config.cloud.enabled {
            tracing::warn!("Cloud analysis enabled but built without the textract feature");
        }
        acquirer
    }

    pub fn acquirer(&self) -> &TextAcquirer {
        &self.acquirer
    }

    /// Extract one document.
    pub async fn process(&self, job: &DocumentJob, cancel: &watch::Receiver<bool>) -> JobOutcome {
        let fonte = job.fonte().to_string();
        if *cancel.borrow() {
            return JobOutcome::Cancelled { fonte };
        }

        let outcome = match self.acquirer.acquire(&job.bytes, &fonte, cancel).await {
            Ok(outcome) => outcome,
            Err(e) => {
                return JobOutcome::Rejected {
                    fonte,
                    error: e.to_string(),
                }
            }
        };
        if *cancel.borrow() {
            debug!("{}: cancelled after acquisition, discarding", fonte);
            return JobOutcome::Cancelled { fonte };
        }

        let extraction = self.assembler.assemble(&outcome.attempts, &job.context);
        JobOutcome::Extracted(Box::new(ExtractionReport {
            draft: extraction.draft,
            candidates: extraction.candidates,
            rubricas: extraction.rubricas,
            attempts: outcome.summaries,
        }))
    }

    /// Extract a batch with at most `workers` jobs in flight.
    ///
    /// A failing job never affects its siblings. Outcomes keep input order.
    /// Once `cancel` flips, jobs not yet started are reported as cancelled
    /// and in-flight jobs stop at their next checkpoint.
    pub async fn process_batch(
        &self,
        jobs: Vec<DocumentJob>,
        workers: usize,
        event_tx: mpsc::Sender<ExtractionEvent>,
        cancel: watch::Receiver<bool>,
    ) -> BatchSummary {
        let _ = event_tx
            .send(ExtractionEvent::BatchStarted {
                total_jobs: jobs.len(),
            })
            .await;

        let outcomes: Vec<JobOutcome> = stream::iter(jobs.into_iter().enumerate())
            .map(|(index, job)| {
                let event_tx = event_tx.clone();
                let cancel = cancel.clone();
                async move { self.run_job(index, job, event_tx, cancel).await }
            })
            .buffered(workers.max(1))
            .collect()
            .await;

        let summary = BatchSummary::from_outcomes(outcomes);
        info!(
            "Batch complete: {} extracted ({} pendente), {} rejected, {} cancelled",
            summary.extracted, summary.pendente, summary.rejected, summary.cancelled
        );
        let _ = event_tx
            .send(ExtractionEvent::BatchComplete {
                extracted: summary.extracted,
                pendente: summary.pendente,
                rejected: summary.rejected,
                cancelled: summary.cancelled,
            })
            .await;
        summary
    }

    async fn run_job(
        &self,
        index: usize,
        job: DocumentJob,
        event_tx: mpsc::Sender<ExtractionEvent>,
        cancel: watch::Receiver<bool>,
    ) -> JobOutcome {
        let fonte = job.fonte().to_string();
        let _ = event_tx
            .send(ExtractionEvent::JobStarted {
                index,
                fonte: fonte.clone(),
            })
            .await;

        let outcome = self.process(&job, &cancel).await;

        let event = match &outcome {
            JobOutcome::Extracted(report) => {
                for summary in &report.attempts {
                    let _ = event_tx
                        .send(ExtractionEvent::TierAttempted {
                            index,
                            summary: summary.clone(),
                        })
                        .await;
                }
                ExtractionEvent::JobCompleted {
                    index,
                    fonte,
                    status: report.draft.status_validacao,
                }
            }
            JobOutcome::Rejected { error, .. } => ExtractionEvent::JobRejected {
                index,
                fonte,
                error: error.clone(),
            },
            JobOutcome::Cancelled { .. } => ExtractionEvent::JobCancelled { index, fonte },
        };
        let _ = event_tx.send(event).await;
        outcome
    }
}
