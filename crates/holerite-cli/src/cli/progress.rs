//! Batch progress display.
//!
//! Drives a single progress bar on stderr from the extraction service's
//! event channel. Per-job problems are printed above the bar so they stay
//! visible after it clears.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use holerite::ValidationStatus;
use holerite_analysis::ExtractionEvent;

use super::icons::{error, warning};

pub struct BatchProgress {
    bar: ProgressBar,
}

impl BatchProgress {
    pub fn new(total_jobs: usize) -> anyhow::Result<Self> {
        let bar = ProgressBar::new(total_jobs as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")?
                .progress_chars("█▓░"),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Ok(Self { bar })
    }

    /// Handle to the bar, for printing from other tasks without corrupting it.
    pub fn bar(&self) -> ProgressBar {
        self.bar.clone()
    }

    /// Consume events until the sender is dropped, then clear the bar.
    pub async fn run(self, mut events: mpsc::Receiver<ExtractionEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        self.bar.finish_and_clear();
    }

    fn handle(&self, event: ExtractionEvent) {
        match event {
            ExtractionEvent::BatchStarted { total_jobs } => {
                self.bar.set_length(total_jobs as u64);
            }
            ExtractionEvent::JobStarted { fonte, .. } => {
                self.bar.set_message(fonte);
            }
            ExtractionEvent::TierAttempted { index, summary } => {
                tracing::debug!(
                    "job {}: {} produced {} chars, {} keyword hits, accepted={}",
                    index,
                    summary.strategy,
                    summary.chars,
                    summary.keyword_hits,
                    summary.accepted
                );
            }
            ExtractionEvent::JobCompleted { fonte, status, .. } => {
                if status == ValidationStatus::Pendente {
                    self.bar
                        .suspend(|| eprintln!("{} {} needs review", warning(), fonte));
                }
                self.bar.inc(1);
            }
            ExtractionEvent::JobRejected {
                fonte, error: err, ..
            } => {
                self.bar
                    .suspend(|| eprintln!("{} {}: {}", error(), fonte, err));
                self.bar.inc(1);
            }
            ExtractionEvent::JobCancelled { .. } => {
                self.bar.inc(1);
            }
            ExtractionEvent::BatchComplete { .. } => {
                self.bar.set_message("done");
            }
        }
    }
}
