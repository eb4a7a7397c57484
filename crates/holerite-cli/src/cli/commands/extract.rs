//! Batch extraction command.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use console::style;
use tokio::sync::{mpsc, watch};

use holerite::config::Config;
use holerite::JobContext;
use holerite_analysis::{DocumentJob, ExtractionService, JobOutcome};

use crate::cli::icons::{arrow, error, success, warning};
use crate::cli::progress::BatchProgress;

pub struct ExtractArgs {
    pub files: Vec<PathBuf>,
    pub workers: Option<usize>,
    pub user_email: Option<String>,
    pub data_pagamento: Option<String>,
    /// Overrides the configured cloud switch when set.
    pub cloud: Option<bool>,
    pub cross_validate: bool,
    pub pretty: bool,
    pub output: Option<PathBuf>,
}

impl ExtractArgs {
    fn context(&self) -> JobContext {
        let mut context = JobContext::default();
        if let Some(email) = &self.user_email {
            context = context.with_user_email(email);
        }
        if let Some(date) = &self.data_pagamento {
            context = context.with_data_pagamento(date);
        }
        context
    }
}

/// Extract drafts from every file and write one result per file.
pub async fn cmd_extract(mut config: Config, args: ExtractArgs) -> anyhow::Result<()> {
    if let Some(cloud) = args.cloud {
        config.cloud.enabled = cloud;
    }
    if args.cross_validate {
        config.acquisition.cross_validate = true;
    }
    let workers = args.workers.unwrap_or(config.batch.workers).max(1);

    let mut writer = open_output(args.output.as_ref())?;

    // Files that cannot be read are reported inline and never reach the batch;
    // their slots are filled now, the rest after the batch.
    let mut slots = Vec::with_capacity(args.files.len());
    let mut jobs = Vec::with_capacity(args.files.len());
    for path in &args.files {
        match DocumentJob::load(path, args.context()).await {
            Ok(job) => {
                jobs.push(job);
                slots.push(None);
            }
            Err(e) => {
                eprintln!("{} {}: {}", error(), path.display(), e);
                slots.push(Some(JobOutcome::Rejected {
                    fonte: path.display().to_string(),
                    error: format!("Failed to read file: {}", e),
                }));
            }
        }
    }

    if jobs.is_empty() {
        eprintln!("{} No readable documents", warning());
        let outcomes = in_input_order(slots, Vec::new());
        write_outcomes(&mut writer, &outcomes, args.pretty)?;
        return Ok(());
    }

    eprintln!(
        "{} Extracting {} document(s) with {} worker(s){}",
        arrow(),
        jobs.len(),
        workers,
        if config.cloud.enabled {
            " (cloud fallback enabled)"
        } else {
            ""
        }
    );

    let service = ExtractionService::from_config(&config).await;

    let progress = BatchProgress::new(jobs.len())?;
    let bar = progress.bar();
    let (event_tx, event_rx) = mpsc::channel(100);
    let progress_handle = tokio::spawn(progress.run(event_rx));

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            bar.suspend(|| {
                eprintln!(
                    "{} Interrupted, finishing in-flight documents",
                    warning()
                )
            });
            let _ = cancel_tx.send(true);
        }
    });

    let summary = service
        .process_batch(jobs, workers, event_tx, cancel_rx)
        .await;
    interrupt.abort();
    let _ = progress_handle.await;

    let outcomes = in_input_order(slots, summary.outcomes);
    write_outcomes(&mut writer, &outcomes, args.pretty)?;

    let rejected = outcomes
        .iter()
        .filter(|o| matches!(o, JobOutcome::Rejected { .. }))
        .count();
    eprintln!(
        "{} Extracted {} ({} pendente), {} rejected, {} cancelled",
        success(),
        summary.extracted,
        summary.pendente,
        rejected,
        summary.cancelled
    );
    if let Some(path) = &args.output {
        eprintln!("  {} Written to {}", style("→").dim(), path.display());
    }

    Ok(())
}

/// Fill the empty slots with batch outcomes, which arrive in job order.
fn in_input_order(slots: Vec<Option<JobOutcome>>, batch: Vec<JobOutcome>) -> Vec<JobOutcome> {
    let mut batch = batch.into_iter();
    slots
        .into_iter()
        .filter_map(|slot| slot.or_else(|| batch.next()))
        .collect()
}

fn open_output(path: Option<&PathBuf>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path).map_err(|e| {
            anyhow::anyhow!("Failed to create {}: {}", path.display(), e)
        })?)),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

/// JSON lines, or a single pretty array.
fn write_outcomes(
    writer: &mut dyn Write,
    outcomes: &[JobOutcome],
    pretty: bool,
) -> anyhow::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, outcomes)?;
        writeln!(writer)?;
    } else {
        for outcome in outcomes {
            serde_json::to_writer(&mut *writer, outcome)?;
            writeln!(writer)?;
        }
    }
    writer.flush()?;
    Ok(())
}
