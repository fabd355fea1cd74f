//! Collection flows: open a run log entry, aggregate one dataset, store the
//! result, close the log entry.

use crate::aggregate;
use crate::config::{require, AppConfig};
use crate::error::Result;
use crate::model::AggregationResult;
use crate::storage::StoreProvider;
use crate::timer::StageTimer;
use crate::warehouse::{RunStatus, StatsSink};
use colored::*;
use indicatif::HumanBytes;
use tracing::{info, warn};

pub const PROTEOMICS_JOB: &str = "PROTEOMICS_RUNS";
pub const NGS_SAMPLES_JOB: &str = "NGS_SAMPLES";
pub const NEXTSEQ_PREFIX: &str = "NextSeqOutput/";
pub const MISEQ_PREFIX: &str = "MiSeqOutput/";

pub fn ngs_runs_job_name(container: &str) -> String {
    format!("NGS_RUNS_{}", container.to_uppercase())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dataset {
    Proteomics,
    NgsSamples,
    NgsRuns { container: String, prefix: String },
}

impl Dataset {
    /// The four flows of a scheduled run, in execution order.
    pub fn all(config: &AppConfig) -> Vec<Dataset> {
        vec![
            Dataset::Proteomics,
            Dataset::NgsSamples,
            Dataset::NgsRuns {
                container: config.ngs_nextseq_container.clone(),
                prefix: NEXTSEQ_PREFIX.to_string(),
            },
            Dataset::NgsRuns {
                container: config.ngs_miseq_container.clone(),
                prefix: MISEQ_PREFIX.to_string(),
            },
        ]
    }

    pub fn description(&self) -> String {
        match self {
            Dataset::Proteomics => "proteomics stats".to_string(),
            Dataset::NgsSamples => "NGS samples stats".to_string(),
            Dataset::NgsRuns { prefix, .. } => {
                format!("NGS run stats from {}", prefix.trim_end_matches('/'))
            }
        }
    }
}

/// Bracket one aggregation with run log markers.
///
/// The result is written and the entry closed as finished only if `collect`
/// succeeds. Any failure after the entry was opened closes it as failed and
/// returns the original error.
pub fn run_collection<F>(
    sink: &mut dyn StatsSink,
    job_name: &str,
    collect: F,
) -> Result<AggregationResult>
where
    F: FnOnce() -> Result<AggregationResult>,
{
    let log_id = sink.log_start(job_name)?;

    let outcome = collect().and_then(|result| {
        sink.write_stats(&result, log_id)?;
        sink.log_finish(log_id, RunStatus::Finished)?;
        Ok(result)
    });

    if let Err(err) = &outcome {
        warn!("{} (log entry {}) failed: {}", job_name, log_id, err);
        if let Err(finish_err) = sink.log_finish(log_id, RunStatus::Failed) {
            warn!("Could not mark log entry {} as failed: {}", log_id, finish_err);
        }
    }

    outcome
}

pub fn collect_dataset(
    dataset: &Dataset,
    config: &AppConfig,
    provider: &dyn StoreProvider,
    sink: &mut dyn StatsSink,
) -> Result<AggregationResult> {
    match dataset {
        Dataset::Proteomics => run_collection(sink, PROTEOMICS_JOB, || {
            let account = require("proteomics_account", &config.proteomics_account)?;
            let container = require("proteomics_container", &config.proteomics_container)?;
            let store = provider.open(account, container)?;
            let stats = aggregate::collect_proteomics_stats(store.as_ref())?;
            Ok(AggregationResult::Proteomics(stats))
        }),
        Dataset::NgsSamples => run_collection(sink, NGS_SAMPLES_JOB, || {
            let account = require("ngs_account", &config.ngs_account)?;
            let container = require("ngs_samples_container", &config.ngs_samples_container)?;
            let store = provider.open(account, container)?;
            let stats = aggregate::collect_ngs_sample_stats(store.as_ref())?;
            Ok(AggregationResult::NgsSamples(stats))
        }),
        Dataset::NgsRuns { container, prefix } => {
            let container = require("ngs_run_container", container)?;
            run_collection(sink, &ngs_runs_job_name(container), || {
                let account = require("ngs_account", &config.ngs_account)?;
                let store = provider.open(account, container)?;
                let stats = aggregate::collect_ngs_run_stats(store.as_ref(), prefix)?;
                Ok(AggregationResult::NgsRuns {
                    seq_machine: container.to_string(),
                    stats,
                })
            })
        }
    }
}

/// Run `datasets` one after another. The first failure aborts the rest.
pub fn collect_all(
    datasets: &[Dataset],
    config: &AppConfig,
    provider: &dyn StoreProvider,
    sink: &mut dyn StatsSink,
) -> Result<Vec<AggregationResult>> {
    info!("Start collecting stats...");
    let mut results = Vec::with_capacity(datasets.len());

    for dataset in datasets {
        let description = dataset.description();
        info!("Collecting {}...", description);

        let mut timer = StageTimer::start();
        let result = collect_dataset(dataset, config, provider, sink)?;
        timer.finish();

        info!(
            "Finished collecting {}: {} folders, {} in {}",
            description,
            format!("{}", result.folder_count()).green(),
            format!("{}", HumanBytes(result.total_bytes().max(0) as u64)).green(),
            timer.get_duration_human(),
        );
        results.push(result);
    }

    info!("Finished collecting stats");
    Ok(results)
}
