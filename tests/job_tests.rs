use datalake_stats::job::{
    collect_all, collect_dataset, run_collection, Dataset, MISEQ_PREFIX, NEXTSEQ_PREFIX,
    NGS_SAMPLES_JOB, PROTEOMICS_JOB,
};
use datalake_stats::storage::{MemoryStore, ObjectStore};
use datalake_stats::warehouse::{MemorySink, SinkCall};
use datalake_stats::{
    AggregationResult, AppConfig, Error, LogId, Result, RunStats, RunStatus, SampleStats,
};
use std::cell::RefCell;

fn test_config() -> AppConfig {
    AppConfig {
        proteomics_account: "proteomicsacct".to_string(),
        proteomics_container: "requests".to_string(),
        ngs_account: "ngsacct".to_string(),
        ngs_samples_container: "samples".to_string(),
        ngs_nextseq_container: "nextseq".to_string(),
        ngs_miseq_container: "miseq".to_string(),
        ..Default::default()
    }
}

/// Builds a fresh store for each (account, container) and records the order
/// in which handles were opened.
struct FakeProvider {
    opened: RefCell<Vec<(String, String)>>,
    failing_container: Option<&'static str>,
}

impl FakeProvider {
    fn new() -> Self {
        Self {
            opened: RefCell::new(Vec::new()),
            failing_container: None,
        }
    }

    fn failing_on(container: &'static str) -> Self {
        Self {
            failing_container: Some(container),
            ..Self::new()
        }
    }

    fn store_for(&self, container: &str) -> MemoryStore {
        let store = match container {
            "requests" => MemoryStore::new()
                .with_blob("REQ-1/data.raw", 10)
                .with_blob("REQ-2/data.raw", 20),
            "samples" => MemoryStore::new()
                .with_blob("S1/r1.fastq.gz", 100)
                .with_blob("S2/r1.fastq.gz", 200)
                .with_blob("S3/r1.fastq.gz", 300),
            "nextseq" => MemoryStore::new()
                .with_blob("NextSeqOutput/run1/RunInfo.xml", 5)
                .with_blob("NextSeqOutput/run2/RunInfo.xml", 5),
            "miseq" => MemoryStore::new().with_blob("MiSeqOutput/run1/RunInfo.xml", 7),
            _ => MemoryStore::new(),
        };
        if self.failing_container == Some(container) {
            store.fail_on_call(1)
        } else {
            store
        }
    }
}

impl datalake_stats::StoreProvider for FakeProvider {
    fn open(&self, account: &str, container: &str) -> Result<Box<dyn ObjectStore>> {
        self.opened
            .borrow_mut()
            .push((account.to_string(), container.to_string()));
        Ok(Box::new(self.store_for(container)))
    }
}

#[test]
fn test_successful_collection_writes_then_finishes() {
    let mut sink = MemorySink::new();
    let expected = AggregationResult::NgsSamples(SampleStats {
        folder_count: 1,
        total_bytes: 9,
        folder_names: vec!["S1".to_string()],
    });

    let result = run_collection(&mut sink, NGS_SAMPLES_JOB, || Ok(expected.clone())).unwrap();

    assert_eq!(result, expected);
    assert_eq!(
        sink.calls(),
        &[
            SinkCall::LogStart {
                job_name: NGS_SAMPLES_JOB.to_string(),
                log_id: LogId(1)
            },
            SinkCall::Write {
                log_id: LogId(1),
                result: expected
            },
            SinkCall::LogFinish {
                log_id: LogId(1),
                status: RunStatus::Finished
            },
        ]
    );
}

#[test]
fn test_failed_collection_is_marked_failed_and_writes_nothing() {
    let mut sink = MemorySink::new();

    let err = run_collection(&mut sink, PROTEOMICS_JOB, || {
        Err(Error::Network("connection reset".to_string()))
    })
    .unwrap_err();

    assert!(matches!(err, Error::Network(_)));
    assert!(sink.results().is_empty());
    assert_eq!(sink.finished(), vec![(LogId(1), RunStatus::Failed)]);
}

#[test]
fn test_rejected_write_is_marked_failed() {
    let mut sink = MemorySink::new().reject_writes();

    let err = run_collection(&mut sink, PROTEOMICS_JOB, || {
        Ok(AggregationResult::NgsRuns {
            seq_machine: "miseq".to_string(),
            stats: RunStats::default(),
        })
    })
    .unwrap_err();

    assert!(matches!(err, Error::Other(_)));
    assert_eq!(sink.finished(), vec![(LogId(1), RunStatus::Failed)]);
}

#[test]
fn test_rejected_log_start_skips_collection() {
    let mut sink = MemorySink::new().reject_log_start();
    let mut collected = false;

    let result = run_collection(&mut sink, PROTEOMICS_JOB, || {
        collected = true;
        Ok(AggregationResult::NgsSamples(SampleStats::default()))
    });

    assert!(result.is_err());
    assert!(!collected);
    assert!(sink.calls().is_empty());
}

#[test]
fn test_collect_all_runs_every_flow_in_order() {
    let config = test_config();
    let provider = FakeProvider::new();
    let mut sink = MemorySink::new();

    let results = collect_all(&Dataset::all(&config), &config, &provider, &mut sink).unwrap();

    assert_eq!(results.len(), 4);
    let job_names: Vec<String> = sink
        .calls()
        .iter()
        .filter_map(|call| match call {
            SinkCall::LogStart { job_name, .. } => Some(job_name.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        job_names,
        vec![
            "PROTEOMICS_RUNS",
            "NGS_SAMPLES",
            "NGS_RUNS_NEXTSEQ",
            "NGS_RUNS_MISEQ"
        ]
    );

    assert_eq!(
        *provider.opened.borrow(),
        vec![
            ("proteomicsacct".to_string(), "requests".to_string()),
            ("ngsacct".to_string(), "samples".to_string()),
            ("ngsacct".to_string(), "nextseq".to_string()),
            ("ngsacct".to_string(), "miseq".to_string()),
        ]
    );

    assert_eq!(results[0].folder_count(), 2);
    assert_eq!(results[1].total_bytes(), 600);
    assert_eq!(
        results[2],
        AggregationResult::NgsRuns {
            seq_machine: "nextseq".to_string(),
            stats: RunStats {
                folder_count: 2,
                total_bytes: 10
            },
        }
    );
    assert_eq!(
        results[3],
        AggregationResult::NgsRuns {
            seq_machine: "miseq".to_string(),
            stats: RunStats {
                folder_count: 1,
                total_bytes: 7
            },
        }
    );
    assert!(sink
        .finished()
        .iter()
        .all(|(_, status)| *status == RunStatus::Finished));
}

#[test]
fn test_collect_all_stops_at_first_failure() {
    let config = test_config();
    let provider = FakeProvider::failing_on("samples");
    let mut sink = MemorySink::new();

    let err = collect_all(&Dataset::all(&config), &config, &provider, &mut sink).unwrap_err();

    assert!(matches!(err, Error::Network(_)));
    assert_eq!(sink.results().len(), 1);
    assert_eq!(
        sink.finished(),
        vec![
            (LogId(1), RunStatus::Finished),
            (LogId(2), RunStatus::Failed)
        ]
    );
    assert_eq!(provider.opened.borrow().len(), 2);
}

#[test]
fn test_missing_account_fails_inside_logged_run() {
    let config = AppConfig {
        proteomics_account: String::new(),
        ..test_config()
    };
    let provider = FakeProvider::new();
    let mut sink = MemorySink::new();

    let err = collect_dataset(&Dataset::Proteomics, &config, &provider, &mut sink).unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert_eq!(sink.finished(), vec![(LogId(1), RunStatus::Failed)]);
    assert!(provider.opened.borrow().is_empty());
}

#[test]
fn test_blank_run_container_opens_no_log_entry() {
    let config = test_config();
    let provider = FakeProvider::new();
    let mut sink = MemorySink::new();

    let dataset = Dataset::NgsRuns {
        container: String::new(),
        prefix: MISEQ_PREFIX.to_string(),
    };
    let err = collect_dataset(&dataset, &config, &provider, &mut sink).unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert!(sink.calls().is_empty());
    assert!(provider.opened.borrow().is_empty());
}

#[test]
fn test_closure_provider() {
    let config = test_config();
    let provider = |_account: &str, _container: &str| -> Result<Box<dyn ObjectStore>> {
        Ok(Box::new(
            MemoryStore::new().with_blob("MiSeqOutput/run1/SampleSheet.csv", 3),
        ))
    };
    let mut sink = MemorySink::new();

    let dataset = Dataset::NgsRuns {
        container: "miseq".to_string(),
        prefix: MISEQ_PREFIX.to_string(),
    };
    let result = collect_dataset(&dataset, &config, &provider, &mut sink).unwrap();

    assert_eq!(result.folder_count(), 1);
    assert_eq!(result.total_bytes(), 3);

    let other = Dataset::NgsRuns {
        container: "nextseq".to_string(),
        prefix: NEXTSEQ_PREFIX.to_string(),
    };
    let empty = collect_dataset(&other, &config, &provider, &mut sink).unwrap();
    assert_eq!(empty.folder_count(), 0);
}
