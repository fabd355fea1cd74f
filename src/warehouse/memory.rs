use super::{LogId, RunStatus, StatsSink};
use crate::error::{Error, Result};
use crate::model::AggregationResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    LogStart { job_name: String, log_id: LogId },
    Write { log_id: LogId, result: AggregationResult },
    LogFinish { log_id: LogId, status: RunStatus },
}

/// Sink that keeps every call in memory, in order.
///
/// Log ids are handed out sequentially from 1. `reject_log_start` and
/// `reject_writes` make the matching calls fail the way a refusing
/// warehouse would.
#[derive(Debug, Default)]
pub struct MemorySink {
    calls: Vec<SinkCall>,
    next_log_id: i32,
    reject_log_start: bool,
    reject_writes: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_log_start(mut self) -> Self {
        self.reject_log_start = true;
        self
    }

    pub fn reject_writes(mut self) -> Self {
        self.reject_writes = true;
        self
    }

    pub fn calls(&self) -> &[SinkCall] {
        &self.calls
    }

    /// Results written so far, in order.
    pub fn results(&self) -> Vec<&AggregationResult> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SinkCall::Write { result, .. } => Some(result),
                _ => None,
            })
            .collect()
    }

    pub fn finished(&self) -> Vec<(LogId, RunStatus)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SinkCall::LogFinish { log_id, status } => Some((*log_id, *status)),
                _ => None,
            })
            .collect()
    }
}

impl StatsSink for MemorySink {
    fn log_start(&mut self, job_name: &str) -> Result<LogId> {
        if self.reject_log_start {
            return Err(Error::Other(format!("log start rejected for {job_name}")));
        }
        self.next_log_id += 1;
        let log_id = LogId(self.next_log_id);
        self.calls.push(SinkCall::LogStart {
            job_name: job_name.to_string(),
            log_id,
        });
        Ok(log_id)
    }

    fn log_finish(&mut self, log_id: LogId, status: RunStatus) -> Result<()> {
        self.calls.push(SinkCall::LogFinish { log_id, status });
        Ok(())
    }

    fn write_stats(&mut self, result: &AggregationResult, log_id: LogId) -> Result<()> {
        if self.reject_writes {
            return Err(Error::Other(format!("write rejected for log entry {log_id}")));
        }
        self.calls.push(SinkCall::Write {
            log_id,
            result: result.clone(),
        });
        Ok(())
    }
}
