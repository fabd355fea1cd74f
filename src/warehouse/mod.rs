//! Persistence of aggregation results and run log markers.

mod memory;
mod pg;

pub use memory::{MemorySink, SinkCall};
pub use pg::{establish_connection, PgWarehouse};

use crate::error::Result;
use crate::model::AggregationResult;
use std::fmt;

/// Identifier of one run log entry, returned by [`StatsSink::log_start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogId(pub i32);

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Final state of a run log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Finished,
    Failed,
}

impl RunStatus {
    /// Status code stored in the run log table.
    pub fn code(self) -> i32 {
        match self {
            RunStatus::Finished => 2,
            RunStatus::Failed => 3,
        }
    }
}

pub trait StatsSink {
    /// Open a run log entry for `job_name`.
    fn log_start(&mut self, job_name: &str) -> Result<LogId>;

    fn log_finish(&mut self, log_id: LogId, status: RunStatus) -> Result<()>;

    fn write_stats(&mut self, result: &AggregationResult, log_id: LogId) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(RunStatus::Finished.code(), 2);
        assert_eq!(RunStatus::Failed.code(), 3);
    }
}
