pub mod aggregate;
pub mod config;
pub mod error;
pub mod job;
pub mod model;
pub mod spreadsheet;
pub mod storage;
pub mod timer;
pub mod warehouse;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use model::{AggregationResult, RunAndSampleStats, RunStats, SampleStats};
pub use storage::{ObjectStore, StoreProvider};
pub use warehouse::{LogId, RunStatus, StatsSink};
