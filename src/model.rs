use serde::Serialize;

/// Folder count and data volume under one prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub folder_count: usize,
    pub total_bytes: i64,
}

/// Top-level folders with their names and the sample records found in each
/// folder's metadata workbook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunAndSampleStats {
    pub folder_count: usize,
    pub sample_record_count: usize,
    pub total_bytes: i64,
    pub folder_names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SampleStats {
    pub folder_count: usize,
    pub total_bytes: i64,
    pub folder_names: Vec<String>,
}

/// One completed aggregation, tagged with the dataset it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "dataset", rename_all = "snake_case")]
pub enum AggregationResult {
    Proteomics(RunAndSampleStats),
    NgsSamples(SampleStats),
    NgsRuns {
        seq_machine: String,
        #[serde(flatten)]
        stats: RunStats,
    },
}

impl AggregationResult {
    pub fn folder_count(&self) -> usize {
        match self {
            AggregationResult::Proteomics(stats) => stats.folder_count,
            AggregationResult::NgsSamples(stats) => stats.folder_count,
            AggregationResult::NgsRuns { stats, .. } => stats.folder_count,
        }
    }

    pub fn total_bytes(&self) -> i64 {
        match self {
            AggregationResult::Proteomics(stats) => stats.total_bytes,
            AggregationResult::NgsSamples(stats) => stats.total_bytes,
            AggregationResult::NgsRuns { stats, .. } => stats.total_bytes,
        }
    }
}
