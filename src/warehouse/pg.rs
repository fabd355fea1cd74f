use super::{LogId, RunStatus, StatsSink};
use crate::error::{Error, Result};
use crate::model::AggregationResult;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Text};
use tracing::debug;

const LOG_START: &str = "SELECT log.log_data_lake_collect_stats_start($1) AS log_id";
const LOG_FINISH: &str = "CALL log.log_data_lake_collect_stats_finish($1, $2)";
const INSERT_PROTEOMICS: &str = "CALL data_lake.insert_proteomics_stats($1, $2, $3, $4, $5)";
const INSERT_NGS_SAMPLES: &str = "CALL data_lake.insert_ngs_sample_stats($1, $2, $3, $4)";
const INSERT_NGS_RUNS: &str = "CALL data_lake.insert_ngs_run_stats($1, $2, $3, $4)";

pub fn establish_connection(database_url: &str) -> Result<PgConnection> {
    Ok(PgConnection::establish(database_url)?)
}

#[derive(Debug, QueryableByName)]
struct LogIdRow {
    #[diesel(sql_type = Integer)]
    log_id: i32,
}

/// Warehouse writer that calls the stored procedures of the stats schema.
///
/// Every call opens its own connection and drops it when done.
pub struct PgWarehouse {
    database_url: String,
}

impl PgWarehouse {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    fn connect(&self) -> Result<PgConnection> {
        establish_connection(&self.database_url)
    }
}

fn sql_int(field: &str, value: usize) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::Other(format!("{field} out of range: {value}")))
}

fn json_names(names: &[String]) -> Result<String> {
    serde_json::to_string(names).map_err(|err| Error::Other(format!("cannot encode names: {err}")))
}

impl StatsSink for PgWarehouse {
    fn log_start(&mut self, job_name: &str) -> Result<LogId> {
        let mut connection = self.connect()?;

        let row = diesel::sql_query(LOG_START)
            .bind::<Text, _>(job_name)
            .get_result::<LogIdRow>(&mut connection)?;

        debug!("Opened log entry {} for {}", row.log_id, job_name);
        Ok(LogId(row.log_id))
    }

    fn log_finish(&mut self, log_id: LogId, status: RunStatus) -> Result<()> {
        let mut connection = self.connect()?;

        diesel::sql_query(LOG_FINISH)
            .bind::<Integer, _>(log_id.0)
            .bind::<Integer, _>(status.code())
            .execute(&mut connection)?;

        debug!("Closed log entry {} with status {:?}", log_id, status);
        Ok(())
    }

    fn write_stats(&mut self, result: &AggregationResult, log_id: LogId) -> Result<()> {
        let mut connection = self.connect()?;

        let rows = match result {
            AggregationResult::Proteomics(stats) => diesel::sql_query(INSERT_PROTEOMICS)
                .bind::<Integer, _>(sql_int("no_of_runs", stats.folder_count)?)
                .bind::<Integer, _>(sql_int("no_of_samples", stats.sample_record_count)?)
                .bind::<BigInt, _>(stats.total_bytes)
                .bind::<Text, _>(json_names(&stats.folder_names)?)
                .bind::<Integer, _>(log_id.0)
                .execute(&mut connection)?,
            AggregationResult::NgsSamples(stats) => diesel::sql_query(INSERT_NGS_SAMPLES)
                .bind::<Integer, _>(sql_int("no_of_samples", stats.folder_count)?)
                .bind::<BigInt, _>(stats.total_bytes)
                .bind::<Text, _>(json_names(&stats.folder_names)?)
                .bind::<Integer, _>(log_id.0)
                .execute(&mut connection)?,
            AggregationResult::NgsRuns { seq_machine, stats } => {
                diesel::sql_query(INSERT_NGS_RUNS)
                    .bind::<Integer, _>(sql_int("no_of_runs", stats.folder_count)?)
                    .bind::<BigInt, _>(stats.total_bytes)
                    .bind::<Text, _>(seq_machine)
                    .bind::<Integer, _>(log_id.0)
                    .execute(&mut connection)?
            }
        };

        debug!("Stored stats for log entry {} ({} rows)", log_id, rows);
        Ok(())
    }
}
