//! Folder and size aggregation over a delimiter-based object listing.
//!
//! Every function here owns its traversal state (continuation token and
//! running counters) for the duration of one call. Errors from the store or
//! the spreadsheet reader are returned as-is; nothing partial is kept.

use crate::error::Result;
use crate::model::{RunAndSampleStats, RunStats, SampleStats};
use crate::spreadsheet;
use crate::storage::{ObjectStore, DELIMITER};
use tracing::debug;

/// Workbook looked up inside each top-level folder.
pub const METADATA_WORKBOOK: &str = "metadata.xlsx";

/// Sheet whose data rows are counted as sample records.
pub const SAMPLES_SHEET: &str = "Samples";

/// Virtual folders found directly below one prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderListing {
    /// Full folder prefixes, trailing delimiter included, in listing order.
    pub prefixes: Vec<String>,
}

impl FolderListing {
    pub fn count(&self) -> usize {
        self.prefixes.len()
    }

    /// Folder names relative to `parent`, without the trailing delimiter.
    pub fn names(&self, parent: &str) -> Vec<String> {
        self.prefixes
            .iter()
            .map(|prefix| folder_name(prefix, parent))
            .collect()
    }
}

fn folder_name(prefix: &str, parent: &str) -> String {
    let relative = prefix.strip_prefix(parent).unwrap_or(prefix);
    relative
        .strip_suffix(DELIMITER)
        .unwrap_or(relative)
        .to_string()
}

/// List the virtual folders one level below `prefix`, across all pages.
pub fn count_top_level_folders(store: &dyn ObjectStore, prefix: &str) -> Result<FolderListing> {
    let mut prefixes = Vec::new();
    let mut continuation: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = store.list_hierarchy(prefix, DELIMITER, continuation.as_deref())?;
        pages += 1;
        prefixes.extend(page.prefixes().map(str::to_string));

        match page.continuation {
            Some(token) => continuation = Some(token),
            None => break,
        }
    }

    debug!(
        "Found {} folders below {:?} in {} pages",
        prefixes.len(),
        prefix,
        pages
    );

    Ok(FolderListing { prefixes })
}

/// Sum the `Samples` data rows of the metadata workbook in each folder.
///
/// Folders without a workbook contribute zero.
pub fn count_nested_sample_records(store: &dyn ObjectStore, folders: &[String]) -> Result<usize> {
    let mut total = 0usize;

    for folder in folders {
        let workbook_path = format!("{folder}{METADATA_WORKBOOK}");

        if contains_blob(store, folder, &workbook_path)? {
            let bytes = store.download(&workbook_path)?;
            let rows = spreadsheet::count_data_rows(&bytes, SAMPLES_SHEET)?;
            debug!("{} lists {} samples", workbook_path, rows);
            total += rows;
        } else {
            debug!("No {} in {}", METADATA_WORKBOOK, folder);
        }
    }

    Ok(total)
}

fn contains_blob(store: &dyn ObjectStore, folder: &str, path: &str) -> Result<bool> {
    let mut continuation: Option<String> = None;

    loop {
        let page = store.list_hierarchy(folder, DELIMITER, continuation.as_deref())?;
        if page.blobs().any(|(blob_path, _)| blob_path == path) {
            return Ok(true);
        }

        match page.continuation {
            Some(token) => continuation = Some(token),
            None => return Ok(false),
        }
    }
}

/// Total content length of every blob under `prefix`, at any depth.
pub fn sum_bytes_under_prefix(store: &dyn ObjectStore, prefix: &str) -> Result<i64> {
    let mut total: i64 = 0;
    let mut blobs = 0usize;
    let mut continuation: Option<String> = None;

    loop {
        let page = store.list_flat(prefix, continuation.as_deref())?;
        for (_, content_length) in page.blobs() {
            total += content_length;
            blobs += 1;
        }

        match page.continuation {
            Some(token) => continuation = Some(token),
            None => break,
        }
    }

    debug!("{} blobs, {} bytes below {:?}", blobs, total, prefix);
    Ok(total)
}

/// Top-level request folders, their names, the samples listed in their
/// metadata workbooks, and the container's total size.
pub fn collect_proteomics_stats(store: &dyn ObjectStore) -> Result<RunAndSampleStats> {
    let folders = count_top_level_folders(store, "")?;
    let sample_record_count = count_nested_sample_records(store, &folders.prefixes)?;
    let total_bytes = sum_bytes_under_prefix(store, "")?;

    Ok(RunAndSampleStats {
        folder_count: folders.count(),
        sample_record_count,
        total_bytes,
        folder_names: folders.names(""),
    })
}

/// One folder per sample at the top of the container.
pub fn collect_ngs_sample_stats(store: &dyn ObjectStore) -> Result<SampleStats> {
    let folders = count_top_level_folders(store, "")?;
    let total_bytes = sum_bytes_under_prefix(store, "")?;

    Ok(SampleStats {
        folder_count: folders.count(),
        total_bytes,
        folder_names: folders.names(""),
    })
}

/// Run folders directly below `prefix` and the data volume under it.
pub fn collect_ngs_run_stats(store: &dyn ObjectStore, prefix: &str) -> Result<RunStats> {
    let folders = count_top_level_folders(store, prefix)?;
    let total_bytes = sum_bytes_under_prefix(store, prefix)?;

    Ok(RunStats {
        folder_count: folders.count(),
        total_bytes,
    })
}
