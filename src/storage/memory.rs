use super::{ListingEntry, ListingPage, ObjectStore};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::trace;

const DEFAULT_PAGE_SIZE: usize = 1000;

/// In-process object store with the listing semantics of a cloud container.
///
/// Keys are kept in lexicographic order, listings are cut into pages of
/// `page_size` entries, and a failure can be injected on the n-th listing
/// call (1-based, counting hierarchical and flat listings together).
pub struct MemoryStore {
    blobs: BTreeMap<String, Vec<u8>>,
    page_size: usize,
    fail_on_call: Option<usize>,
    list_calls: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            blobs: BTreeMap::new(),
            page_size: DEFAULT_PAGE_SIZE,
            fail_on_call: None,
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Add a blob of `size` zero bytes.
    pub fn with_blob(self, path: &str, size: usize) -> Self {
        self.with_blob_data(path, vec![0u8; size])
    }

    pub fn with_blob_data(mut self, path: &str, data: Vec<u8>) -> Self {
        self.blobs.insert(path.to_string(), data);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn fail_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    /// Number of listing calls served (or failed) so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) -> Result<()> {
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call) {
            return Err(Error::Network(format!(
                "injected failure on listing call {call}"
            )));
        }
        Ok(())
    }

    fn under_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a String, &'a Vec<u8>)> {
        self.blobs.iter().filter(move |(path, _)| path.starts_with(prefix))
    }

    fn hierarchy_entries(&self, prefix: &str, delimiter: &str) -> Vec<ListingEntry> {
        let mut entries = Vec::new();
        let mut last_folder: Option<String> = None;

        for (path, data) in self.under_prefix(prefix) {
            let rest = &path[prefix.len()..];
            match rest.find(delimiter) {
                Some(idx) if !delimiter.is_empty() => {
                    let folder = format!("{}{}", prefix, &rest[..idx + delimiter.len()]);
                    // keys sharing a folder are contiguous in sorted order
                    if last_folder.as_deref() != Some(folder.as_str()) {
                        entries.push(ListingEntry::Prefix(folder.clone()));
                        last_folder = Some(folder);
                    }
                }
                _ => entries.push(blob_entry(path, data)),
            }
        }

        entries
    }

    fn flat_entries(&self, prefix: &str) -> Vec<ListingEntry> {
        self.under_prefix(prefix)
            .map(|(path, data)| blob_entry(path, data))
            .collect()
    }

    fn page(&self, entries: Vec<ListingEntry>, continuation: Option<&str>) -> Result<ListingPage> {
        let start = match continuation {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| Error::Network(format!("invalid continuation token: {token:?}")))?,
            None => 0,
        };
        let end = start.saturating_add(self.page_size).min(entries.len());
        let next = (end < entries.len()).then(|| end.to_string());

        trace!("Serving entries {}..{} of {}", start, end, entries.len());

        Ok(ListingPage {
            entries: entries.into_iter().skip(start).take(end.saturating_sub(start)).collect(),
            continuation: next,
        })
    }
}

fn blob_entry(path: &str, data: &[u8]) -> ListingEntry {
    ListingEntry::Blob {
        path: path.to_string(),
        content_length: data.len() as i64,
    }
}

impl ObjectStore for MemoryStore {
    fn list_hierarchy(
        &self,
        prefix: &str,
        delimiter: &str,
        continuation: Option<&str>,
    ) -> Result<ListingPage> {
        self.record_call()?;
        self.page(self.hierarchy_entries(prefix, delimiter), continuation)
    }

    fn list_flat(&self, prefix: &str, continuation: Option<&str>) -> Result<ListingPage> {
        self.record_call()?;
        self.page(self.flat_entries(prefix), continuation)
    }

    fn download(&self, path: &str) -> Result<Vec<u8>> {
        self.blobs
            .get(path)
            .cloned()
            .ok_or_else(|| Error::Network(format!("blob not found: {path}")))
    }
}
