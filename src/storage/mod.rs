//! Object store access.
//!
//! The aggregator only needs three calls from a store:
//! - one page of a delimiter-based (hierarchical) listing
//! - one page of a flat listing of everything under a prefix
//! - a full download of one blob

mod memory;
mod s3;

pub use memory::MemoryStore;
pub use s3::{S3Provider, S3Store, StoreSettings};

use crate::error::Result;

/// Delimiter separating virtual folders in blob paths.
pub const DELIMITER: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingEntry {
    /// Virtual folder, including the trailing delimiter.
    Prefix(String),
    Blob { path: String, content_length: i64 },
}

/// One page of a listing. `continuation` is `None` on the last page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub entries: Vec<ListingEntry>,
    pub continuation: Option<String>,
}

impl ListingPage {
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| match entry {
            ListingEntry::Prefix(prefix) => Some(prefix.as_str()),
            ListingEntry::Blob { .. } => None,
        })
    }

    pub fn blobs(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().filter_map(|entry| match entry {
            ListingEntry::Blob {
                path,
                content_length,
            } => Some((path.as_str(), *content_length)),
            ListingEntry::Prefix(_) => None,
        })
    }
}

/// A single container (bucket) in an object store.
///
/// All calls block until the remote round-trip completes.
pub trait ObjectStore {
    fn list_hierarchy(
        &self,
        prefix: &str,
        delimiter: &str,
        continuation: Option<&str>,
    ) -> Result<ListingPage>;

    fn list_flat(&self, prefix: &str, continuation: Option<&str>) -> Result<ListingPage>;

    fn download(&self, path: &str) -> Result<Vec<u8>>;
}

/// Opens a store handle for one container of one storage account.
pub trait StoreProvider {
    fn open(&self, account: &str, container: &str) -> Result<Box<dyn ObjectStore>>;
}

impl<F> StoreProvider for F
where
    F: Fn(&str, &str) -> Result<Box<dyn ObjectStore>>,
{
    fn open(&self, account: &str, container: &str) -> Result<Box<dyn ObjectStore>> {
        self(account, container)
    }
}
