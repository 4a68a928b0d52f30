use serde::{Deserialize, Serialize};

use crate::source::{ContinuationToken, Keyed, Positioned, Segment};

/// Storage flavor of a blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobKind {
    Block,
    Append,
    Page,
}

/// Listing properties of a single blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobItem {
    pub name: String,
    pub kind: BlobKind,
    pub length: u64,
    /// Base64 content hash as reported by the service, when one was stored.
    pub content_digest: Option<String>,
}

impl Keyed for BlobItem {
    type Key = String;

    fn key(&self) -> &String {
        &self.name
    }
}

/// Entry of a listing segment.
///
/// Delimited listings collapse every name sharing `prefix + ... + delimiter` into one
/// [`ListingEntry::Directory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingEntry {
    Blob(BlobItem),
    Directory { prefix: String },
}

impl ListingEntry {
    /// Blob name or directory prefix.
    pub fn name(&self) -> &str {
        match self {
            ListingEntry::Blob(blob) => &blob.name,
            ListingEntry::Directory { prefix } => prefix,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, ListingEntry::Directory { .. })
    }
}

/// Parameters of one segmented listing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListBlobsRequest {
    pub prefix: String,
    /// `None` requests a flat listing.
    pub delimiter: Option<String>,
    pub max_results: usize,
    pub continuation: Option<ContinuationToken>,
}

impl ListBlobsRequest {
    pub fn flat(prefix: impl Into<String>, max_results: usize) -> Self {
        Self {
            prefix: prefix.into(),
            delimiter: None,
            max_results,
            continuation: None,
        }
    }

    pub fn delimited(
        prefix: impl Into<String>,
        delimiter: impl Into<String>,
        max_results: usize,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            delimiter: Some(delimiter.into()),
            max_results,
            continuation: None,
        }
    }

    pub fn with_continuation(mut self, continuation: Option<ContinuationToken>) -> Self {
        self.continuation = continuation;
        self
    }
}

pub type BlobSegment = Segment<ListingEntry>;

/// A listed blob with its listing position.
pub type BlobContext = Positioned<BlobItem>;
