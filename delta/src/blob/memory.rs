use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use delta_config::shared::MAX_BLOB_PAGE_SIZE;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::debug;

use crate::blob::client::BlobContainerClient;
use crate::blob::types::{BlobItem, BlobKind, BlobSegment, ListBlobsRequest, ListingEntry};
use crate::delta_error;
use crate::error::{DeltaResult, ErrorKind};
use crate::source::{ContinuationToken, Segment, validate_page_size};

#[derive(Debug, Clone)]
struct StoredBlob {
    kind: BlobKind,
    content: Vec<u8>,
    content_digest: Option<String>,
}

impl StoredBlob {
    fn to_item(&self, name: &str) -> BlobItem {
        BlobItem {
            name: name.to_string(),
            kind: self.kind,
            length: self.content.len() as u64,
            content_digest: self.content_digest.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    blobs: BTreeMap<String, StoredBlob>,
    list_requests: usize,
}

/// In-memory blob container with server-like listing semantics.
///
/// Listings are ordered by name. Delimited listings fold every name that contains the
/// delimiter after the prefix into a directory entry ending at the first delimiter occurrence.
/// Continuation tokens encode the name the next page starts at.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobContainer {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryBlobContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a block blob with a SHA-256 content digest.
    pub async fn put_block_blob(
        &self,
        name: impl Into<String>,
        content: impl AsRef<[u8]>,
    ) -> BlobItem {
        let content = content.as_ref().to_vec();
        let digest = BASE64.encode(Sha256::digest(&content));

        self.put_blob(name, BlobKind::Block, content, Some(digest)).await
    }

    /// Stores a blob of any kind with an explicit digest.
    pub async fn put_blob(
        &self,
        name: impl Into<String>,
        kind: BlobKind,
        content: impl Into<Vec<u8>>,
        content_digest: Option<String>,
    ) -> BlobItem {
        let name = name.into();
        let blob = StoredBlob {
            kind,
            content: content.into(),
            content_digest,
        };
        let item = blob.to_item(&name);

        self.inner.lock().await.blobs.insert(name, blob);

        item
    }

    pub async fn delete_blob(&self, name: &str) -> bool {
        self.inner.lock().await.blobs.remove(name).is_some()
    }

    pub async fn blob_names(&self) -> Vec<String> {
        self.inner.lock().await.blobs.keys().cloned().collect()
    }

    /// Number of listing calls served so far.
    pub async fn list_request_count(&self) -> usize {
        self.inner.lock().await.list_requests
    }

    fn encode_marker(name: &str) -> ContinuationToken {
        ContinuationToken::new(BASE64.encode(name))
    }

    fn decode_marker(token: &ContinuationToken) -> DeltaResult<String> {
        let bytes = BASE64.decode(token.as_str()).map_err(|err| {
            delta_error!(
                ErrorKind::InvalidContinuationToken,
                "Continuation token is not valid base64",
                err
            )
        })?;

        String::from_utf8(bytes).map_err(|err| {
            delta_error!(
                ErrorKind::InvalidContinuationToken,
                "Continuation token is not a valid marker",
                err
            )
        })
    }
}

/// Directory entry `name` falls into, if the delimiter occurs after the prefix.
fn directory_of<'a>(name: &'a str, prefix: &str, delimiter: Option<&str>) -> Option<&'a str> {
    let delimiter = delimiter.filter(|delimiter| !delimiter.is_empty())?;
    let rest = &name[prefix.len()..];
    let position = rest.find(delimiter)?;

    Some(&name[..prefix.len() + position + delimiter.len()])
}

impl BlobContainerClient for MemoryBlobContainer {
    async fn list_blobs_segmented(&self, request: ListBlobsRequest) -> DeltaResult<BlobSegment> {
        validate_page_size("max_results", request.max_results, MAX_BLOB_PAGE_SIZE)?;

        let start = match &request.continuation {
            Some(token) => Self::decode_marker(token)?,
            None => String::new(),
        };
        let start = start.max(request.prefix.clone());

        let mut inner = self.inner.lock().await;
        inner.list_requests += 1;

        let mut entries: Vec<ListingEntry> = Vec::new();
        let mut continuation = None;
        let range = inner
            .blobs
            .range::<str, _>((Bound::Included(start.as_str()), Bound::Unbounded));
        for (name, blob) in range {
            if !name.starts_with(&request.prefix) {
                break;
            }

            let directory = directory_of(name, &request.prefix, request.delimiter.as_deref());
            if let Some(directory) = directory
                && entries.last().is_some_and(|last| last.name() == directory)
            {
                continue;
            }

            if entries.len() == request.max_results {
                continuation = Some(Self::encode_marker(name));
                break;
            }

            entries.push(match directory {
                Some(directory) => ListingEntry::Directory {
                    prefix: directory.to_string(),
                },
                None => ListingEntry::Blob(blob.to_item(name)),
            });
        }

        debug!(
            prefix = %request.prefix,
            delimiter = ?request.delimiter,
            entries = entries.len(),
            has_continuation = continuation.is_some(),
            "listed memory container"
        );

        Ok(Segment::new(entries, continuation))
    }
}
