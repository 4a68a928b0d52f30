use delta_config::shared::{MAX_BLOB_PAGE_SIZE, SourceConfig};
use metrics::counter;

use crate::blob::client::BlobContainerClient;
use crate::blob::types::{BlobItem, ListBlobsRequest, ListingEntry};
use crate::bail;
use crate::error::{DeltaResult, ErrorKind};
use crate::metrics::{BACKEND_LABEL, BLOB_BACKEND, DELTA_BACKEND_REQUESTS_TOTAL};
use crate::source::{
    ContinuationToken, KeyRange, OrderedSource, Segment, SegmentPager, SegmentedCursor,
    validate_page_size,
};

/// Options for listing a container as an ordered source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobSourceOptions {
    /// Only names starting with this prefix are listed.
    pub prefix: String,
    /// Inclusive lower bound on names.
    pub min_name: Option<String>,
    /// Exclusive upper bound on names.
    pub max_name: Option<String>,
    pub page_size: usize,
    pub initial_continuation: Option<ContinuationToken>,
}

impl BlobSourceOptions {
    pub fn from_config(config: &SourceConfig) -> Self {
        Self {
            page_size: config.blob_page_size,
            ..Self::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

impl Default for BlobSourceOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            min_name: None,
            max_name: None,
            page_size: MAX_BLOB_PAGE_SIZE,
            initial_continuation: None,
        }
    }
}

/// Flat listing of one container, ordered by name.
#[derive(Debug, Clone)]
pub struct BlobSource<C> {
    client: C,
    options: BlobSourceOptions,
}

impl<C> BlobSource<C>
where
    C: BlobContainerClient + Clone,
{
    pub fn new(client: C, options: BlobSourceOptions) -> DeltaResult<Self> {
        validate_page_size("page_size", options.page_size, MAX_BLOB_PAGE_SIZE)?;

        Ok(Self { client, options })
    }

    pub fn options(&self) -> &BlobSourceOptions {
        &self.options
    }
}

impl<C> OrderedSource for BlobSource<C>
where
    C: BlobContainerClient + Clone,
{
    type Cursor = BlobCursor<C>;

    fn open(&self) -> Self::Cursor {
        let pager = BlobPager {
            client: self.client.clone(),
            prefix: self.options.prefix.clone(),
            page_size: self.options.page_size,
        };
        let range = KeyRange::new(self.options.min_name.clone(), self.options.max_name.clone());

        SegmentedCursor::new(pager, range, self.options.initial_continuation.clone())
    }
}

pub type BlobCursor<C> = SegmentedCursor<BlobPager<C>>;

/// Fetches flat listing segments.
#[derive(Debug)]
pub struct BlobPager<C> {
    client: C,
    prefix: String,
    page_size: usize,
}

impl<C> SegmentPager for BlobPager<C>
where
    C: BlobContainerClient,
{
    type Item = BlobItem;

    async fn fetch_segment(
        &self,
        continuation: Option<ContinuationToken>,
    ) -> DeltaResult<Segment<BlobItem>> {
        let request = ListBlobsRequest::flat(self.prefix.clone(), self.page_size)
            .with_continuation(continuation);
        counter!(DELTA_BACKEND_REQUESTS_TOTAL, BACKEND_LABEL => BLOB_BACKEND).increment(1);
        let segment = self.client.list_blobs_segmented(request).await?;

        let mut blobs = Vec::with_capacity(segment.items.len());
        for entry in segment.items {
            match entry {
                ListingEntry::Blob(blob) => blobs.push(blob),
                ListingEntry::Directory { prefix } => bail!(
                    ErrorKind::InvalidData,
                    "Flat listing returned a directory entry",
                    format!("directory `{prefix}`")
                ),
            }
        }

        Ok(Segment::new(blobs, segment.continuation))
    }
}
