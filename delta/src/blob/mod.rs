//! Blob containers as ordered sources.

mod client;
mod comparison;
pub mod memory;
mod source;
mod types;

pub use client::BlobContainerClient;
pub use comparison::{
    BlobComparison, BlobComparisonKind, BlobComparisonMerger, BlobComparisonPolicy, compare_blobs,
};
pub use source::{BlobCursor, BlobPager, BlobSource, BlobSourceOptions};
pub use types::{BlobContext, BlobItem, BlobKind, BlobSegment, ListBlobsRequest, ListingEntry};
