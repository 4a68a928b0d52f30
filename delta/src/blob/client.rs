use std::future::Future;
use std::sync::Arc;

use crate::blob::types::{BlobSegment, ListBlobsRequest};
use crate::error::DeltaResult;

/// Segmented listing of a blob container.
///
/// Entries are returned in ascending ordinal name order. At most `max_results` entries come
/// back per call, and the returned continuation resumes right after the last one. Listing
/// failures are returned as errors; retries belong to the implementation's transport.
pub trait BlobContainerClient: Send + Sync {
    fn list_blobs_segmented(
        &self,
        request: ListBlobsRequest,
    ) -> impl Future<Output = DeltaResult<BlobSegment>> + Send;
}

impl<C> BlobContainerClient for Arc<C>
where
    C: BlobContainerClient,
{
    fn list_blobs_segmented(
        &self,
        request: ListBlobsRequest,
    ) -> impl Future<Output = DeltaResult<BlobSegment>> + Send {
        (**self).list_blobs_segmented(request)
    }
}
