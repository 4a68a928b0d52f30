use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::blob::{BlobContainerClient, BlobSegment, ListBlobsRequest};
use crate::bail;
use crate::error::{DeltaResult, ErrorKind};
use crate::search::{Document, IndexDefinition, SearchIndexClient, SearchRequest};
use crate::table::{EntitySegment, TableClient, TableQueryRequest};

/// Client wrapper that serves `successful_requests` requests and fails every later one with
/// [`ErrorKind::SourceQueryFailed`].
///
/// Clones share the request counter, so a wrapper handed to a worker pool fails once the
/// whole pool has used up the budget.
#[derive(Debug, Clone)]
pub struct FaultyClient<C> {
    inner: C,
    successful_requests: usize,
    requests: Arc<AtomicUsize>,
}

impl<C> FaultyClient<C> {
    pub fn wrap(inner: C, successful_requests: usize) -> Self {
        Self {
            inner,
            successful_requests,
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Requests received so far, failed ones included.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn check(&self) -> DeltaResult<()> {
        let request = self.requests.fetch_add(1, Ordering::SeqCst);
        if request >= self.successful_requests {
            bail!(
                ErrorKind::SourceQueryFailed,
                "Injected request failure",
                format!("request {request}")
            );
        }

        Ok(())
    }
}

impl<C> BlobContainerClient for FaultyClient<C>
where
    C: BlobContainerClient,
{
    async fn list_blobs_segmented(&self, request: ListBlobsRequest) -> DeltaResult<BlobSegment> {
        self.check()?;
        self.inner.list_blobs_segmented(request).await
    }
}

impl<C> TableClient for FaultyClient<C>
where
    C: TableClient,
{
    async fn query_segmented(&self, request: TableQueryRequest) -> DeltaResult<EntitySegment> {
        self.check()?;
        self.inner.query_segmented(request).await
    }
}

impl<C> SearchIndexClient for FaultyClient<C>
where
    C: SearchIndexClient,
{
    async fn index_definition(&self) -> DeltaResult<IndexDefinition> {
        self.inner.index_definition().await
    }

    async fn search(&self, request: SearchRequest) -> DeltaResult<Vec<Document>> {
        self.check()?;
        self.inner.search(request).await
    }
}
