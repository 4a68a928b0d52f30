use std::future::Future;
use std::sync::Arc;

use crate::error::DeltaResult;
use crate::search::types::{Document, IndexDefinition, SearchRequest};

/// Access to a single search index.
pub trait SearchIndexClient: Send + Sync {
    fn index_definition(&self) -> impl Future<Output = DeltaResult<IndexDefinition>> + Send;

    /// Returns at most `request.top` documents matching the filter, ordered by key ascending.
    fn search(
        &self,
        request: SearchRequest,
    ) -> impl Future<Output = DeltaResult<Vec<Document>>> + Send;
}

impl<C> SearchIndexClient for Arc<C>
where
    C: SearchIndexClient,
{
    fn index_definition(&self) -> impl Future<Output = DeltaResult<IndexDefinition>> + Send {
        (**self).index_definition()
    }

    fn search(
        &self,
        request: SearchRequest,
    ) -> impl Future<Output = DeltaResult<Vec<Document>>> + Send {
        (**self).search(request)
    }
}
