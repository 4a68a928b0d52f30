use std::future::Future;
use std::sync::Arc;

use crate::error::DeltaResult;
use crate::table::types::{EntitySegment, TableQueryRequest};

/// Segmented query over every entity of a table, ordered by partition then row key.
pub trait TableClient: Send + Sync {
    fn query_segmented(
        &self,
        request: TableQueryRequest,
    ) -> impl Future<Output = DeltaResult<EntitySegment>> + Send;
}

impl<C> TableClient for Arc<C>
where
    C: TableClient,
{
    fn query_segmented(
        &self,
        request: TableQueryRequest,
    ) -> impl Future<Output = DeltaResult<EntitySegment>> + Send {
        (**self).query_segmented(request)
    }
}
