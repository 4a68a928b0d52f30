use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use delta_config::shared::MAX_TABLE_TAKE_COUNT;
use tokio::sync::Mutex;
use tracing::debug;

use crate::delta_error;
use crate::error::{DeltaResult, ErrorKind};
use crate::source::{ContinuationToken, Segment, validate_page_size};
use crate::table::client::TableClient;
use crate::table::types::{EntityKey, EntitySegment, RawEntity, TableQueryRequest};

#[derive(Debug, Default)]
struct Inner {
    entities: BTreeMap<EntityKey, RawEntity>,
    queries: usize,
}

/// In-memory table.
///
/// Continuation tokens are the JSON-serialized key of the first entity of the next segment.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entity.
    pub async fn upsert(&self, entity: RawEntity) {
        self.inner
            .lock()
            .await
            .entities
            .insert(entity.key.clone(), entity);
    }

    pub async fn delete(&self, key: &EntityKey) -> bool {
        self.inner.lock().await.entities.remove(key).is_some()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entities.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of segmented queries served so far.
    pub async fn query_count(&self) -> usize {
        self.inner.lock().await.queries
    }

    fn encode_token(key: &EntityKey) -> DeltaResult<ContinuationToken> {
        let token = serde_json::to_string(key).map_err(|err| {
            delta_error!(
                ErrorKind::SerializationError,
                "Entity key could not be serialized",
                err
            )
        })?;

        Ok(ContinuationToken::new(token))
    }

    fn decode_token(token: &ContinuationToken) -> DeltaResult<EntityKey> {
        serde_json::from_str(token.as_str()).map_err(|err| {
            delta_error!(
                ErrorKind::InvalidContinuationToken,
                "Continuation token is not a valid entity key",
                err
            )
        })
    }
}

impl TableClient for MemoryTable {
    async fn query_segmented(&self, request: TableQueryRequest) -> DeltaResult<EntitySegment> {
        validate_page_size("take_count", request.take_count, MAX_TABLE_TAKE_COUNT)?;

        let start = match &request.continuation {
            Some(token) => Bound::Included(Self::decode_token(token)?),
            None => Bound::Unbounded,
        };

        let mut inner = self.inner.lock().await;
        inner.queries += 1;

        let mut entries = inner.entities.range((start, Bound::Unbounded));
        let entities: Vec<RawEntity> = entries
            .by_ref()
            .take(request.take_count)
            .map(|(_, entity)| entity.clone())
            .collect();
        let continuation = match entries.next() {
            Some((key, _)) => Some(Self::encode_token(key)?),
            None => None,
        };

        debug!(
            entities = entities.len(),
            has_continuation = continuation.is_some(),
            "queried memory table"
        );

        Ok(Segment::new(entities, continuation))
    }
}
