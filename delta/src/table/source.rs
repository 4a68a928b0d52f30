use std::marker::PhantomData;

use delta_config::shared::{MAX_TABLE_TAKE_COUNT, SourceConfig};
use metrics::counter;

use crate::error::DeltaResult;
use crate::metrics::{BACKEND_LABEL, DELTA_BACKEND_REQUESTS_TOTAL, TABLE_BACKEND};
use crate::source::{
    ContinuationToken, Cursor, KeyRange, OrderedSource, Segment, SegmentPager, SegmentedCursor,
    validate_page_size,
};
use crate::table::client::TableClient;
use crate::table::types::{EntityContext, EntityKey, RawEntity, TableQueryRequest};

/// Options for reading a table as an ordered source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySourceOptions {
    /// Inclusive lower bound on keys.
    pub min_key: Option<EntityKey>,
    /// Exclusive upper bound on keys.
    pub max_key: Option<EntityKey>,
    pub take_count: usize,
    pub initial_continuation: Option<ContinuationToken>,
}

impl EntitySourceOptions {
    pub fn from_config(config: &SourceConfig) -> Self {
        Self {
            take_count: config.table_take_count,
            ..Self::default()
        }
    }

    pub fn with_take_count(mut self, take_count: usize) -> Self {
        self.take_count = take_count;
        self
    }
}

impl Default for EntitySourceOptions {
    fn default() -> Self {
        Self {
            min_key: None,
            max_key: None,
            take_count: MAX_TABLE_TAKE_COUNT,
            initial_continuation: None,
        }
    }
}

/// Every entity of a table, ordered by partition key then row key.
///
/// `T` is the typed view each [`EntityContext`] can project its raw entity onto.
#[derive(Debug)]
pub struct EntitySource<C, T> {
    client: C,
    options: EntitySourceOptions,
    phantom: PhantomData<fn() -> T>,
}

impl<C, T> EntitySource<C, T>
where
    C: TableClient + Clone,
{
    pub fn new(client: C, options: EntitySourceOptions) -> DeltaResult<Self> {
        validate_page_size("take_count", options.take_count, MAX_TABLE_TAKE_COUNT)?;

        Ok(Self {
            client,
            options,
            phantom: PhantomData,
        })
    }

    pub fn options(&self) -> &EntitySourceOptions {
        &self.options
    }
}

impl<C, T> OrderedSource for EntitySource<C, T>
where
    C: TableClient + Clone,
    T: Send + Sync,
{
    type Cursor = EntityCursor<C, T>;

    fn open(&self) -> Self::Cursor {
        let pager = EntityPager {
            client: self.client.clone(),
            take_count: self.options.take_count,
        };
        let range = KeyRange::new(self.options.min_key.clone(), self.options.max_key.clone());

        EntityCursor {
            inner: SegmentedCursor::new(pager, range, self.options.initial_continuation.clone()),
            phantom: PhantomData,
        }
    }
}

/// Fetches query segments.
#[derive(Debug)]
pub struct EntityPager<C> {
    client: C,
    take_count: usize,
}

impl<C> SegmentPager for EntityPager<C>
where
    C: TableClient,
{
    type Item = RawEntity;

    async fn fetch_segment(
        &self,
        continuation: Option<ContinuationToken>,
    ) -> DeltaResult<Segment<RawEntity>> {
        let request = TableQueryRequest {
            take_count: self.take_count,
            continuation,
        };
        counter!(DELTA_BACKEND_REQUESTS_TOTAL, BACKEND_LABEL => TABLE_BACKEND).increment(1);

        self.client.query_segmented(request).await
    }
}

/// Cursor yielding [`EntityContext`] values.
pub struct EntityCursor<C: TableClient, T> {
    inner: SegmentedCursor<EntityPager<C>>,
    phantom: PhantomData<fn() -> T>,
}

impl<C, T> Cursor for EntityCursor<C, T>
where
    C: TableClient,
    T: Send + Sync,
{
    type Item = EntityContext<T>;

    async fn advance(&mut self) -> DeltaResult<Option<EntityContext<T>>> {
        Ok(self.inner.advance().await?.map(EntityContext::new))
    }
}
