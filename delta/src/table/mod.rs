//! Table storage as an ordered source of entities.

mod client;
mod comparison;
pub mod memory;
mod source;
mod types;

pub use client::TableClient;
pub use comparison::{
    EntityComparison, EntityComparisonKind, EntityComparisonMerger, EntityComparisonPolicy,
    compare_entities,
};
pub use source::{EntityCursor, EntityPager, EntitySource, EntitySourceOptions};
pub use types::{
    EntityContext, EntityKey, EntitySegment, PropertyValue, RawEntity, TableQueryRequest,
};
