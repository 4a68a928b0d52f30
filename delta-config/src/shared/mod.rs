//! Configuration shared by the delta engine and its callers.

mod base;
mod delta;
mod log_level;
mod prefix_tree;
mod source;

pub use base::ValidationError;
pub use delta::DeltaConfig;
pub use log_level::LogLevel;
pub use prefix_tree::PrefixTreeConfig;
pub use source::{
    MAX_BLOB_PAGE_SIZE, MAX_SEARCH_PAGE_SIZE, MAX_TABLE_TAKE_COUNT, SourceConfig,
    validate_page_size,
};
