use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Largest page a blob listing call may request.
pub const MAX_BLOB_PAGE_SIZE: usize = 5000;

/// Largest take count a table query may request.
pub const MAX_TABLE_TAKE_COUNT: usize = 1000;

/// Largest page a search query may request.
pub const MAX_SEARCH_PAGE_SIZE: usize = 1000;

/// Checks that `value` lies in `1..=max`.
pub fn validate_page_size(
    field: &'static str,
    value: usize,
    max: usize,
) -> Result<(), ValidationError> {
    if value == 0 || value > max {
        return Err(ValidationError::PageSizeOutOfRange { field, value, max });
    }

    Ok(())
}

/// Page sizes used when opening sources.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SourceConfig {
    #[serde(default = "default_blob_page_size")]
    pub blob_page_size: usize,
    #[serde(default = "default_table_take_count")]
    pub table_take_count: usize,
    #[serde(default = "default_search_page_size")]
    pub search_page_size: usize,
}

impl SourceConfig {
    /// Validates every page size against its backend ceiling.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_page_size("blob_page_size", self.blob_page_size, MAX_BLOB_PAGE_SIZE)?;
        validate_page_size(
            "table_take_count",
            self.table_take_count,
            MAX_TABLE_TAKE_COUNT,
        )?;
        validate_page_size(
            "search_page_size",
            self.search_page_size,
            MAX_SEARCH_PAGE_SIZE,
        )
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            blob_page_size: default_blob_page_size(),
            table_take_count: default_table_take_count(),
            search_page_size: default_search_page_size(),
        }
    }
}

fn default_blob_page_size() -> usize {
    MAX_BLOB_PAGE_SIZE
}

fn default_table_take_count() -> usize {
    MAX_TABLE_TAKE_COUNT
}

fn default_search_page_size() -> usize {
    MAX_SEARCH_PAGE_SIZE
}
