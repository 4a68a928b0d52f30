//! Metric names and labels recorded by delta.

/// Label naming the backend a request was sent to.
pub const BACKEND_LABEL: &str = "backend";

/// Label naming the outcome of a comparison.
pub const OUTCOME_LABEL: &str = "outcome";

/// Backend label value for blob containers.
pub const BLOB_BACKEND: &str = "blob";

/// Backend label value for tables.
pub const TABLE_BACKEND: &str = "table";

/// Backend label value for search indexes.
pub const SEARCH_BACKEND: &str = "search";

/// Counter for listing, query and search requests sent to a backend.
pub const DELTA_BACKEND_REQUESTS_TOTAL: &str = "delta_backend_requests_total";

/// Counter for comparison records emitted by mergers.
pub const DELTA_COMPARISONS_TOTAL: &str = "delta_comparisons_total";

/// Counter for prefix tree nodes whose children were fully discovered.
pub const DELTA_PREFIX_NODES_ENUMERATED_TOTAL: &str = "delta_prefix_nodes_enumerated_total";
