//! Ordered deltas between paginated remote collections.
//!
//! Two [`source::OrderedSource`]s are walked in lock step by a
//! [`comparison::ComparisonMerger`], which asks a [`comparison::ComparisonPolicy`] to judge every
//! key and yields one comparison per distinct key in ascending order. Sources exist for blob
//! containers ([`blob`]), tables ([`table`]) and search indexes ([`search`]). The
//! [`prefix_tree`] module discovers how blob names are distributed without listing them all.

mod macros;

pub mod blob;
pub mod comparison;
pub mod concurrency;
pub mod error;
pub mod metrics;
pub mod prefix_tree;
pub mod search;
pub mod source;
pub mod table;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
