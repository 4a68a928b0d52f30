//! Discovery of the leading characters of blob names, as a tree of shared prefixes.
//!
//! A [`PrefixTreeBuilder`] expands [`PrefixNode`]s with delimited listings instead of listing
//! every name. Each child node carries the continuation token where its names start, so the
//! tree can be used to split a container into independent listing ranges.

mod builder;
mod node;
mod text;

pub use builder::{Depth, PrefixTreeBuilder};
pub use node::PrefixNode;
