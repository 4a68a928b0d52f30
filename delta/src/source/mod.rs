//! Ordered, paginated views over remote collections.
//!
//! Every backend exposes its collection through an [`OrderedSource`] whose cursors yield items
//! in ascending ordinal key order. Key bounds are applied by fetching and discarding, so page
//! sizes keep their server-side meaning regardless of the requested range.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::DeltaResult;

mod segmented;

pub use segmented::{Segment, SegmentPager, SegmentedCursor};

/// Items that carry an ordinal key.
pub trait Keyed {
    type Key: Ord + Clone + fmt::Debug + Send + Sync;

    fn key(&self) -> &Self::Key;
}

/// Optional inclusive lower bound and exclusive upper bound on keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange<K> {
    pub min: Option<K>,
    pub max: Option<K>,
}

impl<K: Ord> KeyRange<K> {
    pub fn new(min: Option<K>, max: Option<K>) -> Self {
        Self { min, max }
    }

    pub fn unbounded() -> Self {
        Self {
            min: None,
            max: None,
        }
    }

    /// Returns `true` when `key` sorts before the lower bound.
    pub fn is_below_min(&self, key: &K) -> bool {
        self.min.as_ref().is_some_and(|min| key < min)
    }

    /// Returns `true` when `key` reached the exclusive upper bound.
    pub fn is_past_max(&self, key: &K) -> bool {
        self.max.as_ref().is_some_and(|max| key >= max)
    }
}

impl<K> Default for KeyRange<K> {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
        }
    }
}

/// Opaque backend cursor marking where a listing resumes.
///
/// A token is only meaningful for the exact query (prefix, delimiter, filter) that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An item together with where it was found.
///
/// `continuation` is the token that fetched the item's segment (`None` for the first one), so
/// re-issuing the listing with it and skipping `item_index + 1` items resumes right after the item.
#[derive(Debug, Clone, PartialEq)]
pub struct Positioned<T> {
    pub item: T,
    pub continuation: Option<ContinuationToken>,
    pub segment_index: usize,
    pub item_index: usize,
}

impl<T: Keyed> Keyed for Positioned<T> {
    type Key = T::Key;

    fn key(&self) -> &Self::Key {
        self.item.key()
    }
}

/// Forward-only reader over an ordered source.
///
/// Once `advance` returns `Ok(None)` every later call does too. An error is returned from the
/// call whose page fetch failed; no item is skipped silently.
pub trait Cursor: Send {
    type Item: Keyed + Send;

    fn advance(&mut self) -> impl Future<Output = DeltaResult<Option<Self::Item>>> + Send;
}

/// Something that can be read from the beginning any number of times.
pub trait OrderedSource {
    type Cursor: Cursor;

    fn open(&self) -> Self::Cursor;
}

/// Checks a requested page size against the backend ceiling.
pub(crate) fn validate_page_size(
    field: &'static str,
    value: usize,
    max: usize,
) -> DeltaResult<()> {
    delta_config::shared::validate_page_size(field, value, max)?;

    Ok(())
}
