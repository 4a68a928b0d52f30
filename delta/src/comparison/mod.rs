//! Merge-join comparison of two ordered sources.
//!
//! [`ComparisonMerger`] walks both sides in lock step and asks a [`ComparisonPolicy`] to judge
//! each pair of current items. The policy decides, by ordinal key comparison first, whether a
//! key is missing from one side or present on both; only then does it look at content.

use std::cmp::Ordering;
use std::fmt;

use crate::bail;
use crate::error::{DeltaResult, ErrorKind};
use crate::source::Keyed;

mod merger;

pub use merger::ComparisonMerger;

/// Outcome classification produced by a [`ComparisonPolicy`].
pub trait ComparisonKind: Clone + fmt::Debug + PartialEq + Send {
    /// The right side holds a key the left side does not.
    fn is_missing_from_left(&self) -> bool;

    /// The left side holds a key the right side does not.
    fn is_missing_from_right(&self) -> bool;

    fn is_same(&self) -> bool;
}

/// Judges the current pair of items of a merge step.
///
/// Implementations must fail with [`ErrorKind::InvalidState`] when both sides are `None`.
pub trait ComparisonPolicy<L, R>: Send {
    type Kind: ComparisonKind;

    fn compare(&self, left: Option<&L>, right: Option<&R>) -> DeltaResult<Self::Kind>;
}

/// One record of a comparison stream.
///
/// Exactly one side is absent for the two "missing" kinds and both are present otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison<L, R, K> {
    kind: K,
    left: Option<L>,
    right: Option<R>,
}

impl<L, R, K> Comparison<L, R, K>
where
    K: ComparisonKind,
{
    pub fn new(kind: K, left: Option<L>, right: Option<R>) -> DeltaResult<Self> {
        let valid = if kind.is_missing_from_left() {
            left.is_none() && right.is_some()
        } else if kind.is_missing_from_right() {
            left.is_some() && right.is_none()
        } else {
            left.is_some() && right.is_some()
        };

        if !valid {
            bail!(
                ErrorKind::InvalidState,
                "Comparison sides do not match the comparison kind",
                format!(
                    "kind {kind:?} with left present: {}, right present: {}",
                    left.is_some(),
                    right.is_some()
                )
            );
        }

        Ok(Self { kind, left, right })
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    pub fn left(&self) -> Option<&L> {
        self.left.as_ref()
    }

    pub fn right(&self) -> Option<&R> {
        self.right.as_ref()
    }

    pub fn into_parts(self) -> (K, Option<L>, Option<R>) {
        (self.kind, self.left, self.right)
    }
}

/// Key-level verdict shared by every policy.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum KeyOrder<'a, L, R> {
    MissingFromLeft,
    MissingFromRight,
    Equal(&'a L, &'a R),
}

/// Ordinal key comparison of the current pair.
///
/// A smaller left key means the right side skipped it, so it is missing from the right.
pub(crate) fn order_by_key<'a, L, R>(
    left: Option<&'a L>,
    right: Option<&'a R>,
) -> DeltaResult<KeyOrder<'a, L, R>>
where
    L: Keyed,
    R: Keyed<Key = L::Key>,
{
    match (left, right) {
        (None, None) => bail!(ErrorKind::InvalidState, "Only one side should be null"),
        (None, Some(_)) => Ok(KeyOrder::MissingFromLeft),
        (Some(_), None) => Ok(KeyOrder::MissingFromRight),
        (Some(left), Some(right)) => Ok(match left.key().cmp(right.key()) {
            Ordering::Less => KeyOrder::MissingFromRight,
            Ordering::Greater => KeyOrder::MissingFromLeft,
            Ordering::Equal => KeyOrder::Equal(left, right),
        }),
    }
}
