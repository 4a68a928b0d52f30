use serde::{Deserialize, Serialize};

use crate::blob::client::BlobContainerClient;
use crate::blob::source::{BlobCursor, BlobSource};
use crate::blob::types::{BlobContext, BlobItem, BlobKind};
use crate::comparison::{
    Comparison, ComparisonKind, ComparisonMerger, ComparisonPolicy, KeyOrder, order_by_key,
};
use crate::error::DeltaResult;

/// Outcome of comparing two listed blobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobComparisonKind {
    Same,
    MissingFromLeft,
    MissingFromRight,
    DifferentBlobType,
    /// Both blobs share a kind other than [`BlobKind::Block`].
    UnsupportedBlobType,
    DifferentContent,
    /// One side has no stored content digest, so content cannot be compared.
    MissingContentDigest,
}

impl ComparisonKind for BlobComparisonKind {
    fn is_missing_from_left(&self) -> bool {
        matches!(self, BlobComparisonKind::MissingFromLeft)
    }

    fn is_missing_from_right(&self) -> bool {
        matches!(self, BlobComparisonKind::MissingFromRight)
    }

    fn is_same(&self) -> bool {
        matches!(self, BlobComparisonKind::Same)
    }
}

/// Compares blobs by name, then kind, length and content digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlobComparisonPolicy;

impl BlobComparisonPolicy {
    fn compare_items(left: &BlobItem, right: &BlobItem) -> BlobComparisonKind {
        if left.kind != right.kind {
            return BlobComparisonKind::DifferentBlobType;
        }

        if left.kind != BlobKind::Block {
            return BlobComparisonKind::UnsupportedBlobType;
        }

        if left.length != right.length {
            return BlobComparisonKind::DifferentContent;
        }

        match (&left.content_digest, &right.content_digest) {
            (Some(left), Some(right)) if left == right => BlobComparisonKind::Same,
            (Some(_), Some(_)) => BlobComparisonKind::DifferentContent,
            _ => BlobComparisonKind::MissingContentDigest,
        }
    }
}

impl ComparisonPolicy<BlobContext, BlobContext> for BlobComparisonPolicy {
    type Kind = BlobComparisonKind;

    fn compare(
        &self,
        left: Option<&BlobContext>,
        right: Option<&BlobContext>,
    ) -> DeltaResult<BlobComparisonKind> {
        Ok(match order_by_key(left, right)? {
            KeyOrder::MissingFromLeft => BlobComparisonKind::MissingFromLeft,
            KeyOrder::MissingFromRight => BlobComparisonKind::MissingFromRight,
            KeyOrder::Equal(left, right) => Self::compare_items(&left.item, &right.item),
        })
    }
}

pub type BlobComparison = Comparison<BlobContext, BlobContext, BlobComparisonKind>;

pub type BlobComparisonMerger<L, R> =
    ComparisonMerger<BlobCursor<L>, BlobCursor<R>, BlobComparisonPolicy>;

/// Compares two containers name by name.
pub fn compare_blobs<L, R>(
    left: &BlobSource<L>,
    right: &BlobSource<R>,
) -> BlobComparisonMerger<L, R>
where
    L: BlobContainerClient + Clone,
    R: BlobContainerClient + Clone,
{
    ComparisonMerger::new(left, right, BlobComparisonPolicy)
}
