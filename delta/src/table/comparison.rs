use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::comparison::{
    Comparison, ComparisonKind, ComparisonMerger, ComparisonPolicy, KeyOrder, order_by_key,
};
use crate::error::DeltaResult;
use crate::table::client::TableClient;
use crate::table::source::{EntityCursor, EntitySource};
use crate::table::types::{EntityContext, RawEntity};

/// Outcome of comparing two entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityComparisonKind {
    Same,
    MissingFromLeft,
    MissingFromRight,
    /// Property names differ between the two sides.
    DisjointProperties {
        missing_from_left: Vec<String>,
        missing_from_right: Vec<String>,
    },
    /// Same property names, different values for the listed ones.
    DifferentPropertyValues { properties: Vec<String> },
}

impl ComparisonKind for EntityComparisonKind {
    fn is_missing_from_left(&self) -> bool {
        matches!(self, EntityComparisonKind::MissingFromLeft)
    }

    fn is_missing_from_right(&self) -> bool {
        matches!(self, EntityComparisonKind::MissingFromRight)
    }

    fn is_same(&self) -> bool {
        matches!(self, EntityComparisonKind::Same)
    }
}

/// Compares entities by key, then property names, then property values.
///
/// Only user properties take part; timestamps and etags are service-assigned.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityComparisonPolicy;

impl EntityComparisonPolicy {
    fn compare_raw(left: &RawEntity, right: &RawEntity) -> EntityComparisonKind {
        let left_names: BTreeSet<&String> = left.properties.keys().collect();
        let right_names: BTreeSet<&String> = right.properties.keys().collect();

        if left_names != right_names {
            return EntityComparisonKind::DisjointProperties {
                missing_from_left: right_names
                    .difference(&left_names)
                    .map(|name| name.to_string())
                    .collect(),
                missing_from_right: left_names
                    .difference(&right_names)
                    .map(|name| name.to_string())
                    .collect(),
            };
        }

        let properties: Vec<String> = left
            .properties
            .iter()
            .filter(|(name, value)| right.properties.get(*name) != Some(*value))
            .map(|(name, _)| name.clone())
            .collect();

        if properties.is_empty() {
            EntityComparisonKind::Same
        } else {
            EntityComparisonKind::DifferentPropertyValues { properties }
        }
    }
}

impl<T, U> ComparisonPolicy<EntityContext<T>, EntityContext<U>> for EntityComparisonPolicy {
    type Kind = EntityComparisonKind;

    fn compare(
        &self,
        left: Option<&EntityContext<T>>,
        right: Option<&EntityContext<U>>,
    ) -> DeltaResult<EntityComparisonKind> {
        Ok(match order_by_key(left, right)? {
            KeyOrder::MissingFromLeft => EntityComparisonKind::MissingFromLeft,
            KeyOrder::MissingFromRight => EntityComparisonKind::MissingFromRight,
            KeyOrder::Equal(left, right) => Self::compare_raw(left.raw(), right.raw()),
        })
    }
}

pub type EntityComparison<T, U = T> =
    Comparison<EntityContext<T>, EntityContext<U>, EntityComparisonKind>;

pub type EntityComparisonMerger<L, R, T, U = T> =
    ComparisonMerger<EntityCursor<L, T>, EntityCursor<R, U>, EntityComparisonPolicy>;

/// Compares two tables entity by entity.
pub fn compare_entities<L, R, T, U>(
    left: &EntitySource<L, T>,
    right: &EntitySource<R, U>,
) -> EntityComparisonMerger<L, R, T, U>
where
    L: TableClient + Clone,
    R: TableClient + Clone,
    T: Send + Sync,
    U: Send + Sync,
{
    ComparisonMerger::new(left, right, EntityComparisonPolicy)
}
