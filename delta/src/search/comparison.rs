use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::comparison::{
    Comparison, ComparisonKind, ComparisonMerger, ComparisonPolicy, KeyOrder, order_by_key,
};
use crate::error::DeltaResult;
use crate::search::client::SearchIndexClient;
use crate::search::source::{DocumentCursor, DocumentSource};
use crate::search::types::{Document, DocumentContext};

/// Field-level differences between two documents sharing a key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDifferences {
    pub missing_from_left: Vec<String>,
    pub missing_from_right: Vec<String>,
    pub different_values: Vec<String>,
}

impl FieldDifferences {
    pub fn is_empty(&self) -> bool {
        self.missing_from_left.is_empty()
            && self.missing_from_right.is_empty()
            && self.different_values.is_empty()
    }
}

/// Outcome of comparing two documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentComparisonKind {
    Same,
    MissingFromLeft,
    MissingFromRight,
    DifferentFields(FieldDifferences),
}

impl ComparisonKind for DocumentComparisonKind {
    fn is_missing_from_left(&self) -> bool {
        matches!(self, DocumentComparisonKind::MissingFromLeft)
    }

    fn is_missing_from_right(&self) -> bool {
        matches!(self, DocumentComparisonKind::MissingFromRight)
    }

    fn is_same(&self) -> bool {
        matches!(self, DocumentComparisonKind::Same)
    }
}

/// Compares documents by key, then field by field.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentComparisonPolicy;

impl DocumentComparisonPolicy {
    fn compare_documents(left: &Document, right: &Document) -> DocumentComparisonKind {
        let left_fields: BTreeSet<&String> = left.keys().collect();
        let right_fields: BTreeSet<&String> = right.keys().collect();

        let differences = FieldDifferences {
            missing_from_left: right_fields
                .difference(&left_fields)
                .map(|field| field.to_string())
                .collect(),
            missing_from_right: left_fields
                .difference(&right_fields)
                .map(|field| field.to_string())
                .collect(),
            different_values: left_fields
                .intersection(&right_fields)
                .filter(|field| !field_equals(&left[field.as_str()], &right[field.as_str()]))
                .map(|field| field.to_string())
                .collect(),
        };

        if differences.is_empty() {
            DocumentComparisonKind::Same
        } else {
            DocumentComparisonKind::DifferentFields(differences)
        }
    }
}

/// Value equality where two arrays are compared element by element.
fn field_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right)
                    .all(|(left, right)| field_equals(left, right))
        }
        _ => left == right,
    }
}

impl ComparisonPolicy<DocumentContext, DocumentContext> for DocumentComparisonPolicy {
    type Kind = DocumentComparisonKind;

    fn compare(
        &self,
        left: Option<&DocumentContext>,
        right: Option<&DocumentContext>,
    ) -> DeltaResult<DocumentComparisonKind> {
        Ok(match order_by_key(left, right)? {
            KeyOrder::MissingFromLeft => DocumentComparisonKind::MissingFromLeft,
            KeyOrder::MissingFromRight => DocumentComparisonKind::MissingFromRight,
            KeyOrder::Equal(left, right) => {
                Self::compare_documents(&left.document, &right.document)
            }
        })
    }
}

pub type DocumentComparison = Comparison<DocumentContext, DocumentContext, DocumentComparisonKind>;

pub type DocumentComparisonMerger<L, R> =
    ComparisonMerger<DocumentCursor<L>, DocumentCursor<R>, DocumentComparisonPolicy>;

/// Compares two indexes document by document.
pub fn compare_documents<L, R>(
    left: &DocumentSource<L>,
    right: &DocumentSource<R>,
) -> DocumentComparisonMerger<L, R>
where
    L: SearchIndexClient + Clone,
    R: SearchIndexClient + Clone,
{
    ComparisonMerger::new(left, right, DocumentComparisonPolicy)
}
