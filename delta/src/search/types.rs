use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::source::Keyed;

/// A search document as a bag of fields.
pub type Document = Map<String, Value>;

/// Field of an index definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexField {
    pub name: String,
    pub is_key: bool,
    pub is_sortable: bool,
    pub is_filterable: bool,
}

impl IndexField {
    /// A plain, non-key field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_key: false,
            is_sortable: false,
            is_filterable: false,
        }
    }

    /// A key field usable for ordered paging.
    pub fn key(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_key: true,
            is_sortable: true,
            is_filterable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    pub fields: Vec<IndexField>,
}

/// Lower bound on the key field of a search request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyFilter {
    AtLeast(String),
    GreaterThan(String),
}

impl KeyFilter {
    /// Renders the filter as an OData expression, e.g. `key gt 'abc'`.
    pub fn render(&self, key_field: &str) -> String {
        let (operator, value) = match self {
            KeyFilter::AtLeast(value) => ("ge", value),
            KeyFilter::GreaterThan(value) => ("gt", value),
        };

        format!("{key_field} {operator} '{}'", value.replace('\'', "''"))
    }

    pub fn matches(&self, key: &str) -> bool {
        match self {
            KeyFilter::AtLeast(value) => key >= value.as_str(),
            KeyFilter::GreaterThan(value) => key > value.as_str(),
        }
    }
}

/// One page request, ordered by the key field ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub key_field: String,
    pub filter: Option<KeyFilter>,
    pub top: usize,
}

impl SearchRequest {
    pub fn filter_expression(&self) -> Option<String> {
        self.filter
            .as_ref()
            .map(|filter| filter.render(&self.key_field))
    }

    pub fn order_by(&self) -> String {
        format!("{} asc", self.key_field)
    }
}

/// A returned document with the page it came from.
///
/// `filter` is the filter of the request that returned the page, so re-issuing it and skipping
/// `document_index + 1` documents resumes right after this one.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentContext {
    pub key: String,
    pub document: Document,
    pub filter: Option<KeyFilter>,
    pub page_index: usize,
    pub document_index: usize,
}

impl Keyed for DocumentContext {
    type Key = String;

    fn key(&self) -> &String {
        &self.key
    }
}
