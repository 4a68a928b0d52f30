//! Search indexes as ordered sources of documents.

mod client;
mod comparison;
pub mod memory;
mod source;
mod types;

pub use client::SearchIndexClient;
pub use comparison::{
    DocumentComparison, DocumentComparisonKind, DocumentComparisonMerger,
    DocumentComparisonPolicy, FieldDifferences, compare_documents,
};
pub use source::{DocumentCursor, DocumentSource, DocumentSourceOptions};
pub use types::{
    Document, DocumentContext, IndexDefinition, IndexField, KeyFilter, SearchRequest,
};
