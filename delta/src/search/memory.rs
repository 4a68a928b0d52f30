use std::collections::BTreeMap;
use std::sync::Arc;

use delta_config::shared::MAX_SEARCH_PAGE_SIZE;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{DeltaResult, ErrorKind};
use crate::search::client::SearchIndexClient;
use crate::search::types::{Document, IndexDefinition, IndexField, SearchRequest};
use crate::source::validate_page_size;
use crate::{bail, delta_error};

#[derive(Debug)]
struct Inner {
    definition: IndexDefinition,
    key_field: String,
    documents: BTreeMap<String, Document>,
    issued_filters: Vec<Option<String>>,
}

/// In-memory search index answering key-ordered, key-filtered searches.
#[derive(Debug, Clone)]
pub struct MemorySearchIndex {
    inner: Arc<Mutex<Inner>>,
}

impl MemorySearchIndex {
    /// Creates an index with a sortable, filterable key field and the given plain fields.
    pub fn new(name: impl Into<String>, key_field: impl Into<String>, fields: &[&str]) -> Self {
        let key_field = key_field.into();
        let mut all_fields = vec![IndexField::key(key_field.clone())];
        all_fields.extend(fields.iter().map(|field| IndexField::new(*field)));

        Self::with_definition(IndexDefinition {
            name: name.into(),
            fields: all_fields,
        })
    }

    /// Creates an index from an explicit definition, whatever its key field allows.
    pub fn with_definition(definition: IndexDefinition) -> Self {
        let key_field = definition
            .fields
            .iter()
            .find(|field| field.is_key)
            .map(|field| field.name.clone())
            .unwrap_or_default();

        Self {
            inner: Arc::new(Mutex::new(Inner {
                definition,
                key_field,
                documents: BTreeMap::new(),
                issued_filters: Vec::new(),
            })),
        }
    }

    /// Adds or replaces a document; the key field must hold a string.
    pub async fn upload(&self, document: Document) -> DeltaResult<()> {
        let mut inner = self.inner.lock().await;

        let Some(key) = document.get(&inner.key_field).and_then(|value| value.as_str()) else {
            bail!(
                ErrorKind::MissingKeyField,
                "The document has no string key",
                format!("key field '{}'", inner.key_field)
            );
        };
        let key = key.to_string();
        inner.documents.insert(key, document);

        Ok(())
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.inner.lock().await.documents.remove(key).is_some()
    }

    /// Rendered filter of every search served so far, in order.
    pub async fn issued_filters(&self) -> Vec<Option<String>> {
        self.inner.lock().await.issued_filters.clone()
    }
}

impl SearchIndexClient for MemorySearchIndex {
    async fn index_definition(&self) -> DeltaResult<IndexDefinition> {
        Ok(self.inner.lock().await.definition.clone())
    }

    async fn search(&self, request: SearchRequest) -> DeltaResult<Vec<Document>> {
        validate_page_size("top", request.top, MAX_SEARCH_PAGE_SIZE)?;

        let mut inner = self.inner.lock().await;
        if request.key_field != inner.key_field {
            return Err(delta_error!(
                ErrorKind::ValidationError,
                "Searches must be ordered by the key field",
                format!("requested '{}'", request.key_field)
            ));
        }

        inner.issued_filters.push(request.filter_expression());

        let documents: Vec<Document> = inner
            .documents
            .iter()
            .filter(|(key, _)| {
                request
                    .filter
                    .as_ref()
                    .is_none_or(|filter| filter.matches(key))
            })
            .take(request.top)
            .map(|(_, document)| document.clone())
            .collect();

        debug!(
            filter = ?request.filter_expression(),
            documents = documents.len(),
            "searched memory index"
        );

        Ok(documents)
    }
}
