use std::vec;

use delta_config::shared::{MAX_SEARCH_PAGE_SIZE, SourceConfig};
use metrics::counter;
use tracing::debug;

use crate::error::{DeltaResult, ErrorKind};
use crate::metrics::{BACKEND_LABEL, DELTA_BACKEND_REQUESTS_TOTAL, SEARCH_BACKEND};
use crate::search::client::SearchIndexClient;
use crate::search::types::{Document, DocumentContext, KeyFilter, SearchRequest};
use crate::source::{Cursor, OrderedSource, validate_page_size};
use crate::{bail, delta_error};

/// Options for reading an index as an ordered source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSourceOptions {
    /// Inclusive lower bound, sent to the service as a `ge` filter.
    pub min_key: Option<String>,
    /// Exclusive upper bound, checked on returned documents.
    pub max_key: Option<String>,
    pub page_size: usize,
}

impl DocumentSourceOptions {
    pub fn from_config(config: &SourceConfig) -> Self {
        Self {
            page_size: config.search_page_size,
            ..Self::default()
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

impl Default for DocumentSourceOptions {
    fn default() -> Self {
        Self {
            min_key: None,
            max_key: None,
            page_size: MAX_SEARCH_PAGE_SIZE,
        }
    }
}

/// Documents of one index, ordered by key.
///
/// Search has no continuation tokens, so paging is done with key filters: the first page
/// starts at `min_key`, every following one asks for keys greater than the last key seen.
#[derive(Debug, Clone)]
pub struct DocumentSource<C> {
    client: C,
    key_field: String,
    options: DocumentSourceOptions,
}

impl<C> DocumentSource<C>
where
    C: SearchIndexClient + Clone,
{
    /// Looks up the index key field and checks it supports ordered paging.
    pub async fn create(client: C, options: DocumentSourceOptions) -> DeltaResult<Self> {
        validate_page_size("page_size", options.page_size, MAX_SEARCH_PAGE_SIZE)?;

        let definition = client.index_definition().await?;
        let mut key_fields = definition.fields.iter().filter(|field| field.is_key);
        let Some(key_field) = key_fields.next() else {
            bail!(
                ErrorKind::MissingKeyField,
                "The index has no key field",
                format!("index '{}'", definition.name)
            );
        };

        if key_fields.next().is_some() {
            bail!(
                ErrorKind::ValidationError,
                "The index has more than one key field",
                format!("index '{}'", definition.name)
            );
        }

        if !key_field.is_sortable {
            bail!(
                ErrorKind::ValidationError,
                "The key field must be sortable",
                format!(
                    "The key field '{}' of index '{}' must be sortable.",
                    key_field.name, definition.name
                )
            );
        }

        if !key_field.is_filterable {
            bail!(
                ErrorKind::ValidationError,
                "The key field must be filterable",
                format!(
                    "The key field '{}' of index '{}' must be filterable.",
                    key_field.name, definition.name
                )
            );
        }

        Ok(Self {
            key_field: key_field.name.clone(),
            client,
            options,
        })
    }

    pub fn key_field(&self) -> &str {
        &self.key_field
    }
}

impl<C> OrderedSource for DocumentSource<C>
where
    C: SearchIndexClient + Clone,
{
    type Cursor = DocumentCursor<C>;

    fn open(&self) -> Self::Cursor {
        DocumentCursor {
            client: self.client.clone(),
            key_field: self.key_field.clone(),
            max_key: self.options.max_key.clone(),
            page_size: self.options.page_size,
            state: PageState::Pending {
                filter: self.options.min_key.clone().map(KeyFilter::AtLeast),
                page_index: 0,
            },
        }
    }
}

enum PageState {
    Pending {
        filter: Option<KeyFilter>,
        page_index: usize,
    },
    Positioned {
        documents: vec::IntoIter<(String, Document)>,
        filter: Option<KeyFilter>,
        page_index: usize,
        next_document_index: usize,
        last_key: Option<String>,
        is_last_page: bool,
    },
    Complete,
}

/// Cursor paging through an index with key filters.
pub struct DocumentCursor<C> {
    client: C,
    key_field: String,
    max_key: Option<String>,
    page_size: usize,
    state: PageState,
}

impl<C> DocumentCursor<C>
where
    C: SearchIndexClient,
{
    async fn fetch_page(&self, filter: Option<KeyFilter>) -> DeltaResult<Vec<(String, Document)>> {
        let request = SearchRequest {
            key_field: self.key_field.clone(),
            filter,
            top: self.page_size,
        };
        debug!(filter = ?request.filter_expression(), top = request.top, "searching index");
        counter!(DELTA_BACKEND_REQUESTS_TOTAL, BACKEND_LABEL => SEARCH_BACKEND).increment(1);

        let documents = self.client.search(request).await?;

        documents
            .into_iter()
            .map(|document| -> DeltaResult<(String, Document)> {
                let key = document
                    .get(&self.key_field)
                    .and_then(|value| value.as_str())
                    .ok_or_else(|| {
                        delta_error!(
                            ErrorKind::MissingKeyField,
                            "A search result has no string key",
                            format!("key field '{}'", self.key_field)
                        )
                    })?
                    .to_string();

                Ok((key, document))
            })
            .collect()
    }
}

impl<C> Cursor for DocumentCursor<C>
where
    C: SearchIndexClient,
{
    type Item = DocumentContext;

    async fn advance(&mut self) -> DeltaResult<Option<DocumentContext>> {
        loop {
            match &mut self.state {
                PageState::Complete => return Ok(None),
                PageState::Pending { filter, page_index } => {
                    let filter = filter.clone();
                    let page_index = *page_index;
                    let documents = self.fetch_page(filter.clone()).await?;

                    self.state = PageState::Positioned {
                        is_last_page: documents.len() < self.page_size,
                        documents: documents.into_iter(),
                        filter,
                        page_index,
                        next_document_index: 0,
                        last_key: None,
                    };
                }
                PageState::Positioned {
                    documents,
                    filter,
                    page_index,
                    next_document_index,
                    last_key,
                    is_last_page,
                } => {
                    if let Some((key, document)) = documents.next() {
                        if self.max_key.as_ref().is_some_and(|max| &key >= max) {
                            self.state = PageState::Complete;
                            return Ok(None);
                        }

                        let document_index = *next_document_index;
                        *next_document_index += 1;
                        *last_key = Some(key.clone());

                        return Ok(Some(DocumentContext {
                            key,
                            document,
                            filter: filter.clone(),
                            page_index: *page_index,
                            document_index,
                        }));
                    }

                    self.state = match (last_key.take(), *is_last_page) {
                        (Some(last_key), false) => PageState::Pending {
                            filter: Some(KeyFilter::GreaterThan(last_key)),
                            page_index: *page_index + 1,
                        },
                        _ => PageState::Complete,
                    };
                }
            }
        }
    }
}
