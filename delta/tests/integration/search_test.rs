use delta::error::ErrorKind;
use delta::search::memory::MemorySearchIndex;
use delta::search::{
    Document, DocumentComparisonKind, DocumentSource, DocumentSourceOptions, FieldDifferences,
    IndexDefinition, IndexField, compare_documents,
};
use delta::test_utils::cursor::read_all;
use delta_telemetry::tracing::init_test_tracing;
use serde_json::{Value, json};

const KEYS: [&str; 5] = ["A", "B", "C", "D", "E"];

fn document(value: Value) -> Document {
    match value {
        Value::Object(document) => document,
        other => panic!("not a document: {other}"),
    }
}

async fn index_with_keys(keys: &[&str]) -> MemorySearchIndex {
    let index = MemorySearchIndex::new("keyed", "Key", &["Value"]);
    for key in keys {
        index
            .upload(document(json!({ "Key": key, "Value": key.to_lowercase() })))
            .await
            .unwrap();
    }

    index
}

async fn keys_read(options: DocumentSourceOptions) -> Vec<String> {
    let index = index_with_keys(&KEYS).await;
    let source = DocumentSource::create(index, options).await.unwrap();

    read_all(&source)
        .await
        .unwrap()
        .into_iter()
        .map(|document| document.key)
        .collect()
}

fn expected(keys: &str) -> Vec<String> {
    keys.split_whitespace().map(str::to_string).collect()
}

#[tokio::test]
async fn empty_index_yields_nothing() {
    init_test_tracing();

    let source = DocumentSource::create(
        index_with_keys(&[]).await,
        DocumentSourceOptions::default(),
    )
    .await
    .unwrap();

    assert!(read_all(&source).await.unwrap().is_empty());
}

#[tokio::test]
async fn every_page_size_returns_all_documents() {
    init_test_tracing();

    for page_size in [1, 2, 4, 5, 6] {
        let keys = keys_read(DocumentSourceOptions::default().with_page_size(page_size)).await;
        assert_eq!(keys, expected("A B C D E"), "page size {page_size}");
    }
}

#[tokio::test]
async fn min_key_is_inclusive() {
    init_test_tracing();

    for (min_key, keys) in [("B", "B C D E"), ("0", "A B C D E"), ("E", "E"), ("F", "")] {
        let options = DocumentSourceOptions {
            min_key: Some(min_key.to_string()),
            ..DocumentSourceOptions::default().with_page_size(10)
        };

        assert_eq!(keys_read(options).await, expected(keys), "min key {min_key}");
    }
}

#[tokio::test]
async fn max_key_is_exclusive() {
    init_test_tracing();

    for (max_key, keys) in [("B", "A"), ("0", ""), ("E", "A B C D"), ("F", "A B C D E")] {
        let options = DocumentSourceOptions {
            max_key: Some(max_key.to_string()),
            ..DocumentSourceOptions::default().with_page_size(10)
        };

        assert_eq!(keys_read(options).await, expected(keys), "max key {max_key}");
    }
}

#[tokio::test]
async fn pages_continue_after_the_last_key() {
    init_test_tracing();

    let index = index_with_keys(&KEYS).await;
    let source = DocumentSource::create(
        index.clone(),
        DocumentSourceOptions {
            min_key: Some("B".to_string()),
            ..DocumentSourceOptions::default().with_page_size(2)
        },
    )
    .await
    .unwrap();

    let documents = read_all(&source).await.unwrap();
    let positions: Vec<(usize, usize)> = documents
        .iter()
        .map(|document| (document.page_index, document.document_index))
        .collect();

    assert_eq!(positions, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    assert_eq!(
        index.issued_filters().await,
        vec![
            Some("Key ge 'B'".to_string()),
            Some("Key gt 'C'".to_string()),
            Some("Key gt 'E'".to_string()),
        ]
    );
}

#[tokio::test]
async fn key_must_be_sortable_and_filterable() {
    init_test_tracing();

    let mut non_sortable = IndexField::key("Key");
    non_sortable.is_sortable = false;
    let mut non_filterable = IndexField::key("Key");
    non_filterable.is_filterable = false;

    for (field, message) in [
        (
            non_sortable,
            "The key field 'Key' of index 'keyed' must be sortable.",
        ),
        (
            non_filterable,
            "The key field 'Key' of index 'keyed' must be filterable.",
        ),
    ] {
        let index = MemorySearchIndex::with_definition(IndexDefinition {
            name: "keyed".to_string(),
            fields: vec![field],
        });

        let err = DocumentSource::create(index, DocumentSourceOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert_eq!(err.detail(), Some(message));
    }
}

#[tokio::test]
async fn index_without_key_is_rejected() {
    init_test_tracing();

    let index = MemorySearchIndex::with_definition(IndexDefinition {
        name: "keyless".to_string(),
        fields: vec![IndexField::new("Value")],
    });

    let err = DocumentSource::create(index, DocumentSourceOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingKeyField);
}

#[tokio::test]
async fn oversized_page_is_rejected() {
    let err = DocumentSource::create(
        index_with_keys(&[]).await,
        DocumentSourceOptions::default().with_page_size(1001),
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidPageSize);
}

#[tokio::test(flavor = "multi_thread")]
async fn documents_are_compared_field_by_field() {
    init_test_tracing();

    let left = MemorySearchIndex::new("left", "Key", &["Tags", "Title", "Legacy"]);
    let right = MemorySearchIndex::new("right", "Key", &["Tags", "Title", "Owners"]);

    for document_value in [
        json!({ "Key": "a", "Tags": ["x", "y"], "Title": "A" }),
        json!({ "Key": "b", "Tags": ["x"], "Title": "B", "Legacy": true }),
        json!({ "Key": "c", "Title": "C" }),
    ] {
        left.upload(document(document_value)).await.unwrap();
    }
    for document_value in [
        json!({ "Key": "a", "Tags": ["x", "y"], "Title": "A" }),
        json!({ "Key": "b", "Tags": ["y", "x"], "Title": "B", "Owners": ["me"] }),
        json!({ "Key": "d", "Title": "D" }),
    ] {
        right.upload(document(document_value)).await.unwrap();
    }

    let options = DocumentSourceOptions::default().with_page_size(1);
    let left = DocumentSource::create(left, options.clone()).await.unwrap();
    let right = DocumentSource::create(right, options).await.unwrap();

    let kinds: Vec<DocumentComparisonKind> = compare_documents(&left, &right)
        .collect()
        .await
        .unwrap()
        .into_iter()
        .map(|comparison| comparison.into_parts().0)
        .collect();

    assert_eq!(
        kinds,
        vec![
            DocumentComparisonKind::Same,
            DocumentComparisonKind::DifferentFields(FieldDifferences {
                missing_from_left: vec!["Owners".to_string()],
                missing_from_right: vec!["Legacy".to_string()],
                different_values: vec!["Tags".to_string()],
            }),
            DocumentComparisonKind::MissingFromRight,
            DocumentComparisonKind::MissingFromLeft,
        ]
    );
}
