use delta::blob::memory::MemoryBlobContainer;
use delta::blob::{
    BlobComparisonKind, BlobKind, BlobSource, BlobSourceOptions, compare_blobs,
};
use delta::comparison::ComparisonKind;
use delta::error::ErrorKind;
use delta::test_utils::blob::container_with_blobs;
use delta::test_utils::cursor::read_all;
use delta::test_utils::faulty::FaultyClient;
use delta_telemetry::tracing::init_test_tracing;
use futures::TryStreamExt;

async fn container_with_contents(blobs: &[(&str, &str)]) -> MemoryBlobContainer {
    let container = MemoryBlobContainer::new();
    for (name, content) in blobs {
        container.put_block_blob(*name, content.as_bytes()).await;
    }

    container
}

fn source<C>(client: C, page_size: usize) -> BlobSource<C>
where
    C: delta::blob::BlobContainerClient + Clone,
{
    BlobSource::new(client, BlobSourceOptions::default().with_page_size(page_size)).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn blob_missing_from_one_side_is_reported_between_matches() {
    init_test_tracing();

    let left = container_with_contents(&[("a", "0"), ("b", "1"), ("c", "2")]).await;
    let right = container_with_contents(&[("a", "0"), ("c", "2")]).await;

    let comparisons = compare_blobs(&source(left, 1), &source(right, 1))
        .collect()
        .await
        .unwrap();

    let summary: Vec<(String, BlobComparisonKind)> = comparisons
        .iter()
        .map(|comparison| {
            let name = comparison
                .left()
                .or(comparison.right())
                .map(|blob| blob.item.name.clone())
                .unwrap();
            (name, *comparison.kind())
        })
        .collect();

    assert_eq!(
        summary,
        vec![
            ("a".to_string(), BlobComparisonKind::Same),
            ("b".to_string(), BlobComparisonKind::MissingFromRight),
            ("c".to_string(), BlobComparisonKind::Same),
        ]
    );
    assert!(comparisons[1].right().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn content_and_type_differences_are_classified() {
    init_test_tracing();

    let left = container_with_contents(&[("changed", "old"), ("resized", "12")]).await;
    left.put_blob("append", BlobKind::Append, "x", None).await;
    left.put_blob("kind", BlobKind::Block, "x", None).await;
    left.put_blob("no-digest", BlobKind::Block, "x", None).await;

    let right = container_with_contents(&[("changed", "new"), ("resized", "123")]).await;
    right.put_blob("append", BlobKind::Append, "x", None).await;
    right.put_blob("kind", BlobKind::Page, "x", None).await;
    right.put_block_blob("no-digest", "x").await;

    let kinds: Vec<BlobComparisonKind> = compare_blobs(&source(left, 2), &source(right, 3))
        .into_stream()
        .map_ok(|comparison| *comparison.kind())
        .try_collect()
        .await
        .unwrap();

    assert_eq!(
        kinds,
        vec![
            BlobComparisonKind::UnsupportedBlobType,
            BlobComparisonKind::DifferentContent,
            BlobComparisonKind::DifferentBlobType,
            BlobComparisonKind::MissingContentDigest,
            BlobComparisonKind::DifferentContent,
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn rerunning_a_comparison_yields_the_same_records() {
    init_test_tracing();

    let left = container_with_blobs(&["a", "b", "d", "f"]).await;
    let right = container_with_blobs(&["b", "c", "d", "e", "g"]).await;
    let left = source(left, 2);
    let right = source(right, 3);

    let first = compare_blobs(&left, &right).collect().await.unwrap();
    let second = compare_blobs(&left, &right).collect().await.unwrap();

    let kinds: Vec<_> = first.iter().map(|comparison| *comparison.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            BlobComparisonKind::MissingFromRight,
            BlobComparisonKind::Same,
            BlobComparisonKind::MissingFromLeft,
            BlobComparisonKind::Same,
            BlobComparisonKind::MissingFromLeft,
            BlobComparisonKind::MissingFromRight,
            BlobComparisonKind::MissingFromLeft,
        ]
    );
    assert_eq!(first, second);
    assert_eq!(first.iter().filter(|c| c.kind().is_same()).count(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn bounds_and_prefix_limit_the_listing() {
    init_test_tracing();

    let container = container_with_blobs(&["a1", "b1", "b2", "b3", "b4", "c1"]).await;
    let options = BlobSourceOptions {
        min_name: Some("b2".to_string()),
        max_name: Some("b4".to_string()),
        ..BlobSourceOptions::default().with_prefix("b").with_page_size(1)
    };

    let blobs = read_all(&BlobSource::new(container, options).unwrap())
        .await
        .unwrap();
    let names: Vec<&str> = blobs.iter().map(|blob| blob.item.name.as_str()).collect();

    assert_eq!(names, vec!["b2", "b3"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn listing_failure_ends_the_comparison() {
    init_test_tracing();

    let left = container_with_blobs(&["a", "b", "c", "d"]).await;
    let right = FaultyClient::wrap(container_with_blobs(&["a", "b", "c", "d"]).await, 2);

    let mut merger = compare_blobs(&source(left, 1), &source(right, 1));

    let mut same = 0;
    let err = loop {
        match merger.next().await {
            Ok(Some(comparison)) => {
                assert!(comparison.kind().is_same());
                same += 1;
            }
            Ok(None) => panic!("the comparison should fail"),
            Err(err) => break err,
        }
    };

    assert_eq!(err.kind(), ErrorKind::SourceQueryFailed);
    assert_eq!(same, 2);
    assert_eq!(
        merger.next().await.unwrap_err().kind(),
        ErrorKind::InvalidState
    );
}

#[test]
fn oversized_page_is_rejected_at_construction() {
    let err = BlobSource::new(
        MemoryBlobContainer::new(),
        BlobSourceOptions::default().with_page_size(5001),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidPageSize);
}
