use std::sync::Arc;

use delta::blob::memory::MemoryBlobContainer;
use delta::error::ErrorKind;
use delta::prefix_tree::{Depth, PrefixNode, PrefixTreeBuilder};
use delta::test_utils::blob::{blob_names_at, container_with_blobs};
use delta::test_utils::faulty::FaultyClient;
use delta::test_utils::tree::{child_partial_prefixes, child_prefixes, flatten_tree, leaves};
use delta_config::shared::PrefixTreeConfig;
use delta_telemetry::tracing::init_test_tracing;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn builder(worker_count: usize) -> PrefixTreeBuilder {
    PrefixTreeBuilder::new(PrefixTreeConfig::with_worker_count(worker_count)).unwrap()
}

async fn one_level(container: &MemoryBlobContainer, prefix: &str) -> Arc<PrefixNode> {
    builder(4)
        .enumerate_leading_characters(container, prefix, Depth::Levels(1))
        .await
        .unwrap()
}

async fn assert_blob_names_at(
    container: &MemoryBlobContainer,
    node: &PrefixNode,
    expected: &[&str],
) {
    let names = blob_names_at(container, node, expected.len()).await.unwrap();
    assert_eq!(names, expected, "names at '{}'", node.prefix());
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_initial_prefix() {
    init_test_tracing();
    let container = container_with_blobs(&["a1", "a2", "b1", "b2"]).await;

    let tree = one_level(&container, "").await;

    assert_eq!(tree.prefix(), "");
    assert_eq!(child_prefixes(&tree), vec!["a", "b"]);
    let children = tree.children();
    assert_blob_names_at(&container, &children[0], &["a1", "a2", "b1", "b2"]).await;
    assert_blob_names_at(&container, &children[1], &["b1", "b2"]).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn delimiter_in_next_blob_name() {
    init_test_tracing();
    let container = container_with_blobs(&["a1", "a2", "ba1", "ba2", "bb"]).await;

    let tree = one_level(&container, "").await;

    assert_eq!(child_prefixes(&tree), vec!["a", "b"]);
    let children = tree.children();
    assert_blob_names_at(&container, &children[0], &["a1", "a2", "ba1", "ba2", "bb"]).await;
    assert_blob_names_at(&container, &children[1], &["ba1", "ba2", "bb"]).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn non_empty_initial_prefix() {
    init_test_tracing();
    let container = container_with_blobs(&["a1", "ba1", "ba2", "bb", "ca", "cb"]).await;

    let tree = one_level(&container, "b").await;

    assert_eq!(tree.prefix(), "b");
    assert_eq!(child_prefixes(&tree), vec!["ba", "bb"]);
    let children = tree.children();
    assert_blob_names_at(&container, &children[0], &["ba1", "ba2", "bb"]).await;
    assert_blob_names_at(&container, &children[1], &["bb"]).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn blob_name_matching_prefix() {
    init_test_tracing();
    let container = container_with_blobs(&["a", "b", "ba", "bb", "c"]).await;

    let tree = one_level(&container, "b").await;

    assert!(tree.is_blob());
    assert_eq!(child_partial_prefixes(&tree), vec!["", "a", "b"]);
    assert_eq!(child_prefixes(&tree), vec!["b", "ba", "bb"]);

    let children = tree.children();
    assert!(children[0].is_blob());
    assert!(children[0].is_enumerated());
    assert!(children[0].token().is_none());
    assert_blob_names_at(&container, &children[0], &["b", "ba", "bb"]).await;
    assert_blob_names_at(&container, &children[1], &["ba", "bb"]).await;
    assert_blob_names_at(&container, &children[2], &["bb"]).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn single_blob_in_prefix() {
    init_test_tracing();
    let container = container_with_blobs(&["a", "cc", "eee", "g", "hhhh"]).await;

    let tree = one_level(&container, "e").await;

    assert_eq!(child_prefixes(&tree), vec!["ee"]);
    assert_blob_names_at(&container, &tree.children()[0], &["eee"]).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_namespace_yields_an_enumerated_childless_root() {
    init_test_tracing();

    let empty = MemoryBlobContainer::new();
    let populated = container_with_blobs(&["a", "cc"]).await;

    for (container, prefix) in [(&empty, ""), (&empty, "a"), (&populated, "b")] {
        let tree = builder(2)
            .enumerate_leading_characters(container, prefix, Depth::Unbounded)
            .await
            .unwrap();

        assert_eq!(tree.prefix(), prefix);
        assert!(tree.is_enumerated());
        assert_eq!(tree.child_count(), 0);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn non_surrogate_non_ascii_characters() {
    init_test_tracing();
    let container = container_with_blobs(&["a", "ba", "b¥", "b♾a", "b惡aa", "c"]).await;

    let tree = one_level(&container, "b").await;

    assert_eq!(child_prefixes(&tree), vec!["ba", "b¥", "b♾", "b惡"]);
    let children = tree.children();
    assert_blob_names_at(&container, &children[0], &["ba", "b¥", "b♾a", "b惡aa"]).await;
    assert_blob_names_at(&container, &children[1], &["b¥", "b♾a", "b惡aa"]).await;
    assert_blob_names_at(&container, &children[2], &["b♾a", "b惡aa"]).await;
    assert_blob_names_at(&container, &children[3], &["b惡aa"]).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn supplementary_characters_are_single_children() {
    init_test_tracing();
    let container =
        container_with_blobs(&["a", "ba", "b¥", "b𐐷a", "b😃", "b𤭢aa", "c"]).await;

    let tree = one_level(&container, "b").await;

    assert_eq!(
        child_partial_prefixes(&tree),
        vec!["a", "¥", "𐐷", "😃", "𤭢"]
    );
    let children = tree.children();
    assert_blob_names_at(&container, &children[2], &["b𐐷a", "b😃", "b𤭢aa"]).await;
    assert_blob_names_at(&container, &children[3], &["b😃", "b𤭢aa"]).await;
    assert_blob_names_at(&container, &children[4], &["b𤭢aa"]).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn supplementary_character_prefix() {
    init_test_tracing();
    let container = container_with_blobs(&[
        "a", "c", "😃", "😃a", "😃¥", "😃𐐷a", "😃😃😃", "😃𤭢aa", "𤭢",
    ])
    .await;

    let tree = one_level(&container, "😃").await;

    assert!(tree.is_blob());
    assert_eq!(
        child_prefixes(&tree),
        vec!["😃", "😃a", "😃¥", "😃𐐷", "😃😃", "😃𤭢"]
    );
    let children = tree.children();
    assert_blob_names_at(
        &container,
        &children[0],
        &["😃", "😃a", "😃¥", "😃𐐷a", "😃😃😃", "😃𤭢aa"],
    )
    .await;
    assert_blob_names_at(&container, &children[4], &["😃😃😃", "😃𤭢aa"]).await;
    assert_blob_names_at(&container, &children[5], &["😃𤭢aa"]).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn non_surrogate_non_ascii_prefix() {
    init_test_tracing();
    let container = container_with_blobs(&["a", "¥", "¥a", "¥bb", "😃"]).await;

    let tree = one_level(&container, "¥").await;

    assert_eq!(child_prefixes(&tree), vec!["¥", "¥a", "¥b"]);
    let children = tree.children();
    assert_blob_names_at(&container, &children[0], &["¥", "¥a", "¥bb"]).await;
    assert_blob_names_at(&container, &children[1], &["¥a", "¥bb"]).await;
    assert_blob_names_at(&container, &children[2], &["¥bb"]).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn allows_drill_down() {
    init_test_tracing();
    let container = container_with_blobs(&[
        "AAAA", "AAAB", "AAA", "AAB", "AAC", "ABA", "ABC", "BAA", "BCC", "CAA",
    ])
    .await;
    let builder = builder(4);

    let root = builder
        .enumerate_leading_characters(&container, "", Depth::Levels(1))
        .await
        .unwrap();
    let node_a = builder
        .enumerate_node(&container, root.children()[0].clone(), Depth::Levels(1))
        .await
        .unwrap();
    let node_aa = builder
        .enumerate_node(&container, node_a.children()[0].clone(), Depth::Levels(1))
        .await
        .unwrap();
    let node_aaa = builder
        .enumerate_node(&container, node_aa.children()[0].clone(), Depth::Levels(1))
        .await
        .unwrap();
    let node_aaaa = builder
        .enumerate_node(&container, node_aaa.children()[1].clone(), Depth::Levels(1))
        .await
        .unwrap();

    assert_eq!(child_partial_prefixes(&root), vec!["A", "B", "C"]);
    assert_eq!(child_partial_prefixes(&node_a), vec!["A", "B"]);
    assert_eq!(child_partial_prefixes(&node_aa), vec!["A", "B", "C"]);
    assert_eq!(child_partial_prefixes(&node_aaa), vec!["", "A", "B"]);
    assert_eq!(child_partial_prefixes(&node_aaaa), vec![""]);
    assert_eq!(node_aaaa.prefix(), "AAAA");
    assert!(Arc::ptr_eq(&node_aaaa.parent().unwrap(), &node_aaa));

    // Drilling down only expanded the visited path.
    assert!(!root.children()[1].is_enumerated());
}

#[tokio::test(flavor = "multi_thread")]
async fn depth_limits_expansion() {
    init_test_tracing();
    let container = container_with_blobs(&["aa1", "ab1", "ba1", "bb1"]).await;

    let tree = builder(3)
        .enumerate_leading_characters(&container, "", Depth::Levels(2))
        .await
        .unwrap();

    assert_eq!(child_prefixes(&tree), vec!["a", "b"]);
    for child in tree.children() {
        assert!(child.is_enumerated());
        assert_eq!(child.child_count(), 2);
        assert!(child.children().iter().all(|grandchild| !grandchild.is_enumerated()));
    }
}

fn random_names(seed: u64, count: usize) -> Vec<String> {
    let alphabet = ['a', 'b', 'c', '¥', '😃'];
    let mut rng = StdRng::seed_from_u64(seed);

    (0..count)
        .map(|_| {
            let length = rng.gen_range(1..=4);
            (0..length)
                .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
                .collect()
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn full_enumeration_is_worker_count_invariant() {
    init_test_tracing();

    let names = random_names(17, 60);
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let container = container_with_blobs(&names).await;

    let mut trees = Vec::new();
    for worker_count in [1, 2, 8, 32] {
        let tree = builder(worker_count)
            .enumerate_leading_characters(&container, "", Depth::Unbounded)
            .await
            .unwrap();

        for leaf in leaves(&tree) {
            assert!(leaf.is_enumerated(), "leaf '{}'", leaf.prefix());
            assert!(leaf.is_blob(), "leaf '{}'", leaf.prefix());
        }

        trees.push(flatten_tree(&tree));
    }

    for tree in &trees[1..] {
        assert_eq!(tree, &trees[0]);
    }

    // Every stored name is an exact-match leaf of the tree.
    let mut leaf_prefixes: Vec<String> = trees[0]
        .iter()
        .filter(|node| node.child_count == 0)
        .map(|node| node.prefix.clone())
        .collect();
    leaf_prefixes.sort();
    let mut expected = container.blob_names().await;
    expected.sort();
    assert_eq!(leaf_prefixes, expected);
}

#[tokio::test(flavor = "multi_thread")]
async fn listing_failure_aborts_the_build() {
    init_test_tracing();

    let names = random_names(3, 40);
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let client = FaultyClient::wrap(container_with_blobs(&names).await, 5);

    let err = builder(4)
        .enumerate_leading_characters(&client, "", Depth::Unbounded)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SourceQueryFailed);
}
