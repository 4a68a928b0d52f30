use delta::comparison::ComparisonKind;
use delta::error::ErrorKind;
use delta::table::memory::MemoryTable;
use delta::table::{
    EntityComparisonKind, EntityKey, EntitySource, EntitySourceOptions, RawEntity,
    compare_entities,
};
use delta::test_utils::cursor::read_all;
use delta::test_utils::faulty::FaultyClient;
use delta_telemetry::tracing::init_test_tracing;
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq)]
struct Customer {
    #[serde(rename = "PartitionKey")]
    region: String,
    #[serde(rename = "RowKey")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Debug, Deserialize, PartialEq)]
struct PremiumCustomer {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Tier")]
    tier: i32,
}

fn customer(region: &str, id: &str, name: &str) -> RawEntity {
    RawEntity::new(EntityKey::new(region, id)).with_property("Name", name)
}

async fn table(entities: Vec<RawEntity>) -> MemoryTable {
    let table = MemoryTable::new();
    for entity in entities {
        table.upsert(entity).await;
    }

    table
}

fn source<C, T>(client: C, take_count: usize) -> EntitySource<C, T>
where
    C: delta::table::TableClient + Clone,
{
    EntitySource::new(client, EntitySourceOptions::default().with_take_count(take_count)).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn subtype_columns_are_reported_as_disjoint_properties() {
    init_test_tracing();

    let left = table(vec![
        customer("eu", "1", "Ada"),
        customer("eu", "2", "Grace").with_property("Tier", 2),
    ])
    .await;
    let right = table(vec![
        customer("eu", "1", "Ada"),
        customer("eu", "2", "Grace"),
    ])
    .await;

    let left = source::<_, Customer>(left, 1);
    let right = source::<_, Customer>(right, 1);
    let comparisons = compare_entities(&left, &right).collect().await.unwrap();

    assert_eq!(comparisons.len(), 2);
    assert!(comparisons[0].kind().is_same());
    assert_eq!(
        comparisons[1].kind(),
        &EntityComparisonKind::DisjointProperties {
            missing_from_left: vec![],
            missing_from_right: vec!["Tier".to_string()],
        }
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn keys_order_by_partition_then_row() {
    init_test_tracing();

    let left = table(vec![
        customer("eu", "2", "Grace"),
        customer("us", "1", "Linus"),
        customer("eu", "10", "Barbara"),
    ])
    .await;
    let right = table(vec![
        customer("eu", "2", "Grace Hopper"),
        customer("ap", "9", "Ken"),
    ])
    .await;

    let left = source::<_, Customer>(left, 2);
    let right = source::<_, Customer>(right, 1);
    let comparisons = compare_entities(&left, &right).collect().await.unwrap();

    let summary: Vec<(EntityKey, EntityComparisonKind)> = comparisons
        .into_iter()
        .map(|comparison| {
            let (kind, left, right) = comparison.into_parts();
            let key = left.or(right).map(|entity| entity.raw().key.clone()).unwrap();
            (key, kind)
        })
        .collect();

    assert_eq!(
        summary,
        vec![
            (EntityKey::new("ap", "9"), EntityComparisonKind::MissingFromLeft),
            (EntityKey::new("eu", "10"), EntityComparisonKind::MissingFromRight),
            (
                EntityKey::new("eu", "2"),
                EntityComparisonKind::DifferentPropertyValues {
                    properties: vec!["Name".to_string()],
                }
            ),
            (EntityKey::new("us", "1"), EntityComparisonKind::MissingFromRight),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn entities_project_onto_different_types_per_side() {
    init_test_tracing();

    let entity = customer("eu", "1", "Ada").with_property("Tier", 3);
    let left = source::<_, Customer>(table(vec![entity.clone()]).await, 10);
    let right = source::<_, PremiumCustomer>(table(vec![entity]).await, 10);

    let comparisons = compare_entities(&left, &right).collect().await.unwrap();
    let (kind, left, right) = comparisons.into_iter().next().unwrap().into_parts();

    assert_eq!(kind, EntityComparisonKind::Same);
    assert_eq!(
        left.unwrap().entity().unwrap(),
        &Customer {
            region: "eu".to_string(),
            id: "1".to_string(),
            name: "Ada".to_string(),
        }
    );
    assert_eq!(
        right.unwrap().entity().unwrap(),
        &PremiumCustomer {
            name: "Ada".to_string(),
            tier: 3,
        }
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn key_bounds_skip_entities_client_side() {
    init_test_tracing();

    let table = table(
        ["a", "b", "c", "d", "e"]
            .iter()
            .map(|id| customer("p", id, id))
            .collect(),
    )
    .await;
    let options = EntitySourceOptions {
        min_key: Some(EntityKey::new("p", "b")),
        max_key: Some(EntityKey::new("p", "d")),
        ..EntitySourceOptions::default().with_take_count(2)
    };

    let entities = read_all(&EntitySource::<_, Customer>::new(table.clone(), options).unwrap())
        .await
        .unwrap();
    let ids: Vec<&str> = entities
        .iter()
        .map(|entity| entity.raw().key.row_key.as_str())
        .collect();

    assert_eq!(ids, vec!["b", "c"]);
    assert_eq!(entities[0].segment_index(), 0);
    assert_eq!(entities[0].entity_index(), 1);
    assert_eq!(entities[1].segment_index(), 1);
    assert!(entities[1].continuation().is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn query_failure_is_surfaced() {
    init_test_tracing();

    let left = table(vec![customer("eu", "1", "Ada"), customer("eu", "2", "Grace")]).await;
    let right = FaultyClient::wrap(left.clone(), 0);

    let result = compare_entities(
        &source::<_, Customer>(left, 1),
        &source::<_, Customer>(right, 1),
    )
    .collect()
    .await;

    assert_eq!(result.unwrap_err().kind(), ErrorKind::SourceQueryFailed);
}

#[test]
fn oversized_take_count_is_rejected() {
    let err = EntitySource::<_, Customer>::new(
        MemoryTable::new(),
        EntitySourceOptions::default().with_take_count(1001),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidPageSize);
}
