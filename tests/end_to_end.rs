//! End-to-end scenarios spanning multiple shards, exercised through the
//! peered API the way an HTTP handler or the scripting sandbox would use
//! it.

use ragedb::admin;
use ragedb::config::ShardConfig;
use ragedb::group::Direction;
use ragedb::peered::{all, filter, nodes, relationships};
use ragedb::property::{Kind, Operator, Sort, Value};
use ragedb::Cluster;

fn reset() {
    ragedb::types::reset_for_test();
}

#[tokio::test]
async fn same_shard_rel_add_and_get() {
    reset();
    let cluster = Cluster::new(&ShardConfig {
        shards: 1,
        ..ShardConfig::default()
    });

    let a = nodes::add(&cluster, "Node", "a", None).await.unwrap();
    let b = nodes::add(&cluster, "Node", "b", None).await.unwrap();

    let rel = relationships::add(
        &cluster,
        "KNOWS",
        a,
        b,
        Some(serde_json::json!({ "since": 2020 })),
    )
    .await
    .unwrap();
    assert_ne!(rel, ragedb::id::INVALID);

    let fetched = relationships::get(&cluster, rel).await.unwrap();
    assert_eq!(fetched.starting_id, a);
    assert_eq!(fetched.ending_id, b);
    assert_eq!(fetched.properties.get("since").unwrap(), 2020);

    let out_degree = nodes::get_degree(&cluster, a, Direction::Out, None).await.unwrap();
    let in_degree = nodes::get_degree(&cluster, b, Direction::In, None).await.unwrap();
    assert_eq!(out_degree, 1);
    assert_eq!(in_degree, 1);
}

#[tokio::test]
async fn cross_shard_rel_add_and_remove() {
    reset();
    let cluster = Cluster::new(&ShardConfig {
        shards: 4,
        ..ShardConfig::default()
    });

    // Find keys landing on shard 0 and shard 2 respectively.
    let find_key_on = |shard: u16| {
        (0..10_000)
            .map(|i| format!("n{i}"))
            .find(|k| ragedb::id::owning_shard_for("Node", k, 4) == shard)
            .expect("a key landing on the requested shard")
    };
    let x_key = find_key_on(0);
    let y_key = find_key_on(2);

    let x = nodes::add(&cluster, "Node", &x_key, None).await.unwrap();
    let y = nodes::add(&cluster, "Node", &y_key, None).await.unwrap();
    assert_eq!(ragedb::id::shard_of(x), 0);
    assert_eq!(ragedb::id::shard_of(y), 2);

    let rel = relationships::add(&cluster, "KNOWS", x, y, None).await.unwrap();
    assert_ne!(rel, ragedb::id::INVALID);

    let out_links = ragedb::peered::neighbors::relationship_ids(&cluster, x, Direction::Out, None)
        .await
        .unwrap();
    assert!(out_links.iter().any(|l| l.node_id == y && l.rel_id == rel));

    let in_links = ragedb::peered::neighbors::relationship_ids(&cluster, y, Direction::In, None)
        .await
        .unwrap();
    assert!(in_links.iter().any(|l| l.node_id == x && l.rel_id == rel));

    assert!(relationships::remove(&cluster, rel).await.unwrap());

    let out_links = ragedb::peered::neighbors::relationship_ids(&cluster, x, Direction::Out, None)
        .await
        .unwrap();
    assert!(out_links.is_empty());
    let in_links = ragedb::peered::neighbors::relationship_ids(&cluster, y, Direction::In, None)
        .await
        .unwrap();
    assert!(in_links.is_empty());
}

#[tokio::test]
async fn node_removal_cascade() {
    reset();
    let cluster = Cluster::new(&ShardConfig {
        shards: 1,
        ..ShardConfig::default()
    });

    let a = nodes::add(&cluster, "Node", "a", None).await.unwrap();
    let b = nodes::add(&cluster, "Node", "b", None).await.unwrap();
    let c = nodes::add(&cluster, "Node", "c", None).await.unwrap();

    relationships::add(&cluster, "KNOWS", a, b, None).await.unwrap();
    relationships::add(&cluster, "KNOWS", a, c, None).await.unwrap();
    relationships::add(&cluster, "KNOWS", b, a, None).await.unwrap();

    assert!(nodes::remove(&cluster, a).await.unwrap());
    assert!(nodes::get(&cluster, a).await.unwrap().is_empty());

    let b_in = nodes::get_degree(&cluster, b, Direction::In, None).await.unwrap();
    let c_in = nodes::get_degree(&cluster, c, Direction::In, None).await.unwrap();
    assert_eq!(b_in, 0);
    assert_eq!(c_in, 0);

    let rel_count = all::relationship_count(&cluster, "KNOWS").await.unwrap();
    assert_eq!(rel_count, 0);
}

#[tokio::test]
async fn filter_with_intersection() {
    reset();
    let cluster = Cluster::new(&ShardConfig {
        shards: 4,
        ..ShardConfig::default()
    });

    let type_id = admin::register_node_type("Person");
    admin::register_node_property(type_id, "age", Kind::I64).unwrap();

    let mut ids = Vec::with_capacity(1000);
    for age in 0..1000 {
        let id = nodes::add(
            &cluster,
            "Person",
            &format!("p{age}"),
            Some(serde_json::json!({ "age": age })),
        )
        .await
        .unwrap();
        ids.push(id);
    }

    let gt500 = filter::ids_nodes(
        &cluster,
        &ids,
        "Person",
        "age",
        Operator::Gt,
        Value::I64(500),
        0,
        usize::MAX,
        Sort::Ascending,
    )
    .await
    .unwrap();
    assert_eq!(gt500.len(), 499);

    let lt600 = filter::ids_nodes(
        &cluster,
        &ids,
        "Person",
        "age",
        Operator::Lt,
        Value::I64(600),
        0,
        usize::MAX,
        Sort::Ascending,
    )
    .await
    .unwrap();
    assert_eq!(lt600.len(), 600);

    let mut gt500_sorted = gt500.clone();
    gt500_sorted.sort_unstable();
    let mut lt600_sorted = lt600.clone();
    lt600_sorted.sort_unstable();
    let intersection = filter::intersect(&gt500_sorted, &lt600_sorted);
    assert_eq!(intersection.len(), 99);
}

#[tokio::test]
async fn pagination_is_stable_across_shards() {
    reset();
    let shards = 4;
    let cluster = Cluster::new(&ShardConfig {
        shards,
        ..ShardConfig::default()
    });

    for i in 0..2000 {
        nodes::add(&cluster, "Person", &format!("p{i}"), None).await.unwrap();
    }

    let combined = all::all_nodes(&cluster, "Person", 0, 2000).await.unwrap();
    assert_eq!(combined.len(), 2000);

    let first_half = all::all_nodes(&cluster, "Person", 0, 1000).await.unwrap();
    let second_half = all::all_nodes(&cluster, "Person", 1000, 1000).await.unwrap();
    let mut concatenated = first_half;
    concatenated.extend(second_half);

    let combined_ids: Vec<u64> = combined.iter().map(|n| n.id).collect();
    let concatenated_ids: Vec<u64> = concatenated.iter().map(|n| n.id).collect();
    assert_eq!(combined_ids, concatenated_ids);

    let past_the_end = all::all_nodes(&cluster, "Person", 5000, 10).await.unwrap();
    assert!(past_the_end.is_empty());
}

#[tokio::test]
async fn schema_conflict_on_redeclared_property() {
    reset();
    let type_id = admin::register_node_type("Person");
    admin::register_node_property(type_id, "age", Kind::I64).unwrap();

    let err = admin::register_node_property(type_id, "age", Kind::String).unwrap_err();
    assert!(matches!(
        err,
        ragedb::Error::Property(ragedb::property::Error::Conflict { .. })
    ));

    let cluster = Cluster::new(&ShardConfig {
        shards: 1,
        ..ShardConfig::default()
    });
    let id = nodes::add(
        &cluster,
        "Person",
        "still-i64",
        Some(serde_json::json!({ "age": 42 })),
    )
    .await
    .unwrap();
    let node = nodes::get(&cluster, id).await.unwrap();
    assert_eq!(node.properties.get("age").unwrap(), 42);
}
