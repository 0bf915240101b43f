//! Phase 6: Community detection integration tests.

mod common;

use std::collections::HashSet;

use common::*;

#[test]
fn partition_covers_every_node_once() {
    let r = run_all_phases("sample");
    assert_eq!(r.partition.node_count(), r.graph.node_count());
    let mut seen = HashSet::new();
    for members in r.partition.communities().values() {
        for m in members {
            assert!(seen.insert(*m), "node {m:?} in two communities");
        }
    }
    assert_eq!(seen.len(), r.graph.node_count());
}

#[test]
fn modularity_in_valid_range() {
    let r = run_all_phases("sample");
    assert!(r.modularity >= -0.5 && r.modularity <= 1.0);
    assert!(r.modularity > 0.3, "two separate triangles, got {}", r.modularity);
}

#[test]
fn modularity_matches_definition() {
    for fixture in ["sample", "toy"] {
        let r = run_all_phases(fixture);
        let q = reference_modularity(&r.graph, &r.partition);
        assert!(
            (q - r.modularity).abs() < 1e-9,
            "{fixture}: reported {} vs recomputed {q}",
            r.modularity
        );
    }
}

#[test]
fn sample_splits_animal_and_plant_nutrients() {
    let r = run_all_phases("sample");
    let community = |label: &str| {
        r.partition
            .community_of(r.graph.node_index(label).expect("label present"))
    };
    let animal = community("Protein");
    let plant = community("Fiber, total dietary");
    assert_ne!(animal, plant);
    assert_eq!(community("Total lipid (fat)"), animal);
    assert_eq!(community("Calcium, Ca"), animal);
    assert_eq!(community("Carbohydrate, by difference"), plant);
    assert_eq!(community("Vitamin C, total ascorbic acid"), plant);
    assert_eq!(r.partition.community_count(), 2);
}

#[test]
fn community_ids_are_dense() {
    let r = run_all_phases("sample");
    let ids: Vec<usize> = r.partition.communities().keys().copied().collect();
    assert_eq!(ids, (0..r.partition.community_count()).collect::<Vec<_>>());
}
