//! Property-Based Tests for the mind-map engine
//!
//! 1. Edge invariants hold for every tree built through the store
//! 2. Subtree deletion removes exactly the subtree
//! 3. Layout is deterministic on shape
//! 4. Save/load preserves ids, labels and parent links
//! 5. Sanitized imports are single-rooted forests without loops

use mindmap_core::{
    layout, sanitize_connections, save, Connection, Entity, EntityGraph, LayoutConfig,
    LayoutStrategy, MindMap, NodeId,
};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

// ============================================================================
// Strategies
// ============================================================================

/// Parent index for every node after the first (`parents[i - 1] < i`).
fn tree_shape_strategy() -> impl Strategy<Value = Vec<usize>> {
    (0usize..24).prop_flat_map(|extra| {
        (1..=extra)
            .map(|i| (0..i).boxed())
            .collect::<Vec<_>>()
    })
}

fn label_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][a-z ]{0,12}".prop_map(|s| s.trim().to_string())
}

fn build(parents: &[usize]) -> (MindMap, Vec<NodeId>) {
    let mut map = MindMap::new();
    let mut ids = vec![map.add_root("Root").unwrap()];
    for (i, parent) in parents.iter().enumerate() {
        let id = map
            .add_child(&ids[*parent], &format!("Idea {}", i + 1))
            .unwrap();
        ids.push(id);
    }
    (map, ids)
}

fn connection_strategy() -> impl Strategy<Value = Vec<Connection>> {
    prop::collection::vec((0u8..8, 0u8..8), 0..20).prop_map(|pairs| {
        pairs
            .into_iter()
            .enumerate()
            .map(|(i, (s, t))| Connection::new(format!("c{i}"), s.to_string(), t.to_string()))
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn every_non_root_has_exactly_one_incoming_edge(parents in tree_shape_strategy()) {
        let (map, _) = build(&parents);
        let mut incoming: HashMap<&str, usize> = HashMap::new();
        for edge in map.edges() {
            prop_assert_ne!(&edge.source, &edge.target);
            *incoming.entry(edge.target.as_str()).or_default() += 1;
        }
        for node in map.nodes() {
            let expected = if node.is_root() { 0 } else { 1 };
            prop_assert_eq!(incoming.get(node.id.as_str()).copied().unwrap_or(0), expected);
        }
    }

    #[test]
    fn delete_subtree_removes_exactly_the_subtree(
        parents in tree_shape_strategy(),
        pick in any::<prop::sample::Index>(),
    ) {
        let (mut map, ids) = build(&parents);
        let victim = pick.index(ids.len());

        // Expected subtree from the parent vector alone
        let mut expected: HashSet<usize> = HashSet::from([victim]);
        for (i, parent) in parents.iter().enumerate() {
            if expected.contains(parent) {
                expected.insert(i + 1);
            }
        }

        let removed: HashSet<NodeId> = map.delete_subtree(&ids[victim]).unwrap().into_iter().collect();
        let expected_ids: HashSet<NodeId> = expected.iter().map(|i| ids[*i].clone()).collect();
        prop_assert_eq!(&removed, &expected_ids);

        prop_assert_eq!(map.len(), ids.len() - expected.len());
        for edge in map.edges() {
            prop_assert!(!removed.contains(&edge.source));
            prop_assert!(!removed.contains(&edge.target));
        }
    }

    #[test]
    fn layout_is_deterministic_on_shape(parents in tree_shape_strategy()) {
        let (map, _) = build(&parents);
        for strategy in [LayoutStrategy::DepthIndented, LayoutStrategy::LevelGrid, LayoutStrategy::FlatGrid] {
            let config = LayoutConfig::default();
            let first = layout(map.node_map(), strategy, &config);
            let second = layout(map.node_map(), strategy, &config);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.len(), map.len());
        }
    }

    #[test]
    fn depth_indented_rows_never_overlap(parents in tree_shape_strategy()) {
        let (map, _) = build(&parents);
        let rows: HashSet<i64> = map.nodes().map(|n| n.position.y as i64).collect();
        prop_assert_eq!(rows.len(), map.len());
    }

    #[test]
    fn save_load_preserves_structure(parents in tree_shape_strategy(), label in label_strategy()) {
        let (mut map, ids) = build(&parents);
        if !label.is_empty() {
            map.edit_label(&ids[0], &label).unwrap();
        }
        let json = save(&map).unwrap();

        let mut restored = MindMap::new();
        restored.load(&json).unwrap();
        prop_assert_eq!(restored.len(), map.len());
        for node in map.nodes() {
            let other = restored.node(&node.id).unwrap();
            prop_assert_eq!(&other.label, &node.label);
            prop_assert_eq!(&other.parent_id, &node.parent_id);
            prop_assert_eq!(other.position, node.position);
        }
    }

    #[test]
    fn sanitized_connections_form_a_forest(conns in connection_strategy()) {
        let accepted = sanitize_connections(&conns);
        let mut parent_of: HashMap<&str, &str> = HashMap::new();
        for c in &accepted {
            prop_assert_ne!(&c.source, &c.target);
            prop_assert!(parent_of.insert(c.target.as_str(), c.source.as_str()).is_none());
        }
        // Walking up from any node terminates without revisiting
        for start in parent_of.keys() {
            let mut seen = HashSet::new();
            let mut current = *start;
            while let Some(parent) = parent_of.get(current) {
                prop_assert!(seen.insert(current));
                current = *parent;
            }
        }
    }

    #[test]
    fn imported_graph_has_single_root(conns in connection_strategy()) {
        let entities: Vec<Entity> = (0u8..8).map(|i| Entity::new(i.to_string(), format!("E{i}"))).collect();
        let map = MindMap::from_entity_graph(
            &EntityGraph { entities, connections: conns },
            LayoutStrategy::LevelGrid,
            &LayoutConfig::default(),
        );
        prop_assert_eq!(map.len(), 8);
        prop_assert_eq!(map.roots().len(), 1);
        prop_assert_eq!(map.edges().len(), 7);
    }
}
