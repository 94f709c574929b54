//! Integration tests for the complete mind map pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - NodeStore → Prompt → Generator → Tracker → NodeStore
//! - Idea list → Structured response → Sanitizer → MindMap
//! - MindMap → JSON file → MindMap
//!
//! Run with: cargo test --test integration_tests

use mindmap_core::{load_from_path, save_to_path, LayoutConfig, LayoutStrategy, MindMap};
use mindmap_suggest::{
    DiscardReason, IdeaBoard, MockGenerator, OrganizeVariant, Suggester, SuggestionOutcome,
    SuggestionTracker,
};
use tempfile::tempdir;

// ============================================================================
// Branch suggestions
// ============================================================================

#[tokio::test]
async fn test_branch_suggestion_round_trip() {
    let mut map = MindMap::new();
    let root = map.add_root("Vietnamese food").unwrap();
    let noodles = map.add_child(&root, "Noodles").unwrap();
    map.add_child(&noodles, "Phở").unwrap();

    let suggester = Suggester::new(MockGenerator::always(
        "Here are some ideas:\n1. **Bún bò Huế**\n2. **Phở** (already there)\n3. **Mì Quảng**",
    ));
    let mut tracker = SuggestionTracker::new();

    let (ticket, prompt) = tracker.begin(&map, &noodles).unwrap();
    assert!(prompt.contains("Selected branch: Vietnamese food > Noodles"));
    assert!(prompt.contains("    - Phở"));

    let candidates = suggester.request_children(&prompt).await;
    let outcome = tracker.apply(&mut map, &ticket, &candidates).unwrap();
    let SuggestionOutcome::Applied(created) = outcome else {
        panic!("expected suggestions to be applied");
    };
    assert_eq!(created.len(), 2);

    let mut labels: Vec<&str> = map
        .children(&noodles)
        .iter()
        .map(|n| n.label.as_str())
        .collect();
    labels.sort_unstable();
    assert_eq!(labels, vec!["Bún bò Huế", "Mì Quảng", "Phở"]);
    assert_eq!(map.edges().len(), map.len() - 1);

    let sent = suggester.generator().prompts();
    assert_eq!(sent, vec![prompt]);
}

#[tokio::test]
async fn test_late_response_after_delete_is_ignored() {
    let mut map = MindMap::new();
    let root = map.add_root("Trip").unwrap();
    let day = map.add_child(&root, "Day one").unwrap();
    map.select(&day).unwrap();

    let suggester = Suggester::new(MockGenerator::always("**Museum** **Market**"));
    let mut tracker = SuggestionTracker::new();
    let (ticket, prompt) = tracker.begin(&map, &day).unwrap();

    // The user deletes the branch while the request is in flight
    map.delete_subtree(&day).unwrap();
    assert_eq!(map.selected(), None);

    let candidates = suggester.request_children(&prompt).await;
    assert_eq!(candidates.len(), 2);
    let outcome = tracker.apply(&mut map, &ticket, &candidates).unwrap();
    assert_eq!(outcome, SuggestionOutcome::Discarded(DiscardReason::NodeGone));
    assert_eq!(map.len(), 1);
}

#[tokio::test]
async fn test_network_failure_leaves_map_untouched() {
    let mut map = MindMap::new();
    let root = map.add_root("Trip").unwrap();
    let before = mindmap_core::save(&map).unwrap();

    let suggester = Suggester::new(MockGenerator::new(vec![]).then_fail("dns failure"));
    let mut tracker = SuggestionTracker::new();
    let (ticket, prompt) = tracker.begin(&map, &root).unwrap();

    let candidates = suggester.request_children(&prompt).await;
    assert!(candidates.is_empty());
    let outcome = tracker.apply(&mut map, &ticket, &candidates).unwrap();
    assert_eq!(outcome, SuggestionOutcome::Applied(vec![]));
    assert_eq!(mindmap_core::save(&map).unwrap(), before);
}

// ============================================================================
// Reorganization
// ============================================================================

#[tokio::test]
async fn test_reorganize_sanitizes_and_persists() {
    let response = r#"```json
{
  "suggestions": ["Chè", "Cà phê sữa đá"],
  "organization": {
    "entities": [
      {"id": "food", "label": "Food"},
      {"id": "sweet", "label": "Desserts"},
      {"id": "savory", "label": "Savory"},
      {"id": "pho", "label": "Phở"},
      {"id": "drinks", "label": "Drinks"}
    ],
    "relationships": [
      {"id": "r1", "source": "food", "target": "sweet", "label": "includes"},
      {"id": "r2", "source": "food", "target": "savory", "label": "includes"},
      {"id": "r3", "source": "savory", "target": "pho", "label": "example"},
      {"id": "r4", "source": "sweet", "target": "pho", "label": "example"},
      {"id": "r5", "source": "pho", "target": "pho"},
      {"id": "r6", "source": "pho", "target": "food"}
    ]
  }
}
```"#;

    let mut board = IdeaBoard::from_ideas(["Phở", "Chè", "Trà đá"]);
    let suggester = Suggester::new(MockGenerator::always(response));
    let map = board
        .reorganize(
            &suggester,
            OrganizeVariant::Organization,
            LayoutStrategy::LevelGrid,
            &LayoutConfig::default(),
        )
        .await;

    assert_eq!(map.len(), 5);
    assert_eq!(map.roots().len(), 1);
    assert_eq!(map.roots()[0].id, "food");
    // Every non-root node has exactly one incoming edge
    for node in map.nodes().filter(|n| !n.is_root()) {
        assert_eq!(map.edges().iter().filter(|e| e.target == node.id).count(), 1);
    }
    assert_eq!(map.node("pho").unwrap().parent_id.as_deref(), Some("savory"));
    assert_eq!(map.node("drinks").unwrap().parent_id.as_deref(), Some("food"));
    assert_eq!(board.suggestions().len(), 2);

    let dir = tempdir().unwrap();
    let path = dir.path().join("organized.json");
    save_to_path(&map, &path).unwrap();

    let mut reloaded = MindMap::with_layout(LayoutStrategy::LevelGrid, Default::default());
    load_from_path(&mut reloaded, &path).unwrap();
    assert_eq!(reloaded.tree_dump(), map.tree_dump());
    assert_eq!(reloaded.edges(), map.edges());
    assert_eq!(
        reloaded.node("pho").unwrap().position,
        map.node("pho").unwrap().position
    );
}
