//! Layout Engine: tree shape → 2D positions
//!
//! Every strategy is a pure function of the node set: the same shape with the
//! same ids always yields the same coordinates, independent of insertion order
//! or of any previously computed positions.

use crate::branch::{children_index, preorder};
use crate::{Node, NodeId, Position};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet, VecDeque};

/// Which placement algorithm to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutStrategy {
    /// Pre-order listing, indented by depth
    #[default]
    DepthIndented,
    /// One row per BFS level, nodes spread evenly across the canvas
    LevelGrid,
    /// Row-major grid over the id-sorted node list, ignoring shape
    FlatGrid,
}

impl LayoutStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            LayoutStrategy::DepthIndented => "depth",
            LayoutStrategy::LevelGrid => "level",
            LayoutStrategy::FlatGrid => "flat",
        }
    }
}

/// Spacing constants for all strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    // Depth-indented
    pub base_margin: f64,
    pub horizontal_gap: f64,
    pub vertical_gap: f64,

    // Level-grid
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub vertical_spacing: f64,
    pub top_margin: f64,

    // Flat grid
    pub node_width: f64,
    pub node_height: f64,
    pub gap_x: f64,
    pub gap_y: f64,
    pub container_width: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            base_margin: 50.0,
            horizontal_gap: 200.0,
            vertical_gap: 80.0,
            canvas_width: 800.0,
            canvas_height: 600.0,
            vertical_spacing: 150.0,
            top_margin: 50.0,
            node_width: 200.0,
            node_height: 100.0,
            gap_x: 50.0,
            gap_y: 50.0,
            container_width: 800.0,
        }
    }
}

impl LayoutConfig {
    /// Fallback spot for nodes the level-grid walk cannot reach.
    pub fn canvas_center(&self) -> Position {
        Position::new(self.canvas_width / 2.0, self.canvas_height / 2.0)
    }
}

/// Compute a position for every node.
pub fn layout(
    nodes: &BTreeMap<NodeId, Node>,
    strategy: LayoutStrategy,
    config: &LayoutConfig,
) -> BTreeMap<NodeId, Position> {
    match strategy {
        LayoutStrategy::DepthIndented => depth_indented(nodes, config),
        LayoutStrategy::LevelGrid => level_grid(nodes, config),
        LayoutStrategy::FlatGrid => flat_grid(nodes, config),
    }
}

fn depth_indented(nodes: &BTreeMap<NodeId, Node>, config: &LayoutConfig) -> BTreeMap<NodeId, Position> {
    let mut y = config.base_margin;
    let mut positions = BTreeMap::new();
    for (id, depth) in preorder(nodes) {
        let x = config.base_margin + depth as f64 * config.horizontal_gap;
        positions.insert(id, Position::new(x, y));
        y += config.vertical_gap;
    }
    positions
}

fn level_grid(nodes: &BTreeMap<NodeId, Node>, config: &LayoutConfig) -> BTreeMap<NodeId, Position> {
    let children = children_index(nodes);
    let mut levels: Vec<Vec<&str>> = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();

    if let Some(root) = nodes.values().find(|n| n.is_root()) {
        let mut queue: VecDeque<(&str, usize)> = VecDeque::from([(root.id.as_str(), 0)]);
        visited.insert(root.id.as_str());
        while let Some((id, level)) = queue.pop_front() {
            if levels.len() <= level {
                levels.push(Vec::new());
            }
            levels[level].push(id);
            for &kid in children.get(id).into_iter().flatten() {
                if visited.insert(kid) {
                    queue.push_back((kid, level + 1));
                }
            }
        }
    }

    let mut positions = BTreeMap::new();
    for (level, ids) in levels.iter().enumerate() {
        let step = config.canvas_width / (ids.len() + 1) as f64;
        let y = level as f64 * config.vertical_spacing + config.top_margin;
        for (index, id) in ids.iter().enumerate() {
            positions.insert(id.to_string(), Position::new(step * (index + 1) as f64, y));
        }
    }

    let center = config.canvas_center();
    for id in nodes.keys() {
        positions.entry(id.clone()).or_insert(center);
    }
    positions
}

fn flat_grid(nodes: &BTreeMap<NodeId, Node>, config: &LayoutConfig) -> BTreeMap<NodeId, Position> {
    let cell_width = config.node_width + config.gap_x;
    let cell_height = config.node_height + config.gap_y;
    let per_row = ((config.container_width / cell_width).floor() as usize).max(1);

    nodes
        .keys()
        .enumerate()
        .map(|(index, id)| {
            let row = index / per_row;
            let col = index % per_row;
            (
                id.clone(),
                Position::new(col as f64 * cell_width, row as f64 * cell_height),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena(specs: &[(&str, Option<&str>)]) -> BTreeMap<NodeId, Node> {
        specs
            .iter()
            .map(|(id, parent)| (id.to_string(), Node::new(*id, *id, parent.map(str::to_string))))
            .collect()
    }

    fn sample() -> BTreeMap<NodeId, Node> {
        arena(&[
            ("1", None),
            ("3", Some("1")),
            ("2", Some("1")),
            ("4", Some("2")),
        ])
    }

    #[test]
    fn test_depth_indented_preorder_rows() {
        let config = LayoutConfig::default();
        let pos = layout(&sample(), LayoutStrategy::DepthIndented, &config);

        assert_eq!(pos["1"], Position::new(50.0, 50.0));
        assert_eq!(pos["2"], Position::new(250.0, 130.0));
        assert_eq!(pos["4"], Position::new(450.0, 210.0));
        assert_eq!(pos["3"], Position::new(250.0, 290.0));
    }

    #[test]
    fn test_depth_indented_orphan_is_extra_root() {
        let nodes = arena(&[("1", None), ("2", Some("gone")), ("3", Some("1"))]);
        let pos = layout(&nodes, LayoutStrategy::DepthIndented, &LayoutConfig::default());

        // Roots in id order: "1" (with child "3"), then orphan "2"
        assert_eq!(pos["1"].y, 50.0);
        assert_eq!(pos["3"].y, 130.0);
        assert_eq!(pos["2"], Position::new(50.0, 210.0));
    }

    #[test]
    fn test_level_grid_spacing() {
        let config = LayoutConfig::default();
        let pos = layout(&sample(), LayoutStrategy::LevelGrid, &config);

        assert_eq!(pos["1"], Position::new(400.0, 50.0));
        let third = 800.0 / 3.0;
        assert_eq!(pos["2"], Position::new(third, 200.0));
        assert_eq!(pos["3"], Position::new(third * 2.0, 200.0));
        assert_eq!(pos["4"], Position::new(400.0, 350.0));
    }

    #[test]
    fn test_level_grid_orphan_goes_to_center() {
        let nodes = arena(&[("1", None), ("2", Some("gone"))]);
        let config = LayoutConfig::default();
        let pos = layout(&nodes, LayoutStrategy::LevelGrid, &config);
        assert_eq!(pos["2"], config.canvas_center());
    }

    #[test]
    fn test_flat_grid_wraps_rows() {
        let nodes = arena(&[("1", None), ("2", None), ("3", None), ("4", None)]);
        let pos = layout(&nodes, LayoutStrategy::FlatGrid, &LayoutConfig::default());

        // 800 / 250 → 3 per row
        assert_eq!(pos["1"], Position::new(0.0, 0.0));
        assert_eq!(pos["3"], Position::new(500.0, 0.0));
        assert_eq!(pos["4"], Position::new(0.0, 150.0));
    }

    #[test]
    fn test_layout_ignores_insertion_order() {
        let forward = sample();
        let mut backward = BTreeMap::new();
        for (id, node) in forward.iter().rev() {
            backward.insert(id.clone(), node.clone());
        }
        for strategy in [
            LayoutStrategy::DepthIndented,
            LayoutStrategy::LevelGrid,
            LayoutStrategy::FlatGrid,
        ] {
            let config = LayoutConfig::default();
            assert_eq!(layout(&forward, strategy, &config), layout(&backward, strategy, &config));
        }
    }

    #[test]
    fn test_empty_layout() {
        let pos = layout(&BTreeMap::new(), LayoutStrategy::LevelGrid, &LayoutConfig::default());
        assert!(pos.is_empty());
    }
}
