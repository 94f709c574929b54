//! Node Store: the single owner of every node and edge
//!
//! Every mutating operation re-runs the configured layout before returning,
//! so callers never observe a node set whose positions are stale.

use crate::branch::{self, children_index};
use crate::ids::IdGenerator;
use crate::layout::{layout, LayoutConfig, LayoutStrategy};
use crate::sanitize::{import_entity_graph, EntityGraph, ImportedGraph};
use crate::{Edge, MindMapError, Node, NodeId, Result};
use std::collections::{BTreeMap, HashSet};

/// A mind map: flat id-keyed node arena plus edge list
#[derive(Debug, Clone, Default)]
pub struct MindMap {
    nodes: BTreeMap<NodeId, Node>,
    edges: Vec<Edge>,
    selected: Option<NodeId>,
    strategy: LayoutStrategy,
    config: LayoutConfig,
    ids: IdGenerator,
}

impl MindMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(strategy: LayoutStrategy, config: LayoutConfig) -> Self {
        Self {
            strategy,
            config,
            ..Self::default()
        }
    }

    /// Build a laid-out map from a sanitized entity graph, positioned with
    /// the given strategy and spacing.
    pub fn from_entity_graph(
        graph: &EntityGraph,
        strategy: LayoutStrategy,
        config: &LayoutConfig,
    ) -> Self {
        let ImportedGraph { nodes, edges, dropped } = import_entity_graph(graph);
        tracing::debug!(nodes = nodes.len(), edges = edges.len(), dropped, "imported entity graph");

        let mut map = Self::with_layout(strategy, config.clone());
        map.nodes = nodes.into_iter().map(|n| (n.id.clone(), n)).collect();
        map.edges = edges;
        map.relayout();
        map
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Create the single root. Fails once any root exists.
    pub fn add_root(&mut self, label: &str) -> Result<NodeId> {
        let label = checked_label(label)?;
        if let Some(existing) = self.roots().first() {
            return Err(MindMapError::InvalidState(format!(
                "root already exists: {}",
                existing.id
            )));
        }

        let id = self.fresh_id();
        self.nodes.insert(id.clone(), Node::new(id.clone(), label, None));
        tracing::debug!(%id, "added root");
        self.relayout();
        Ok(id)
    }

    /// Create a child of `parent_id` together with its `parent → child` edge.
    pub fn add_child(&mut self, parent_id: &str, label: &str) -> Result<NodeId> {
        let label = checked_label(label)?;
        if !self.nodes.contains_key(parent_id) {
            return Err(MindMapError::NotFound(parent_id.to_string()));
        }

        let id = self.fresh_id();
        self.nodes.insert(
            id.clone(),
            Node::new(id.clone(), label, Some(parent_id.to_string())),
        );
        self.edges.push(Edge::tree(parent_id, &id));
        tracing::debug!(%id, parent = %parent_id, "added child");
        self.relayout();
        Ok(id)
    }

    /// Replace a label in place. Returns `false` when nothing changed.
    pub fn edit_label(&mut self, id: &str, new_label: &str) -> Result<bool> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| MindMapError::NotFound(id.to_string()))?;
        if node.label == new_label.trim() {
            return Ok(false);
        }
        node.label = checked_label(new_label)?;
        tracing::debug!(%id, "edited label");
        self.relayout();
        Ok(true)
    }

    /// Remove `id` and all of its descendants plus every edge touching them.
    ///
    /// Returns the removed ids in pre-order. A selection inside the removed
    /// set is cleared.
    pub fn delete_subtree(&mut self, id: &str) -> Result<Vec<NodeId>> {
        let removed = self.descendants(id)?;
        let doomed: HashSet<&str> = removed.iter().map(String::as_str).collect();

        self.nodes.retain(|node_id, _| !doomed.contains(node_id.as_str()));
        self.edges
            .retain(|e| !doomed.contains(e.source.as_str()) && !doomed.contains(e.target.as_str()));
        if self
            .selected
            .as_deref()
            .is_some_and(|sel| doomed.contains(sel))
        {
            self.selected = None;
        }

        tracing::debug!(%id, removed = removed.len(), "deleted subtree");
        self.relayout();
        Ok(removed)
    }

    /// Switch layout strategy and recompute positions.
    pub fn set_layout(&mut self, strategy: LayoutStrategy) {
        self.strategy = strategy;
        self.relayout();
    }

    pub fn set_layout_config(&mut self, config: LayoutConfig) {
        self.config = config;
        self.relayout();
    }

    /// Replace the whole node/edge set at once (used by loads and imports).
    pub(crate) fn replace_contents(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) {
        self.nodes = nodes.into_iter().map(|n| (n.id.clone(), n)).collect();
        self.edges = edges;
        if self
            .selected
            .as_deref()
            .is_some_and(|sel| !self.nodes.contains_key(sel))
        {
            self.selected = None;
        }
        self.relayout();
    }

    fn relayout(&mut self) {
        let positions = layout(&self.nodes, self.strategy, &self.config);
        for (id, position) in positions {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.position = position;
            }
        }
        tracing::trace!(strategy = self.strategy.name(), nodes = self.nodes.len(), "layout pass");
    }

    fn fresh_id(&self) -> NodeId {
        loop {
            let id = self.ids.next_id();
            if !self.nodes.contains_key(&id) {
                return id;
            }
        }
    }

    // ========================================================================
    // Selection
    // ========================================================================

    pub fn select(&mut self, id: &str) -> Result<()> {
        if !self.nodes.contains_key(id) {
            return Err(MindMapError::NotFound(id.to_string()));
        }
        self.selected = Some(id.to_string());
        Ok(())
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// All nodes, id ascending
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_map(&self) -> &BTreeMap<NodeId, Node> {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn strategy(&self) -> LayoutStrategy {
        self.strategy
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Parentless nodes, id ascending
    pub fn roots(&self) -> Vec<&Node> {
        self.nodes.values().filter(|n| n.is_root()).collect()
    }

    /// Direct children of `id`, id ascending
    pub fn children(&self, id: &str) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|n| n.parent_id.as_deref() == Some(id))
            .collect()
    }

    /// `id` followed by every descendant, in pre-order.
    pub fn descendants(&self, id: &str) -> Result<Vec<NodeId>> {
        if !self.nodes.contains_key(id) {
            return Err(MindMapError::NotFound(id.to_string()));
        }

        let children = children_index(&self.nodes);
        let mut visited: HashSet<&str> = HashSet::new();
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            out.push(current.to_string());
            if let Some(kids) = children.get(current) {
                stack.extend(kids.iter().rev().copied());
            }
        }
        Ok(out)
    }

    /// Labels from the root down to `id`.
    pub fn branch(&self, id: &str) -> Result<Vec<String>> {
        branch::compute_branch(&self.nodes, id)
    }

    pub fn tree_dump(&self) -> String {
        branch::build_tree_dump(&self.nodes)
    }

    /// Every node with its depth, in the same order as [`Self::tree_dump`].
    pub fn outline(&self) -> Vec<(&Node, usize)> {
        branch::preorder(&self.nodes)
            .into_iter()
            .filter_map(|(id, depth)| self.nodes.get(&id).map(|n| (n, depth)))
            .collect()
    }
}

fn checked_label(label: &str) -> Result<String> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(MindMapError::InvalidState("label must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}
