//! Persistence Codec: MindMap ⇄ JSON document
//!
//! Document shape:
//!
//! ```json
//! {
//!   "nodes": [{ "id": "…", "label": "…", "parentId": "…", "position": { "x": 0, "y": 0 } }],
//!   "edges": [{ "id": "…", "source": "…", "target": "…", "label": "…" }]
//! }
//! ```
//!
//! Positions are written for renderers but ignored on load; layout is always
//! recomputed from shape.

use crate::{Edge, MindMap, MindMapError, Node, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// On-disk form of a mind map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindMapDocument {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl MindMapDocument {
    pub fn from_map(map: &MindMap) -> Self {
        Self {
            nodes: map.nodes().cloned().collect(),
            edges: map.edges().to_vec(),
        }
    }

    /// Parse and validate without touching any map.
    ///
    /// Rejects duplicate ids, blank labels, unknown `parentId` references,
    /// parent cycles and more than one root.
    pub fn parse(text: &str) -> Result<Self> {
        let doc: MindMapDocument =
            serde_json::from_str(text).map_err(|e| MindMapError::InvalidFile(e.to_string()))?;

        let mut parent_of: HashMap<&str, Option<&str>> = HashMap::with_capacity(doc.nodes.len());
        for node in &doc.nodes {
            if node.label.trim().is_empty() {
                return Err(invalid(format!("node {} has an empty label", node.id)));
            }
            if parent_of
                .insert(node.id.as_str(), node.parent_id.as_deref())
                .is_some()
            {
                return Err(invalid(format!("duplicate node id: {}", node.id)));
            }
        }

        let mut roots = 0usize;
        for node in &doc.nodes {
            match node.parent_id.as_deref() {
                None => roots += 1,
                Some(parent) if !parent_of.contains_key(parent) => {
                    return Err(invalid(format!(
                        "node {} references unknown parent {parent}",
                        node.id
                    )));
                }
                Some(_) => {}
            }
        }
        if roots > 1 {
            return Err(invalid(format!("expected a single root, found {roots}")));
        }

        // Every parent exists, so a walk that outlasts the node count is a cycle
        let mut acyclic: HashSet<&str> = HashSet::new();
        for node in &doc.nodes {
            let mut chain = Vec::new();
            let mut current = Some(node.id.as_str());
            while let Some(id) = current {
                if acyclic.contains(id) {
                    break;
                }
                chain.push(id);
                if chain.len() > doc.nodes.len() {
                    return Err(invalid(format!("parent cycle through node {}", node.id)));
                }
                current = parent_of.get(id).copied().flatten();
            }
            acyclic.extend(chain);
        }

        Ok(doc)
    }

    /// Tree-mode edges derived from `parentId`.
    ///
    /// A stored edge that matches a parent link keeps its id and label; any
    /// other stored edge is dropped and missing links are recreated.
    fn tree_edges(&self) -> Vec<Edge> {
        let links: HashSet<(&str, &str)> = self
            .nodes
            .iter()
            .filter_map(|n| n.parent_id.as_deref().map(|p| (p, n.id.as_str())))
            .collect();

        let mut covered: HashSet<&str> = HashSet::new();
        let mut edges = Vec::with_capacity(links.len());
        for edge in &self.edges {
            if links.contains(&(edge.source.as_str(), edge.target.as_str()))
                && covered.insert(edge.target.as_str())
            {
                edges.push(edge.clone());
            }
        }
        let dropped = self.edges.len() - edges.len();
        if dropped > 0 {
            tracing::warn!(dropped, "ignoring edges that disagree with parent links");
        }

        for node in &self.nodes {
            if let Some(parent) = node.parent_id.as_deref() {
                if !covered.contains(node.id.as_str()) {
                    edges.push(Edge::tree(parent, &node.id));
                }
            }
        }
        edges
    }
}

fn invalid(reason: String) -> MindMapError {
    MindMapError::InvalidFile(reason)
}

/// Serialize the map to pretty JSON.
pub fn save(map: &MindMap) -> Result<String> {
    serde_json::to_string_pretty(&MindMapDocument::from_map(map))
        .map_err(|e| MindMapError::Encode(e.to_string()))
}

pub fn save_to_path(map: &MindMap, path: &Path) -> Result<()> {
    std::fs::write(path, save(map)?)?;
    tracing::debug!(path = %path.display(), nodes = map.len(), "saved mind map");
    Ok(())
}

/// Load a document from disk into `map`; on any error `map` is unchanged.
pub fn load_from_path(map: &mut MindMap, path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)?;
    map.load(&text)?;
    tracing::debug!(path = %path.display(), nodes = map.len(), "loaded mind map");
    Ok(())
}

impl MindMap {
    /// Replace the whole map with the parsed document.
    ///
    /// Fails with `InvalidFile` on unparsable JSON, a missing `nodes`/`edges`
    /// key or a node set that is not a single tree, leaving the current
    /// contents intact. Edges are rebuilt from the parent links.
    pub fn load(&mut self, text: &str) -> Result<()> {
        let doc = MindMapDocument::parse(text)?;
        let edges = doc.tree_edges();
        self.replace_contents(doc.nodes, edges);
        Ok(())
    }
}
