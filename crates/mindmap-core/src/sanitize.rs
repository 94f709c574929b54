//! Graph Import Sanitizer: externally supplied entity graphs → safe trees
//!
//! Generated connection lists routinely contain self-loops, several parents
//! for one child, and cycles. Nothing from such a list reaches a [`MindMap`]
//! until it passes through here.
//!
//! [`MindMap`]: crate::MindMap

use crate::{Edge, Node, NodeId};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};

/// Any JSON scalar the service may use as an id or label
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Int(n) => n.to_string(),
            Scalar::UInt(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

/// Strings pass through, numbers and booleans are rendered, `null` is empty.
fn scalar_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?
        .map(Scalar::into_text)
        .unwrap_or_default())
}

fn optional_scalar_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_text))
}

/// An abstract concept proposed by the generation service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(deserialize_with = "scalar_text")]
    pub id: String,
    #[serde(default, deserialize_with = "scalar_text")]
    pub label: String,
}

impl Entity {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// A proposed `source → target` link, optionally typed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default, deserialize_with = "scalar_text")]
    pub id: String,
    #[serde(deserialize_with = "scalar_text")]
    pub source: String,
    #[serde(deserialize_with = "scalar_text")]
    pub target: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_scalar_text"
    )]
    pub label: Option<String>,
}

impl Connection {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn into_edge(self) -> Edge {
        let id = if self.id.trim().is_empty() {
            format!("e-{}-{}", self.source, self.target)
        } else {
            self.id
        };
        Edge {
            id,
            source: self.source,
            target: self.target,
            label: self.label,
        }
    }
}

/// Entities plus the links between them, as returned by the service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityGraph {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl EntityGraph {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.connections.is_empty()
    }
}

/// Tree-shaped result of [`import_entity_graph`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// Connections rejected for any reason
    pub dropped: usize,
}

/// Filter connections in input order.
///
/// A connection is discarded when it is a self-loop, when its target already
/// received a parent earlier in the batch, or when accepting it would close a
/// cycle. Everything else is accepted and its target marked as parented.
pub fn sanitize_connections(connections: &[Connection]) -> Vec<Connection> {
    let mut parent_of: HashMap<&str, &str> = HashMap::new();
    let mut accepted = Vec::new();

    for conn in connections {
        if conn.source == conn.target {
            tracing::debug!(id = %conn.id, node = %conn.source, "dropping self-loop");
            continue;
        }
        if parent_of.contains_key(conn.target.as_str()) {
            tracing::debug!(id = %conn.id, target = %conn.target, "dropping second parent claim");
            continue;
        }
        if is_ancestor(&parent_of, &conn.target, &conn.source) {
            tracing::debug!(id = %conn.id, "dropping cycle-closing connection");
            continue;
        }
        parent_of.insert(conn.target.as_str(), conn.source.as_str());
        accepted.push(conn.clone());
    }

    accepted
}

/// `true` when `candidate` is `node` itself or one of its ancestors.
fn is_ancestor(parent_of: &HashMap<&str, &str>, candidate: &str, node: &str) -> bool {
    let mut current = node;
    let mut steps = 0usize;
    loop {
        if current == candidate {
            return true;
        }
        match parent_of.get(current) {
            Some(&parent) if steps <= parent_of.len() => {
                current = parent;
                steps += 1;
            }
            _ => return false,
        }
    }
}

/// Synthesize links that leave exactly one parentless entity.
///
/// The first unparented entity in input order becomes the canonical root and
/// every other unparented entity is attached to it. Returns only the new links.
pub fn resolve_canonical_root(entities: &[Entity], accepted: &[Connection]) -> Vec<Connection> {
    let parented: HashSet<&str> = accepted.iter().map(|c| c.target.as_str()).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let unparented: Vec<&str> = entities
        .iter()
        .map(|e| e.id.as_str())
        .filter(|id| !parented.contains(id) && seen.insert(*id))
        .collect();

    let Some((root, rest)) = unparented.split_first() else {
        return Vec::new();
    };
    rest.iter()
        .map(|other| Connection::new(format!("root-{root}-{other}"), *root, *other))
        .collect()
}

/// Turn an arbitrary entity graph into a single-rooted tree.
///
/// Duplicate entity ids keep their first occurrence, connections naming an
/// unknown entity are dropped before sanitizing, and entities with an empty
/// label fall back to their id.
pub fn import_entity_graph(graph: &EntityGraph) -> ImportedGraph {
    let mut known: HashSet<&str> = HashSet::new();
    let entities: Vec<&Entity> = graph
        .entities
        .iter()
        .filter(|e| !e.id.trim().is_empty() && known.insert(e.id.as_str()))
        .collect();

    let resolvable: Vec<Connection> = graph
        .connections
        .iter()
        .filter(|c| known.contains(c.source.as_str()) && known.contains(c.target.as_str()))
        .cloned()
        .collect();
    let mut dropped = graph.connections.len() - resolvable.len();
    if dropped > 0 {
        tracing::warn!(dropped, "connections reference unknown entities");
    }

    let accepted = sanitize_connections(&resolvable);
    dropped += resolvable.len() - accepted.len();

    let owned: Vec<Entity> = entities.iter().map(|e| (*e).clone()).collect();
    let synthesized = resolve_canonical_root(&owned, &accepted);

    let links: Vec<Connection> = accepted.into_iter().chain(synthesized).collect();
    let parent_of: HashMap<&str, &str> = links
        .iter()
        .map(|c| (c.target.as_str(), c.source.as_str()))
        .collect();

    let nodes = entities
        .iter()
        .map(|e| {
            let label = if e.label.trim().is_empty() {
                e.id.clone()
            } else {
                e.label.clone()
            };
            let parent: Option<NodeId> = parent_of.get(e.id.as_str()).map(|p| p.to_string());
            Node::new(e.id.clone(), label, parent)
        })
        .collect();
    let edges = links.into_iter().map(Connection::into_edge).collect();

    ImportedGraph {
        nodes,
        edges,
        dropped,
    }
}
