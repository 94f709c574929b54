//! Mindmap Core: the mind-map tree engine
//!
//! Owns the node/edge data model and every operation that reshapes it. The
//! rendering/interaction layer (CLI, GUI, web page) only calls into this crate
//! and receives refreshed node/edge lists back.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                         MIND-MAP ENGINE                              │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │                                                                      │
//! │  ┌──────────┐   mutation   ┌───────────┐   shape   ┌──────────────┐  │
//! │  │  User /  │─────────────►│ NodeStore │──────────►│ LayoutEngine │  │
//! │  │    AI    │              │ (MindMap) │◄──────────│   (pure)     │  │
//! │  └──────────┘              └───────────┘ positions └──────────────┘  │
//! │       ▲                      │      ▲                                │
//! │       │ nodes/edges          │      │ sanitized graph                │
//! │       │                      ▼      │                                │
//! │  ┌──────────┐        ┌──────────┐ ┌───────────────────┐              │
//! │  │ Renderer │        │  Branch  │ │ GraphImport       │              │
//! │  └──────────┘        │ Resolver │ │ Sanitizer         │              │
//! │                      └──────────┘ └───────────────────┘              │
//! │                                                                      │
//! │                 PersistenceCodec: MindMap ⇄ JSON                     │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nodes live in a flat id-keyed arena; `parent_id` is a lookup key, never an
//! ownership pointer. Every tree walk uses an explicit stack or queue.

pub mod branch;
pub mod error;
pub mod ids;
pub mod layout;
pub mod persistence;
pub mod sanitize;
pub mod store;

use serde::{Deserialize, Serialize};

// ============================================================================
// Core Types
// ============================================================================

/// Opaque unique node identifier.
pub type NodeId = String;

/// A 2D canvas position. Derived from tree shape, never authoritative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A single idea in the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    /// Absent for roots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(default)]
    pub position: Position,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>, parent_id: Option<NodeId>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            parent_id,
            position: Position::default(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A parent → child link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    /// Relationship type; only set by entity-graph imports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Edge {
    /// Tree-mode edge derived from a parent link.
    pub fn tree(source: &str, target: &str) -> Self {
        Self {
            id: format!("e-{source}-{target}"),
            source: source.to_string(),
            target: target.to_string(),
            label: None,
        }
    }

    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}

// ============================================================================
// Re-exports
// ============================================================================

pub use branch::{branch_path, build_tree_dump, compute_branch};
pub use error::{MindMapError, Result};
pub use ids::IdGenerator;
pub use layout::{layout, LayoutConfig, LayoutStrategy};
pub use persistence::{load_from_path, save, save_to_path, MindMapDocument};
pub use sanitize::{
    import_entity_graph, resolve_canonical_root, sanitize_connections, Connection, Entity,
    EntityGraph, ImportedGraph,
};
pub use store::MindMap;
