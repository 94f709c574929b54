//! Branch Resolver: root-to-node paths and whole-tree text snapshots
//!
//! Both outputs feed prompt construction, so they must terminate on malformed
//! graphs (dangling parents, accidental cycles) instead of failing.

use crate::{MindMapError, Node, NodeId, Result};
use std::collections::{BTreeMap, HashSet};

/// Indent unit used by [`build_tree_dump`]
pub const DUMP_INDENT: &str = "  ";

/// Separator used by [`branch_path`]
pub const BRANCH_SEPARATOR: &str = " > ";

/// Ordered labels from the root down to `id` (inclusive).
///
/// The walk stops at a parentless node, at a parent id that does not resolve,
/// or at a node already visited.
pub fn compute_branch(nodes: &BTreeMap<NodeId, Node>, id: &str) -> Result<Vec<String>> {
    let start = nodes
        .get(id)
        .ok_or_else(|| MindMapError::NotFound(id.to_string()))?;

    let mut labels = vec![start.label.clone()];
    let mut visited: HashSet<&str> = HashSet::from([start.id.as_str()]);
    let mut current = start;

    while let Some(parent_id) = current.parent_id.as_deref() {
        let Some(parent) = nodes.get(parent_id) else {
            break;
        };
        if !visited.insert(parent.id.as_str()) {
            break;
        }
        labels.push(parent.label.clone());
        current = parent;
    }

    labels.reverse();
    Ok(labels)
}

/// Branch rendered as a single line, e.g. `Food > Noodles > Phở`.
pub fn branch_path(nodes: &BTreeMap<NodeId, Node>, id: &str) -> Result<String> {
    Ok(compute_branch(nodes, id)?.join(BRANCH_SEPARATOR))
}

/// Pre-order indented rendering of every node, children sorted by id.
pub fn build_tree_dump(nodes: &BTreeMap<NodeId, Node>) -> String {
    let mut out = String::new();
    for (id, depth) in preorder(nodes) {
        let node = &nodes[&id];
        for _ in 0..depth {
            out.push_str(DUMP_INDENT);
        }
        out.push_str("- ");
        out.push_str(&node.label);
        out.push('\n');
    }
    out
}

// ============================================================================
// Shared traversal helpers
// ============================================================================

/// Child ids per parent id, each list id ascending.
pub(crate) fn children_index(nodes: &BTreeMap<NodeId, Node>) -> BTreeMap<&str, Vec<&str>> {
    let mut index: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for node in nodes.values() {
        if let Some(parent) = node.parent_id.as_deref() {
            if nodes.contains_key(parent) {
                index.entry(parent).or_default().push(node.id.as_str());
            }
        }
    }
    index
}

/// Parentless nodes plus orphans whose parent id does not resolve, id ascending.
pub(crate) fn effective_roots(nodes: &BTreeMap<NodeId, Node>) -> Vec<&str> {
    nodes
        .values()
        .filter(|n| match n.parent_id.as_deref() {
            None => true,
            Some(parent) => !nodes.contains_key(parent),
        })
        .map(|n| n.id.as_str())
        .collect()
}

/// Pre-order walk from every effective root, yielding `(id, depth)`.
///
/// Uses an explicit stack. Nodes trapped in a parent cycle have no effective
/// root and are appended afterwards at depth 0 so nothing is silently lost.
pub(crate) fn preorder(nodes: &BTreeMap<NodeId, Node>) -> Vec<(NodeId, usize)> {
    let children = children_index(nodes);
    let mut visited: HashSet<&str> = HashSet::new();
    let mut out = Vec::with_capacity(nodes.len());

    for root in effective_roots(nodes) {
        walk_subtree(root, &children, &mut visited, &mut out);
    }
    let leftovers: Vec<&str> = nodes
        .keys()
        .map(String::as_str)
        .filter(|id| !visited.contains(id))
        .collect();
    for id in leftovers {
        walk_subtree(id, &children, &mut visited, &mut out);
    }

    out
}

fn walk_subtree<'a>(
    root: &'a str,
    children: &BTreeMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    out: &mut Vec<(NodeId, usize)>,
) {
    let mut stack: Vec<(&'a str, usize)> = vec![(root, 0)];
    while let Some((id, depth)) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        out.push((id.to_string(), depth));
        if let Some(kids) = children.get(id) {
            // Reverse so the smallest id is popped first
            for kid in kids.iter().rev() {
                stack.push((*kid, depth + 1));
            }
        }
    }
}
