//! Suggestion tracking: which in-flight responses may still touch the tree
//!
//! A request is tagged with its node id and a per-node generation number when
//! it starts. When the response arrives it is applied only if the node still
//! exists and no newer request for that node has started since. Nothing is
//! cancelled; late responses are simply dropped.

use crate::protocol::{branch_suggestion_prompt, organize_prompt};
use crate::{
    OrganizeVariant, StructuredSuggestions, SuggestError, SuggestionMode, SuggestionReply, TextGenerator,
};
use mindmap_core::{MindMap, NodeId};
use std::collections::HashMap;

/// Identifies one outstanding branch-suggestion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionTicket {
    pub node_id: NodeId,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The target node was deleted while the request was pending
    NodeGone,
    /// A newer request for the same node superseded this one
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionOutcome {
    /// Ids of the children that were created
    Applied(Vec<NodeId>),
    Discarded(DiscardReason),
}

/// Per-node generation counters for outstanding requests
#[derive(Debug, Default)]
pub struct SuggestionTracker {
    latest: HashMap<NodeId, u64>,
}

impl SuggestionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request for `node_id`, superseding any pending one.
    ///
    /// Returns the ticket together with the prompt to send.
    pub fn begin(&mut self, map: &MindMap, node_id: &str) -> Result<(SuggestionTicket, String), SuggestError> {
        let prompt = branch_suggestion_prompt(map, node_id)?;
        self.prune(map);
        let generation = self.latest.entry(node_id.to_string()).or_insert(0);
        *generation += 1;
        let ticket = SuggestionTicket {
            node_id: node_id.to_string(),
            generation: *generation,
        };
        tracing::debug!(node = %ticket.node_id, generation = ticket.generation, "suggestion requested");
        Ok((ticket, prompt))
    }

    /// Number of nodes with a request still outstanding
    pub fn pending(&self) -> usize {
        self.latest.len()
    }

    pub fn is_current(&self, ticket: &SuggestionTicket) -> bool {
        self.latest.get(&ticket.node_id) == Some(&ticket.generation)
    }

    /// Retire a ticket whose request produced nothing to apply.
    ///
    /// Returns false when the ticket was already superseded or retired.
    pub fn abandon(&mut self, ticket: &SuggestionTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.latest.remove(&ticket.node_id);
        tracing::debug!(node = %ticket.node_id, generation = ticket.generation, "suggestion request abandoned");
        true
    }

    /// Forget requests whose node no longer exists.
    fn prune(&mut self, map: &MindMap) {
        let before = self.latest.len();
        self.latest.retain(|id, _| map.contains(id));
        if self.latest.len() < before {
            tracing::debug!(dropped = before - self.latest.len(), "pruned requests for deleted nodes");
        }
    }

    /// Add every non-empty candidate as a child of the ticket's node.
    ///
    /// Candidates that repeat an existing child label are skipped. The ticket
    /// is retired whether or not it was applied, and requests for nodes that
    /// have since been deleted are forgotten.
    pub fn apply(
        &mut self,
        map: &mut MindMap,
        ticket: &SuggestionTicket,
        candidates: &[String],
    ) -> Result<SuggestionOutcome, SuggestError> {
        if !map.contains(&ticket.node_id) {
            self.prune(map);
            tracing::warn!(node = %ticket.node_id, "discarding suggestions for deleted node");
            return Ok(SuggestionOutcome::Discarded(DiscardReason::NodeGone));
        }
        if !self.is_current(ticket) {
            tracing::warn!(node = %ticket.node_id, generation = ticket.generation, "discarding stale suggestion response");
            return Ok(SuggestionOutcome::Discarded(DiscardReason::Stale));
        }
        self.latest.remove(&ticket.node_id);
        self.prune(map);

        let mut existing: Vec<String> = map
            .children(&ticket.node_id)
            .iter()
            .map(|n| n.label.clone())
            .collect();
        let mut created = Vec::new();
        for label in candidates.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
            if existing.iter().any(|e| e == label) {
                continue;
            }
            created.push(map.add_child(&ticket.node_id, label)?);
            existing.push(label.to_string());
        }
        Ok(SuggestionOutcome::Applied(created))
    }
}

/// Prompt → generator → parsed result, with failures degraded to empty
pub struct Suggester<G: TextGenerator> {
    generator: G,
}

impl<G: TextGenerator> Suggester<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Send `prompt` and parse the reply as `mode` dictates, together with
    /// the raw text. Network/API failures are logged and yield `None`.
    pub async fn complete(&self, mode: SuggestionMode, prompt: &str) -> Option<(SuggestionReply, String)> {
        match self.generator.generate(prompt).await {
            Ok(text) => {
                let reply = mode.parse(&text);
                tracing::debug!(?mode, bytes = text.len(), "generation reply parsed");
                Some((reply, text))
            }
            Err(e) => {
                tracing::warn!(?mode, error = %e, "generation request failed");
                None
            }
        }
    }

    /// Candidate child labels for an already built branch prompt.
    pub async fn request_children(&self, prompt: &str) -> Vec<String> {
        self.complete(SuggestionMode::BranchChildren, prompt)
            .await
            .map(|(reply, _)| reply.into_children())
            .unwrap_or_default()
    }

    /// New ideas plus a restructured graph for a flat idea list.
    pub async fn reorganize(&self, ideas: &[String], variant: OrganizeVariant) -> (StructuredSuggestions, Option<String>) {
        let prompt = organize_prompt(ideas, variant);
        match self.complete(SuggestionMode::Reorganize(variant), &prompt).await {
            Some((reply, text)) => (reply.into_structured(), Some(text)),
            None => (StructuredSuggestions::default(), None),
        }
    }
}
