//! Suggestion Protocol: prompt construction and response parsing
//!
//! Outbound prompts embed the branch path and the full tree dump so the model
//! sees the whole structure. Inbound text is parsed in one of two shapes:
//! `**delimited**` child labels, or a JSON object carrying an entity graph.

use crate::{OrganizeVariant, SuggestError, SuggestionMode};
use mindmap_core::{Connection, Entity, EntityGraph, MindMap};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Delimiter wrapped around every suggested label
pub const SUGGESTION_MARKER: &str = "**";

// ============================================================================
// Prompt Templates
// ============================================================================

/// Prompt for new children of `node_id`.
pub fn branch_suggestion_prompt(map: &MindMap, node_id: &str) -> Result<String, SuggestError> {
    let branch = map.branch(node_id)?;
    let target = branch.last().cloned().unwrap_or_default();
    let dump = map.tree_dump();

    Ok(format!(
        r#"You are a brainstorming assistant helping a user grow a mind map.

Current mind map:
{dump}
Selected branch: {path}

Suggest 3 to 5 new child ideas for "{target}". Each idea must fit the selected branch and must not repeat an idea already in the mind map.

Output format:
- Wrap every suggested idea in double asterisks, for example **Street food**
- Do not put colons or any extra punctuation inside the asterisks
- Keep each idea to a few words"#,
        path = branch.join(" > "),
    ))
}

/// Prompt asking for new ideas plus a restructured graph of `ideas`.
pub fn organize_prompt(ideas: &[String], variant: OrganizeVariant) -> String {
    let (task, shape) = match variant {
        OrganizeVariant::MindMap => (
            r#"2. Organize Ideas into a Mind Map: Analyze the provided list of ideas and generate a simple mind map.
   - Extract abstract ENTITIES representing the core concepts from the ideas. Each ENTITY should have an 'id' and a 'label'.
   - Connect these entities to show associations. Represent these connections as objects with an 'id', 'source' (entity id), and 'target' (entity id). Do not include any relationship type."#,
            r#"{
  "suggestions": ["New Idea 1", "New Idea 2"],
  "mindmap": {
    "entities": [{"id": "1", "label": "Entity Label 1"}, {"id": "2", "label": "Entity Label 2"}],
    "connections": [{"id": "c1", "source": "1", "target": "2"}]
  }
}"#,
        ),
        OrganizeVariant::Organization => (
            r#"2. Organize Ideas into an Organization Chart: Analyze the provided list of ideas and generate a simple entity graph.
   - Extract ENTITIES representing the core concepts from the ideas. Each ENTITY should have an 'id' and a 'label'.
   - Relate these entities. Represent each relationship as an object with an 'id', 'source' (entity id), 'target' (entity id) and a short 'label' naming the relationship type."#,
            r#"{
  "suggestions": ["New Idea 1", "New Idea 2"],
  "organization": {
    "entities": [{"id": "1", "label": "Entity Label 1"}, {"id": "2", "label": "Entity Label 2"}],
    "relationships": [{"id": "r1", "source": "1", "target": "2", "label": "includes"}]
  }
}"#,
        ),
    };

    format!(
        r#"You are a brainstorming assistant. Given a list of ideas, your task is twofold:

1. Suggest New Ideas: Generate a list of new, unique ideas that are relevant to the provided list.
   Return these suggestions as a JSON array under the key 'suggestions'.

{task}
   - Ensure there are no loop connections (where the source and target are the same) and that each child node has only one parent. If multiple parent connections exist for a single node, include only the first one.

Return the result in JSON format with the following structure:
{shape}

Current list of ideas:
{ideas}

Return a single JSON object without any markdown formatting."#,
        ideas = ideas.join("\n"),
    )
}

// ============================================================================
// Delimited-text parsing
// ============================================================================

fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"\*\*(.*?)\*\*").expect("static marker pattern"))
}

/// Every `**…**` span, colons stripped and trimmed, in order.
///
/// Duplicates and empty spans are passed through; text without markers
/// yields an empty list.
pub fn parse_delimited_suggestions(text: &str) -> Vec<String> {
    marker_regex()
        .captures_iter(text)
        .map(|cap| cap[1].replace(':', "").trim().to_string())
        .collect()
}

// ============================================================================
// Structured parsing
// ============================================================================

/// New ideas plus the proposed entity graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredSuggestions {
    pub suggestions: Vec<String>,
    pub graph: EntityGraph,
}

impl StructuredSuggestions {
    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty() && self.graph.is_empty()
    }
}

#[derive(Deserialize)]
struct RawStructured {
    #[serde(default)]
    suggestions: Vec<String>,
    mindmap: Option<RawMindMap>,
    organization: Option<RawOrganization>,
}

#[derive(Deserialize)]
struct RawMindMap {
    #[serde(default)]
    entities: Vec<Entity>,
    #[serde(default)]
    connections: Vec<Connection>,
}

#[derive(Deserialize)]
struct RawOrganization {
    #[serde(default)]
    entities: Vec<Entity>,
    #[serde(default)]
    relationships: Vec<Connection>,
}

/// Remove a leading ```` ```json ```` / ```` ``` ```` marker and a trailing
/// ```` ``` ```` marker.
pub fn strip_code_fence(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// Parse a structured response, reporting why it was rejected.
pub fn try_parse_structured(text: &str) -> Result<StructuredSuggestions, SuggestError> {
    let body = strip_code_fence(text);
    let raw: RawStructured =
        serde_json::from_str(body).map_err(|e| SuggestError::MalformedResponse(e.to_string()))?;

    let graph = match (raw.mindmap, raw.organization) {
        (Some(m), _) => EntityGraph {
            entities: m.entities,
            connections: m.connections,
        },
        (None, Some(o)) => EntityGraph {
            entities: o.entities,
            connections: o.relationships,
        },
        (None, None) => {
            return Err(SuggestError::MalformedResponse(
                "expected a 'mindmap' or 'organization' object".to_string(),
            ))
        }
    };

    Ok(StructuredSuggestions {
        suggestions: raw.suggestions,
        graph,
    })
}

/// Parse a structured response, degrading to the empty value on any failure.
pub fn parse_structured(text: &str) -> StructuredSuggestions {
    try_parse_structured(text).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "discarding structured response");
        StructuredSuggestions::default()
    })
}

/// A response parsed according to the mode it was requested in
#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionReply {
    Children(Vec<String>),
    Structured(StructuredSuggestions),
}

impl SuggestionReply {
    /// Child labels; a structured reply contributes its suggestions.
    pub fn into_children(self) -> Vec<String> {
        match self {
            Self::Children(labels) => labels,
            Self::Structured(structured) => structured.suggestions,
        }
    }

    /// Structured result; a plain label list carries no graph.
    pub fn into_structured(self) -> StructuredSuggestions {
        match self {
            Self::Children(suggestions) => StructuredSuggestions {
                suggestions,
                ..StructuredSuggestions::default()
            },
            Self::Structured(structured) => structured,
        }
    }
}

impl SuggestionMode {
    /// Parse raw response text the way this mode expects it.
    pub fn parse(self, text: &str) -> SuggestionReply {
        match self {
            Self::BranchChildren => SuggestionReply::Children(parse_delimited_suggestions(text)),
            Self::Reorganize(_) => SuggestionReply::Structured(parse_structured(text)),
        }
    }
}

// ============================================================================
// Wire format
// ============================================================================

/// `{ "contents": [ { "parts": [ { "text": … } ] } ] }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

impl GenerateRequest {
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        }
    }
}

/// Text at `candidates[0].content.parts[0].text`, empty when absent.
pub fn response_text(response: &serde_json::Value) -> String {
    response
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}
