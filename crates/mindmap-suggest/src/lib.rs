//! Mindmap Suggest: mind map ↔ text-generation service
//!
//! ```text
//! ┌──────────┐  tree dump + branch   ┌────────────┐   prompt   ┌───────────┐
//! │ MindMap  │──────────────────────►│  Protocol  │───────────►│ Generator │
//! │  (core)  │                       │  (prompts) │            │ (Gemini,  │
//! └──────────┘                       └────────────┘            │  mock)    │
//!      ▲                                                        └─────┬─────┘
//!      │ add_child / from_entity_graph   ┌────────────┐   raw text     │
//!      └─────────────────────────────────│  Tracker / │◄───────────────┘
//!                                        │  Sanitizer │
//!                                        └────────────┘
//! ```
//!
//! Two modes share the plumbing:
//! - **Branch children**: free text with `**delimited**` labels for one node.
//! - **Reorganize**: a JSON entity graph built from a flat idea list.
//!
//! Network and parse failures degrade to empty results at the high level entry
//! points; tree state is never touched by a bad response.

pub mod ideas;
pub mod protocol;
pub mod providers;
pub mod tracking;

use mindmap_core::MindMapError;
use serde::{Deserialize, Serialize};

// ============================================================================
// Modes
// ============================================================================

/// Shape of the structured graph requested in reorganize mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizeVariant {
    /// `mindmap.entities` + untyped `mindmap.connections`
    #[default]
    MindMap,
    /// `organization.entities` + typed `organization.relationships`
    Organization,
}

/// What a suggestion request asks the service for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestionMode {
    /// New child labels for a single node
    BranchChildren,
    /// Restructure a flat idea list into an entity graph
    Reorganize(OrganizeVariant),
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SuggestError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Config(#[from] providers::ConfigError),

    #[error(transparent)]
    Engine(#[from] MindMapError),
}

// ============================================================================
// Re-exports
// ============================================================================

pub use ideas::IdeaBoard;
pub use protocol::{
    branch_suggestion_prompt, organize_prompt, parse_delimited_suggestions, parse_structured,
    response_text, strip_code_fence, try_parse_structured, GenerateRequest, StructuredSuggestions,
    SuggestionReply,
};
pub use providers::{ConfigError, GenerationConfig, MockGenerator, TextGenerator};
#[cfg(feature = "gemini")]
pub use providers::GeminiClient;
pub use tracking::{DiscardReason, Suggester, SuggestionOutcome, SuggestionTicket, SuggestionTracker};
