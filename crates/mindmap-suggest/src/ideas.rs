//! Idea board: a flat list of raw ideas that can be reorganized into a map

use crate::{OrganizeVariant, Suggester, TextGenerator};
use mindmap_core::{LayoutConfig, LayoutStrategy, MindMap, MindMapError};

#[derive(Debug, Clone, Default)]
pub struct IdeaBoard {
    ideas: Vec<String>,
    suggestions: Vec<String>,
    last_raw_output: Option<String>,
}

impl IdeaBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ideas<I, S>(ideas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut board = Self::new();
        for idea in ideas {
            board.add_idea(idea.as_ref());
        }
        board
    }

    pub fn ideas(&self) -> &[String] {
        &self.ideas
    }

    /// Suggestions returned by the most recent reorganization
    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn last_raw_output(&self) -> Option<&str> {
        self.last_raw_output.as_deref()
    }

    /// Append an idea. Blank text is ignored and returns `false`.
    pub fn add_idea(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.ideas.push(text.to_string());
        true
    }

    /// Replace the idea at `index`. Blank text leaves it unchanged.
    pub fn edit_idea(&mut self, index: usize, text: &str) -> Result<bool, MindMapError> {
        let slot = self
            .ideas
            .get_mut(index)
            .ok_or_else(|| MindMapError::NotFound(format!("idea #{index}")))?;
        let text = text.trim();
        if text.is_empty() || slot.as_str() == text {
            return Ok(false);
        }
        *slot = text.to_string();
        Ok(true)
    }

    pub fn delete_idea(&mut self, index: usize) -> Result<String, MindMapError> {
        if index >= self.ideas.len() {
            return Err(MindMapError::NotFound(format!("idea #{index}")));
        }
        Ok(self.ideas.remove(index))
    }

    /// Move suggestion `index` to the end of the idea list.
    pub fn accept_suggestion(&mut self, index: usize) -> Result<(), MindMapError> {
        if index >= self.suggestions.len() {
            return Err(MindMapError::NotFound(format!("suggestion #{index}")));
        }
        let accepted = self.suggestions.remove(index);
        self.add_idea(&accepted);
        Ok(())
    }

    /// Ask the generator to restructure the current ideas.
    ///
    /// Stores the returned suggestions and raw text, and returns the sanitized
    /// map. Failures leave an empty map and an empty suggestion list.
    pub async fn reorganize<G: TextGenerator>(
        &mut self,
        suggester: &Suggester<G>,
        variant: OrganizeVariant,
        strategy: LayoutStrategy,
        config: &LayoutConfig,
    ) -> MindMap {
        if self.ideas.is_empty() {
            tracing::debug!("no ideas to reorganize");
            return MindMap::with_layout(strategy, config.clone());
        }

        let (structured, raw) = suggester.reorganize(&self.ideas, variant).await;
        self.last_raw_output = raw;
        self.suggestions = structured
            .suggestions
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        MindMap::from_entity_graph(&structured.graph, strategy, config)
    }
}
