//! Generation backend selection for `suggest` and `organize`.

use anyhow::Result;
use clap::{Args, ValueEnum};
use mindmap_suggest::{MockGenerator, TextGenerator};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Gemini `generateContent` (reads `GEMINI_API_KEY`, `GEMINI_MODEL`, `GEMINI_BASE_URL`)
    Gemini,
    /// Replays `--mock-response` for every request; no network access
    Mock,
}

#[derive(Args, Debug, Clone)]
pub struct BackendArgs {
    /// Text generation backend
    #[arg(long, value_enum, global = true, default_value_t = BackendKind::Gemini)]
    pub backend: BackendKind,

    /// Response text returned by the mock backend
    #[arg(long, global = true, default_value = "")]
    pub mock_response: String,
}

impl BackendArgs {
    pub fn build(&self) -> Result<Box<dyn TextGenerator>> {
        match self.backend {
            BackendKind::Gemini => gemini(),
            BackendKind::Mock => Ok(Box::new(MockGenerator::always(&self.mock_response))),
        }
    }
}

#[cfg(feature = "llm-gemini")]
fn gemini() -> Result<Box<dyn TextGenerator>> {
    let client = mindmap_suggest::GeminiClient::from_env()?;
    tracing::debug!(model = %client.config().model, "using gemini backend");
    Ok(Box::new(client))
}

#[cfg(not(feature = "llm-gemini"))]
fn gemini() -> Result<Box<dyn TextGenerator>> {
    Err(anyhow::anyhow!(
        "gemini backend unavailable (compiled without `llm-gemini`)"
    ))
}
