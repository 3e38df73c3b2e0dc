use crate::model_json::{parse_recovering, strip_code_fences};
use crate::prompts::{analysis_prompt, DEFAULT_MAX_TOKENS, SYSTEM_PROMPT};
use podcurious_core::{
    ChatMessage, CompletionRequest, EpisodeAnalysis, EpisodeReference, Error, LanguageModel,
    Result,
};
use serde::Serialize;
use std::sync::Arc;

/// Characters of episode description returned to clients.
pub const DESCRIPTION_DISPLAY_CHARS: usize = 500;

pub const UNPARSEABLE_ANALYSIS: &str = "Could not parse analysis. Please try again.";

/// What `/api/analyze` answers with.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzedEpisode {
    pub podcast: String,
    pub episode: String,
    pub description: String,
    pub image: String,
    pub analysis: EpisodeAnalysis,
}

impl AnalyzedEpisode {
    /// Truncation happens here, after the model has seen the whole description.
    pub fn new(ep: EpisodeReference, analysis: EpisodeAnalysis) -> Self {
        let description =
            crate::truncate_chars(&ep.description, DESCRIPTION_DISPLAY_CHARS).to_string();
        Self {
            podcast: ep.podcast,
            episode: ep.episode,
            description,
            image: ep.image,
            analysis,
        }
    }
}

pub struct EpisodeAnalyzer {
    llm: Arc<dyn LanguageModel>,
}

impl EpisodeAnalyzer {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn analyze(&self, ep: &EpisodeReference) -> Result<EpisodeAnalysis> {
        let req = CompletionRequest {
            messages: vec![ChatMessage::user(analysis_prompt(ep))],
            system: Some(SYSTEM_PROMPT.to_string()),
            max_tokens: DEFAULT_MAX_TOKENS,
        };
        let text = self.llm.complete(&req).await?;
        parse_recovering(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                reply = %crate::truncate_chars(&strip_code_fences(&text), 200),
                "analysis reply was not JSON"
            );
            Error::Parse(UNPARSEABLE_ANALYSIS.to_string())
        })
    }
}
