use serde::{Deserialize, Serialize};

pub mod lenient;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Too many redirects (last url: {url})")]
    RedirectLoop { url: String },
    #[error("search failed: {0}")]
    Search(String),
    #[error("{0}")]
    Llm(String),
    #[error("{0}")]
    Parse(String),
    /// Missing or malformed client input.
    #[error("{0}")]
    Input(String),
    /// The link was fetched but no episode could be identified from it.
    #[error("{0}")]
    Extraction(String),
}

impl Error {
    /// Errors the caller can fix by sending a different request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Input(_) | Error::Extraction(_))
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::InvalidUrl(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Normalized identity of a podcast episode, produced by resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeReference {
    pub podcast: String,
    pub episode: String,
    pub description: String,
    pub image: String,
}

/// Link-preview fields scraped from a page. Every field is empty when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataBundle {
    pub title: String,
    pub og_title: String,
    pub og_description: String,
    pub og_site_name: String,
    pub og_image: String,
    pub description: String,
}

impl MetadataBundle {
    /// Map scraped tags onto an episode: site name is the show, og title (or `<title>`) the episode.
    pub fn into_episode(self) -> EpisodeReference {
        EpisodeReference {
            podcast: self.og_site_name,
            episode: first_non_empty(self.og_title, self.title),
            description: first_non_empty(self.og_description, self.description),
            image: self.og_image,
        }
    }
}

fn first_non_empty(a: String, b: String) -> String {
    if a.is_empty() {
        b
    } else {
        a
    }
}

/// One search hit from the podcast search provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub id: String,
    pub title: String,
    pub podcast_title: String,
    pub description: String,
    /// Full-size image, or the thumbnail when the provider has no image.
    pub image: String,
    pub audio_url: String,
    pub external_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    /// Provider result-type filter, e.g. `episode`.
    pub kind: String,
    pub sort_by_date: bool,
}

impl SearchQuery {
    pub fn episodes(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            kind: "episode".to_string(),
            sort_by_date: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub system: Option<String>,
    pub max_tokens: u32,
}

/// Structured analysis of a resolved episode, as produced by the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeAnalysis {
    #[serde(default, deserialize_with = "lenient::string")]
    pub summary: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub guest: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub topics: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub tone: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub suggested_prompt: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistEpisode {
    #[serde(default, deserialize_with = "lenient::string")]
    pub podcast: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub episode: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub guest: Option<String>,
    /// Minutes.
    #[serde(default, deserialize_with = "lenient::minutes")]
    pub duration: u32,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub search_query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_notes_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_notes_audio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_notes_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_notes_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PlaylistEpisode {
    /// Replace the listening links with those of a matched hit; empty hit fields become `None`.
    pub fn attach_links(&mut self, hit: &SearchCandidate) {
        fn non_empty(s: &str) -> Option<String> {
            (!s.is_empty()).then(|| s.to_string())
        }
        self.listen_notes_url = non_empty(&hit.external_url);
        self.listen_notes_audio = non_empty(&hit.audio_url);
        self.listen_notes_image = non_empty(&hit.image);
        self.listen_notes_id = non_empty(&hit.id);
    }

    pub fn is_enriched(&self) -> bool {
        self.listen_notes_url.is_some() || self.listen_notes_id.is_some()
    }
}

/// A generated playlist. Duration bookkeeping comes from the model and is not re-checked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    #[serde(default, deserialize_with = "lenient::string")]
    pub playlist_title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub playlist_description: String,
    #[serde(default, deserialize_with = "lenient::minutes")]
    pub target_minutes: u32,
    #[serde(default, deserialize_with = "lenient::null_default")]
    pub episodes: Vec<PlaylistEpisode>,
    #[serde(default, deserialize_with = "lenient::minutes")]
    pub total_minutes: u32,
    #[serde(default, deserialize_with = "lenient::string")]
    pub note: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Playlist {
    /// Sum of the per-episode durations the model reported.
    pub fn episode_minutes(&self) -> u32 {
        self.episodes.iter().map(|e| e.duration).sum()
    }
}

#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url` and return the body as text, whatever the final status.
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

#[async_trait::async_trait]
pub trait EpisodeSearch: Send + Sync {
    fn name(&self) -> &'static str;
    /// Results in provider relevance order.
    async fn search(&self, q: &SearchQuery) -> Result<Vec<SearchCandidate>>;
}

#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    /// Returns the concatenated text of the response.
    async fn complete(&self, req: &CompletionRequest) -> Result<String>;
}

/// One way of turning a shared link into an episode.
#[async_trait::async_trait]
pub trait EpisodeSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn resolve(&self, url: &str) -> Result<EpisodeReference>;
}
