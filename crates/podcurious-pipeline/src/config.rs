use std::time::Duration;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_LISTEN_NOTES_BASE_URL: &str = "https://listen-api.listennotes.com";
pub const DEFAULT_SPOTIFY_BASE_URL: &str = "https://open.spotify.com";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the pipeline needs, read once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub anthropic_api_key: Option<String>,
    /// Absent means lookup and enrichment are skipped, not failed.
    pub listen_notes_key: Option<String>,
    pub model: String,
    pub anthropic_base_url: String,
    pub listen_notes_base_url: String,
    pub spotify_base_url: String,
    pub fetch_timeout: Duration,
    pub max_redirects: u32,
    /// Episodes looked up at once during enrichment; output order is kept either way.
    pub enrich_concurrency: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            listen_notes_key: None,
            model: DEFAULT_MODEL.to_string(),
            anthropic_base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            listen_notes_base_url: DEFAULT_LISTEN_NOTES_BASE_URL.to_string(),
            spotify_base_url: DEFAULT_SPOTIFY_BASE_URL.to_string(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_redirects: crate::DEFAULT_MAX_REDIRECTS,
            enrich_concurrency: 1,
        }
    }
}

/// Blank or whitespace-only secrets count as unset.
pub fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl RelayConfig {
    pub fn with_keys(anthropic_api_key: Option<String>, listen_notes_key: Option<String>) -> Self {
        Self {
            anthropic_api_key: non_blank(anthropic_api_key),
            listen_notes_key: non_blank(listen_notes_key),
            ..Self::default()
        }
    }

    pub fn lookup_enabled(&self) -> bool {
        self.listen_notes_key.is_some()
    }
}
