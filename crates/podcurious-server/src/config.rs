use podcurious_pipeline::config::{
    non_blank, DEFAULT_ANTHROPIC_BASE_URL, DEFAULT_LISTEN_NOTES_BASE_URL, DEFAULT_MODEL,
    DEFAULT_SPOTIFY_BASE_URL,
};
use podcurious_pipeline::RelayConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server settings. Flags win over the environment, which wins over `.env`.
#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,
    #[arg(long, env = "PODCURIOUS_HOST", default_value = "0.0.0.0")]
    pub host: String,
    /// Directory served for every non-API path.
    #[arg(long, env = "PODCURIOUS_STATIC_DIR", default_value = "public")]
    pub static_dir: PathBuf,
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,
    /// Without it, Spotify lookup and playlist enrichment are skipped.
    #[arg(long, env = "LISTEN_NOTES_KEY", hide_env_values = true)]
    pub listen_notes_key: Option<String>,
    #[arg(long, env = "PODCURIOUS_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,
    #[arg(long, env = "PODCURIOUS_ANTHROPIC_BASE_URL", default_value = DEFAULT_ANTHROPIC_BASE_URL)]
    pub anthropic_base_url: String,
    #[arg(long, env = "PODCURIOUS_LISTEN_NOTES_BASE_URL", default_value = DEFAULT_LISTEN_NOTES_BASE_URL)]
    pub listen_notes_base_url: String,
    #[arg(long, env = "PODCURIOUS_SPOTIFY_BASE_URL", default_value = DEFAULT_SPOTIFY_BASE_URL)]
    pub spotify_base_url: String,
    /// Timeout for fetching a shared page (ms).
    #[arg(long, env = "PODCURIOUS_FETCH_TIMEOUT_MS", default_value_t = 10_000)]
    pub fetch_timeout_ms: u64,
    /// Playlist episodes looked up at once.
    #[arg(long, env = "PODCURIOUS_ENRICH_CONCURRENCY", default_value_t = 1)]
    pub enrich_concurrency: usize,
}

impl ServeArgs {
    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            anthropic_api_key: non_blank(self.anthropic_api_key.clone()),
            listen_notes_key: non_blank(self.listen_notes_key.clone()),
            model: self.model.clone(),
            anthropic_base_url: self.anthropic_base_url.clone(),
            listen_notes_base_url: self.listen_notes_base_url.clone(),
            spotify_base_url: self.spotify_base_url.clone(),
            fetch_timeout: Duration::from_millis(self.fetch_timeout_ms),
            enrich_concurrency: self.enrich_concurrency.max(1),
            ..RelayConfig::default()
        }
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        use anyhow::Context;
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
