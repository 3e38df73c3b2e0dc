use crate::analysis::{AnalyzedEpisode, EpisodeAnalyzer};
use crate::anthropic::AnthropicClient;
use crate::config::RelayConfig;
use crate::listen_notes::ListenNotesClient;
use crate::playlist::PlaylistBuilder;
use crate::prompts::{DEFAULT_MAX_TOKENS, SYSTEM_PROMPT};
use crate::resolve::EpisodeResolver;
use crate::LocalFetcher;
use podcurious_core::{
    ChatMessage, CompletionRequest, EpisodeSearch, Error, LanguageModel, PageFetcher, Playlist,
    Result,
};
use std::sync::Arc;

/// The three request flows, wired to their upstreams. Shared read-only across requests.
pub struct Relay {
    config: RelayConfig,
    llm: Arc<dyn LanguageModel>,
    resolver: EpisodeResolver,
    analyzer: EpisodeAnalyzer,
    playlists: PlaylistBuilder,
}

impl Relay {
    /// Real HTTP clients for every upstream. Search is only wired up when a key is set.
    pub fn from_config(config: RelayConfig) -> Result<Self> {
        let api = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Fetch(e.to_string()))?;
        let fetcher = Arc::new(LocalFetcher::new(config.fetch_timeout, config.max_redirects)?);
        let llm = Arc::new(AnthropicClient::new(
            api.clone(),
            config.anthropic_api_key.clone(),
            config.anthropic_base_url.clone(),
            config.model.clone(),
        ));
        let search = config.listen_notes_key.clone().map(|key| {
            Arc::new(ListenNotesClient::new(
                api.clone(),
                key,
                config.listen_notes_base_url.clone(),
            )) as Arc<dyn EpisodeSearch>
        });
        Ok(Self::from_parts(config, fetcher, search, llm))
    }

    pub fn from_parts(
        config: RelayConfig,
        fetcher: Arc<dyn PageFetcher>,
        search: Option<Arc<dyn EpisodeSearch>>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        let resolver =
            EpisodeResolver::new(fetcher, search.clone(), config.spotify_base_url.clone());
        let analyzer = EpisodeAnalyzer::new(llm.clone());
        let playlists = PlaylistBuilder::new(llm.clone(), search, config.enrich_concurrency);
        Self {
            config,
            llm,
            resolver,
            analyzer,
            playlists,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Link in, episode identity plus model analysis out.
    pub async fn analyze(&self, url: &str) -> Result<AnalyzedEpisode> {
        if url.is_empty() {
            return Err(Error::Input("Missing URL".to_string()));
        }
        tracing::info!(%url, "analyzing");
        let episode = self.resolver.resolve(url).await?;
        tracing::info!(podcast = %episode.podcast, episode = %episode.episode, "identified");
        let analysis = self.analyzer.analyze(&episode).await?;
        Ok(AnalyzedEpisode::new(episode, analysis))
    }

    /// Forward a conversation as-is; no history is kept here.
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let Some(last) = messages.last() else {
            return Err(Error::Input("No messages".to_string()));
        };
        tracing::info!(
            messages = messages.len(),
            last = %crate::truncate_chars(&last.content, 80),
            "chat"
        );
        let req = CompletionRequest {
            messages,
            system: Some(SYSTEM_PROMPT.to_string()),
            max_tokens: DEFAULT_MAX_TOKENS,
        };
        self.llm.complete(&req).await
    }

    pub async fn playlist(&self, prompt: &str, target_minutes: u32) -> Result<Playlist> {
        if prompt.is_empty() {
            return Err(Error::Input("Missing prompt".to_string()));
        }
        tracing::info!(%prompt, target_minutes, "building playlist");
        self.playlists.generate(prompt, target_minutes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podcurious_core::{SearchCandidate, SearchQuery};
    use std::sync::Mutex;

    struct Pages(&'static str);

    #[async_trait::async_trait]
    impl PageFetcher for Pages {
        async fn fetch_text(&self, _url: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct NoHits;

    #[async_trait::async_trait]
    impl EpisodeSearch for NoHits {
        fn name(&self) -> &'static str {
            "none"
        }
        async fn search(&self, _q: &SearchQuery) -> Result<Vec<SearchCandidate>> {
            Ok(Vec::new())
        }
    }

    struct Recorder {
        reply: &'static str,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait::async_trait]
    impl LanguageModel for Recorder {
        async fn complete(&self, req: &CompletionRequest) -> Result<String> {
            self.seen.lock().unwrap().push(req.clone());
            Ok(self.reply.to_string())
        }
    }

    fn relay(page: &'static str, reply: &'static str) -> (Relay, Arc<Recorder>) {
        let llm = Arc::new(Recorder {
            reply,
            seen: Mutex::new(Vec::new()),
        });
        let r = Relay::from_parts(
            RelayConfig::default(),
            Arc::new(Pages(page)),
            Some(Arc::new(NoHits) as Arc<dyn EpisodeSearch>),
            llm.clone(),
        );
        (r, llm)
    }

    const PAGE: &str = r#"<html><head>
<meta property="og:site_name" content="Hard Fork">
<meta property="og:title" content="Robots Everywhere">
<meta property="og:description" content="Kevin and Casey talk robots.">
<meta property="og:image" content="https://img/hf.jpg">
</head></html>"#;

    #[tokio::test]
    async fn empty_inputs_are_rejected_before_any_upstream_call() {
        let (r, llm) = relay(PAGE, "{}");
        assert!(matches!(r.analyze("").await, Err(Error::Input(m)) if m == "Missing URL"));
        assert!(matches!(r.chat(vec![]).await, Err(Error::Input(m)) if m == "No messages"));
        assert!(matches!(r.playlist("", 60).await, Err(Error::Input(m)) if m == "Missing prompt"));
        assert!(llm.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn analyze_combines_page_metadata_and_model_output() {
        let (r, _) = relay(PAGE, r#"{"summary":"Robots.","topics":["ai"],"tone":"casual"}"#);
        let out = r.analyze("https://example.com/ep").await.unwrap();
        assert_eq!(out.podcast, "Hard Fork");
        assert_eq!(out.episode, "Robots Everywhere");
        assert_eq!(out.image, "https://img/hf.jpg");
        assert_eq!(out.analysis.summary, "Robots.");
    }

    #[tokio::test]
    async fn chat_forwards_history_with_persona() {
        let (r, llm) = relay(PAGE, "Sure thing.");
        let msgs = vec![
            ChatMessage::user("hi"),
            ChatMessage {
                role: "assistant".to_string(),
                content: "hello".to_string(),
            },
            ChatMessage::user("something calmer, 90 minutes"),
        ];
        assert_eq!(r.chat(msgs.clone()).await.unwrap(), "Sure thing.");
        let seen = llm.seen.lock().unwrap();
        assert_eq!(seen[0].messages, msgs);
        assert_eq!(seen[0].system.as_deref(), Some(SYSTEM_PROMPT));
        assert_eq!(seen[0].max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[tokio::test]
    async fn playlist_without_matches_keeps_model_output() {
        let (r, _) = relay(
            PAGE,
            r#"{"playlistTitle":"T","episodes":[{"podcast":"P","episode":"E","duration":30}],"totalMinutes":30}"#,
        );
        let p = r.playlist("calm history", 30).await.unwrap();
        assert_eq!(p.playlist_title, "T");
        assert_eq!(p.episodes.len(), 1);
        assert!(!p.episodes[0].is_enriched());
    }
}
