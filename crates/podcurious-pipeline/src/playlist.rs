use crate::model_json::parse_strict;
use crate::prompts::{playlist_prompt, PLAYLIST_MAX_TOKENS, SYSTEM_PROMPT};
use crate::scoring::{best_candidate, passes_threshold, MatchTarget};
use futures_util::StreamExt;
use podcurious_core::{
    ChatMessage, CompletionRequest, EpisodeSearch, LanguageModel, Playlist, PlaylistEpisode,
    Result, SearchQuery,
};
use std::sync::Arc;

/// Characters that confuse the search provider's query parser.
fn sanitize_for_search(s: &str) -> String {
    s.replace(['#', '&', '"'], " ").trim().to_string()
}

pub fn search_text(ep: &PlaylistEpisode) -> (String, String) {
    (sanitize_for_search(&ep.podcast), sanitize_for_search(&ep.episode))
}

pub struct PlaylistBuilder {
    llm: Arc<dyn LanguageModel>,
    search: Option<Arc<dyn EpisodeSearch>>,
    enrich_concurrency: usize,
}

impl PlaylistBuilder {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        search: Option<Arc<dyn EpisodeSearch>>,
        enrich_concurrency: usize,
    ) -> Self {
        Self {
            llm,
            search,
            enrich_concurrency: enrich_concurrency.max(1),
        }
    }

    /// Ask the model for a playlist, then attach real links where a search hit is good enough.
    ///
    /// The model's JSON is parsed strictly. Duration totals are whatever the model reported.
    pub async fn generate(&self, request: &str, target_minutes: u32) -> Result<Playlist> {
        let req = CompletionRequest {
            messages: vec![ChatMessage::user(playlist_prompt(request, target_minutes))],
            system: Some(SYSTEM_PROMPT.to_string()),
            max_tokens: PLAYLIST_MAX_TOKENS,
        };
        let text = self.llm.complete(&req).await?;
        let mut playlist: Playlist = parse_strict(&text)?;
        self.enrich(&mut playlist).await;
        tracing::info!(
            episodes = playlist.episodes.len(),
            total_minutes = playlist.total_minutes,
            "generated playlist"
        );
        Ok(playlist)
    }

    /// Best effort: a failed lookup leaves that episode as the model wrote it.
    pub async fn enrich(&self, playlist: &mut Playlist) {
        let Some(search) = self.search.as_deref() else {
            return;
        };
        tracing::info!(episodes = playlist.episodes.len(), "enriching episodes");
        let episodes = std::mem::take(&mut playlist.episodes);
        // `buffered` yields in input order regardless of completion order.
        playlist.episodes = futures_util::stream::iter(episodes)
            .map(|ep| enrich_episode(search, ep))
            .buffered(self.enrich_concurrency)
            .collect()
            .await;
    }
}

async fn enrich_episode(search: &dyn EpisodeSearch, mut ep: PlaylistEpisode) -> PlaylistEpisode {
    let (podcast, title) = search_text(&ep);
    tracing::info!(%podcast, episode = %title, "searching");
    let query = SearchQuery::episodes(format!("{podcast} {title}"));

    let results = match search.search(&query).await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(episode = %ep.episode, error = %e, "lookup failed");
            return ep;
        }
    };
    if results.is_empty() {
        tracing::info!(episode = %title, "no results");
        return ep;
    }

    let target = MatchTarget {
        podcast: &podcast,
        episode: &title,
    };
    match best_candidate(&target, &results) {
        Some((hit, score)) if passes_threshold(score) => {
            tracing::info!(
                score,
                found = %hit.title,
                podcast = %hit.podcast_title,
                url = %hit.external_url,
                "matched"
            );
            ep.attach_links(hit);
        }
        best => {
            tracing::info!(
                episode = %title,
                best_score = best.map(|(_, s)| s).unwrap_or(0),
                "no good match"
            );
        }
    }
    ep
}
