//! Shared link → [`EpisodeReference`].
//!
//! Spotify episode pages are JS shells with nothing useful to scrape, so when a search key is
//! configured they go through an ordered list of sources (search lookup, embed player page,
//! oEmbed) and the first that answers wins. Everything else is scraped directly.

use crate::metadata::extract_metadata;
use podcurious_core::{
    EpisodeReference, EpisodeSearch, EpisodeSource, Error, PageFetcher, Result, SearchQuery,
};
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, LazyLock};

pub const SPOTIFY_EXHAUSTED: &str = "Could not extract episode info from Spotify link. Try an Apple Podcasts or YouTube link instead.";
pub const UNIDENTIFIED_EPISODE: &str = "Couldn't identify the episode from that link. Try sharing an Apple Podcasts or YouTube link instead.";

/// Titles a scrape returns when it only reached the platform's generic shell.
const PLACEHOLDER_TITLES: &[&str] = &["Spotify \u{2013} Web Player", "Spotify"];

static SPOTIFY_EPISODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"spotify\.com/episode/([a-zA-Z0-9]+)").expect("spotify episode regex")
});

pub fn spotify_episode_id(url: &str) -> Option<String> {
    SPOTIFY_EPISODE_RE
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn require_spotify_id(url: &str) -> Result<String> {
    spotify_episode_id(url)
        .ok_or_else(|| Error::InvalidUrl(format!("not a spotify episode link: {url}")))
}

pub fn is_placeholder_title(title: &str) -> bool {
    title.trim().is_empty() || PLACEHOLDER_TITLES.contains(&title)
}

/// Fetch the shared page itself and read its link-preview tags.
pub struct DirectPage {
    fetcher: Arc<dyn PageFetcher>,
}

impl DirectPage {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait::async_trait]
impl EpisodeSource for DirectPage {
    fn name(&self) -> &'static str {
        "direct_page"
    }

    async fn resolve(&self, url: &str) -> Result<EpisodeReference> {
        let html = self.fetcher.fetch_text(url).await?;
        Ok(extract_metadata(&html).into_episode())
    }
}

/// Search the podcast index for the Spotify id and trust its top hit.
pub struct SearchLookup {
    search: Arc<dyn EpisodeSearch>,
}

impl SearchLookup {
    pub fn new(search: Arc<dyn EpisodeSearch>) -> Self {
        Self { search }
    }
}

#[async_trait::async_trait]
impl EpisodeSource for SearchLookup {
    fn name(&self) -> &'static str {
        "search_lookup"
    }

    async fn resolve(&self, url: &str) -> Result<EpisodeReference> {
        let id = require_spotify_id(url)?;
        let results = self.search.search(&SearchQuery::episodes(id)).await?;
        // Provider ranking is trusted here; no scoring.
        let best = results
            .into_iter()
            .next()
            .ok_or_else(|| Error::Search("not found via search".to_string()))?;
        Ok(EpisodeReference {
            podcast: best.podcast_title,
            episode: best.title,
            description: best.description,
            image: best.image,
        })
    }
}

/// The embeddable player page carries the Open Graph tags the main page lacks.
pub struct SpotifyEmbed {
    fetcher: Arc<dyn PageFetcher>,
    base_url: String,
}

impl SpotifyEmbed {
    pub fn new(fetcher: Arc<dyn PageFetcher>, base_url: String) -> Self {
        Self { fetcher, base_url }
    }
}

#[async_trait::async_trait]
impl EpisodeSource for SpotifyEmbed {
    fn name(&self) -> &'static str {
        "spotify_embed"
    }

    async fn resolve(&self, url: &str) -> Result<EpisodeReference> {
        let id = require_spotify_id(url)?;
        let embed_url = format!(
            "{}/embed/episode/{id}",
            self.base_url.trim_end_matches('/')
        );
        let html = self.fetcher.fetch_text(&embed_url).await?;
        let ep = extract_metadata(&html).into_episode();
        // A titleless embed counts as a miss so oEmbed still gets a turn.
        if ep.episode.is_empty() {
            return Err(Error::Extraction(
                "embed page carried no episode title".to_string(),
            ));
        }
        Ok(ep)
    }
}

#[derive(Debug, Deserialize)]
struct OEmbed {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    provider_name: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
}

pub struct SpotifyOEmbed {
    fetcher: Arc<dyn PageFetcher>,
    base_url: String,
}

impl SpotifyOEmbed {
    pub fn new(fetcher: Arc<dyn PageFetcher>, base_url: String) -> Self {
        Self { fetcher, base_url }
    }

    fn endpoint_for(&self, url: &str) -> Result<url::Url> {
        let base = format!("{}/oembed", self.base_url.trim_end_matches('/'));
        Ok(url::Url::parse_with_params(&base, &[("url", url)])?)
    }
}

#[async_trait::async_trait]
impl EpisodeSource for SpotifyOEmbed {
    fn name(&self) -> &'static str {
        "spotify_oembed"
    }

    async fn resolve(&self, url: &str) -> Result<EpisodeReference> {
        let endpoint = self.endpoint_for(url)?;
        let body = self.fetcher.fetch_text(endpoint.as_str()).await?;
        let o: OEmbed =
            serde_json::from_str(&body).map_err(|e| Error::Parse(format!("oembed: {e}")))?;
        Ok(EpisodeReference {
            podcast: o
                .provider_name
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Spotify".to_string()),
            episode: o.title.unwrap_or_default(),
            description: String::new(),
            image: o.thumbnail_url.unwrap_or_default(),
        })
    }
}

/// Ordered fallback: each source is tried only after the previous one failed.
pub struct SourceChain {
    sources: Vec<Arc<dyn EpisodeSource>>,
    exhausted: &'static str,
}

impl SourceChain {
    pub fn new(sources: Vec<Arc<dyn EpisodeSource>>, exhausted: &'static str) -> Self {
        Self { sources, exhausted }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub async fn resolve(&self, url: &str) -> Result<EpisodeReference> {
        for source in &self.sources {
            match source.resolve(url).await {
                Ok(ep) => {
                    tracing::info!(source = source.name(), episode = %ep.episode, podcast = %ep.podcast, "resolved episode");
                    return Ok(ep);
                }
                Err(e) => {
                    tracing::warn!(source = source.name(), error = %e, "episode source failed, trying next");
                }
            }
        }
        Err(Error::Extraction(self.exhausted.to_string()))
    }
}

pub struct EpisodeResolver {
    fetcher: Arc<dyn PageFetcher>,
    search: Option<Arc<dyn EpisodeSearch>>,
    spotify_base_url: String,
}

impl EpisodeResolver {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        search: Option<Arc<dyn EpisodeSearch>>,
        spotify_base_url: String,
    ) -> Self {
        Self {
            fetcher,
            search,
            spotify_base_url,
        }
    }

    /// Sources that will be tried for `url`, in order.
    pub fn plan(&self, url: &str) -> SourceChain {
        match (&self.search, spotify_episode_id(url)) {
            (Some(search), Some(id)) => {
                tracing::info!(spotify_id = %id, "spotify episode link, looking up via search");
                SourceChain::new(
                    vec![
                        Arc::new(SearchLookup::new(search.clone())),
                        Arc::new(SpotifyEmbed::new(
                            self.fetcher.clone(),
                            self.spotify_base_url.clone(),
                        )),
                        Arc::new(SpotifyOEmbed::new(
                            self.fetcher.clone(),
                            self.spotify_base_url.clone(),
                        )),
                    ],
                    SPOTIFY_EXHAUSTED,
                )
            }
            _ => SourceChain::new(
                vec![Arc::new(DirectPage::new(self.fetcher.clone()))],
                UNIDENTIFIED_EPISODE,
            ),
        }
    }

    /// Resolve and sanity-check. The description is returned whole; callers truncate for
    /// display after analysis.
    pub async fn resolve(&self, url: &str) -> Result<EpisodeReference> {
        let chain = self.plan(url);
        let ep = if chain.sources.len() == 1 {
            // A direct scrape's own failure (timeout, bad URL) is more useful than a generic
            // message.
            chain.sources[0].resolve(url).await?
        } else {
            chain.resolve(url).await?
        };
        tracing::info!(episode = %ep.episode, podcast = %ep.podcast, "found episode");
        if is_placeholder_title(&ep.episode) {
            return Err(Error::Extraction(UNIDENTIFIED_EPISODE.to_string()));
        }
        Ok(ep)
    }
}
