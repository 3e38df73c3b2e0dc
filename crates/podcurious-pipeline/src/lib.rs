use podcurious_core::{Error, PageFetcher, Result};
use std::time::Duration;

pub mod analysis;
pub mod anthropic;
pub mod config;
pub mod listen_notes;
pub mod metadata;
pub mod model_json;
pub mod playlist;
pub mod prompts;
pub mod relay;
pub mod resolve;
pub mod scoring;

pub use config::RelayConfig;
pub use relay::Relay;

/// Redirect hops followed before giving up.
pub const DEFAULT_MAX_REDIRECTS: u32 = 5;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

#[derive(Debug, Clone)]
pub struct LocalFetcher {
    client: reqwest::Client,
    max_redirects: u32,
}

impl LocalFetcher {
    pub fn new(timeout: Duration, max_redirects: u32) -> Result<Self> {
        // Redirects are followed by hand so the hop budget is ours, not reqwest's.
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Fetch(e.to_string()))?;
        Ok(Self {
            client,
            max_redirects,
        })
    }

    pub fn max_redirects(&self) -> u32 {
        self.max_redirects
    }

    /// Fetch `url`, following at most `hops` redirects.
    ///
    /// The body of whatever terminal response arrives is returned as text; a 404 page is
    /// still a page.
    pub async fn fetch_with_hops(&self, url: &str, hops: u32) -> Result<String> {
        let mut current = url::Url::parse(url)?;
        let mut remaining = hops;
        loop {
            let resp = self
                .client
                .get(current.clone())
                .header(reqwest::header::ACCEPT, ACCEPT_HTML)
                .send()
                .await
                .map_err(|e| classify(&current, e))?;

            let status = resp.status();
            let location = resp
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());

            if is_followed_redirect(status) {
                if let Some(loc) = location {
                    if remaining == 0 {
                        return Err(Error::RedirectLoop {
                            url: current.to_string(),
                        });
                    }
                    let next = current.join(&loc)?;
                    tracing::debug!(from = %current, to = %next, status = status.as_u16(), "following redirect");
                    current = next;
                    remaining -= 1;
                    continue;
                }
            }

            return resp.text().await.map_err(|e| classify(&current, e));
        }
    }
}

fn is_followed_redirect(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

fn classify(url: &url::Url, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(url.to_string())
    } else {
        Error::Fetch(e.to_string())
    }
}

#[async_trait::async_trait]
impl PageFetcher for LocalFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.fetch_with_hops(url, self.max_redirects).await
    }
}

/// Cut `s` to at most `max_chars` characters (not bytes).
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
