use podcurious_core::{EpisodeSearch, Error, Result, SearchCandidate, SearchQuery};
use serde::Deserialize;
use std::time::Instant;

/// Longest query text sent to the provider.
pub const MAX_QUERY_CHARS: usize = 150;

#[derive(Debug, Clone)]
pub struct ListenNotesClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ListenNotesClient {
    pub fn new(client: reqwest::Client, api_key: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url,
        }
    }

    fn endpoint_search(&self) -> String {
        format!("{}/api/v2/search", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Option<Vec<EpisodeResult>>,
}

#[derive(Debug, Deserialize)]
struct EpisodeResult {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title_original: Option<String>,
    #[serde(default)]
    description_original: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    audio: Option<String>,
    #[serde(default)]
    listennotes_url: Option<String>,
    #[serde(default)]
    podcast: Option<PodcastRef>,
}

#[derive(Debug, Deserialize)]
struct PodcastRef {
    #[serde(default)]
    title_original: Option<String>,
}

impl From<EpisodeResult> for SearchCandidate {
    fn from(r: EpisodeResult) -> Self {
        let image = r
            .image
            .filter(|s| !s.is_empty())
            .or(r.thumbnail)
            .unwrap_or_default();
        SearchCandidate {
            id: r.id.unwrap_or_default(),
            title: r.title_original.unwrap_or_default(),
            podcast_title: r
                .podcast
                .and_then(|p| p.title_original)
                .unwrap_or_default(),
            description: r.description_original.unwrap_or_default(),
            image,
            audio_url: r.audio.unwrap_or_default(),
            external_url: r.listennotes_url.unwrap_or_default(),
        }
    }
}

fn parse_search_body(body: &str) -> Result<Vec<SearchCandidate>> {
    let parsed: SearchResponse = serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            raw = %crate::truncate_chars(body, 200),
            "listen notes response was not JSON"
        );
        Error::Parse(format!("listen notes response: {e}"))
    })?;
    Ok(parsed
        .results
        .unwrap_or_default()
        .into_iter()
        .map(SearchCandidate::from)
        .collect())
}

#[async_trait::async_trait]
impl EpisodeSearch for ListenNotesClient {
    fn name(&self) -> &'static str {
        "listen_notes"
    }

    async fn search(&self, q: &SearchQuery) -> Result<Vec<SearchCandidate>> {
        let t0 = Instant::now();
        let query = crate::truncate_chars(&q.query, MAX_QUERY_CHARS);
        let sort_by_date = if q.sort_by_date { "1" } else { "0" };

        let resp = self
            .client
            .get(self.endpoint_search())
            .header("X-ListenAPI-Key", &self.api_key)
            .query(&[
                ("q", query),
                ("type", q.kind.as_str()),
                ("sort_by_date", sort_by_date),
            ])
            .send()
            .await
            .map_err(|e| Error::Search(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Search(format!("listen notes search HTTP {status}")));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| Error::Search(e.to_string()))?;
        let out = parse_search_body(&body)?;
        tracing::debug!(
            results = out.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "listen notes search"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::HeaderMap, routing::get, Json, Router};
    use std::collections::HashMap;
    use std::net::SocketAddr;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[test]
    fn parses_minimal_search_shape() {
        let js = r#"
        {
          "results": [
            {
              "id": "ep1",
              "title_original": "Episode 200",
              "description_original": "About things",
              "image": "",
              "thumbnail": "https://thumb",
              "audio": "https://audio.mp3",
              "listennotes_url": "https://www.listennotes.com/e/ep1",
              "podcast": {"title_original": "The Daily"}
            },
            {"id": "ep2"}
          ]
        }
        "#;
        let out = parse_search_body(js).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "Episode 200");
        assert_eq!(out[0].podcast_title, "The Daily");
        assert_eq!(out[0].image, "https://thumb");
        assert_eq!(out[0].external_url, "https://www.listennotes.com/e/ep1");
        assert_eq!(out[1].title, "");
    }

    #[test]
    fn missing_results_is_empty_not_an_error() {
        assert!(parse_search_body("{}").unwrap().is_empty());
    }

    #[test]
    fn non_json_body_is_a_parse_error() {
        let err = parse_search_body("<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[tokio::test]
    async fn sends_key_header_and_query_params() {
        let app = Router::new().route(
            "/api/v2/search",
            get(
                |headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
                    let key = headers
                        .get("x-listenapi-key")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    Json(serde_json::json!({
                        "results": [{
                            "id": key,
                            "title_original": q.get("q").cloned().unwrap_or_default(),
                            "podcast": {"title_original": format!(
                                "{}|{}",
                                q.get("type").cloned().unwrap_or_default(),
                                q.get("sort_by_date").cloned().unwrap_or_default()
                            )}
                        }]
                    }))
                },
            ),
        );
        let addr = serve(app).await;
        let c = ListenNotesClient::new(
            reqwest::Client::new(),
            "secret-key".to_string(),
            format!("http://{addr}/"),
        );
        let long = "x".repeat(400);
        let out = c.search(&SearchQuery::episodes(long)).await.unwrap();
        assert_eq!(out[0].id, "secret-key");
        assert_eq!(out[0].title.len(), MAX_QUERY_CHARS);
        assert_eq!(out[0].podcast_title, "episode|0");
    }

    #[tokio::test]
    async fn http_errors_surface_as_search_errors() {
        let app = Router::new().route(
            "/api/v2/search",
            get(|| async { (axum::http::StatusCode::UNAUTHORIZED, "nope") }),
        );
        let addr = serve(app).await;
        let c = ListenNotesClient::new(
            reqwest::Client::new(),
            "k".to_string(),
            format!("http://{addr}"),
        );
        let err = c.search(&SearchQuery::episodes("q")).await.unwrap_err();
        assert!(matches!(err, Error::Search(_)), "got {err:?}");
    }
}
