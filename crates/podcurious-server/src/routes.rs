use crate::error::ApiError;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use podcurious_core::lenient::minutes_from_value;
use podcurious_core::{ChatMessage, Playlist};
use podcurious_pipeline::analysis::AnalyzedEpisode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Used when the client sends no usable `durationMinutes`.
pub const DEFAULT_PLAYLIST_MINUTES: u32 = 60;

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    // An empty body reads as `{}` so the missing-field message wins.
    let raw: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        &body[..]
    };
    serde_json::from_slice(raw).map_err(|e| {
        tracing::warn!(error = %e, "request body rejected");
        ApiError::bad_request("Invalid JSON")
    })
}

#[derive(Debug, Deserialize)]
struct AnalyzeBody {
    #[serde(default)]
    url: Option<String>,
}

pub async fn analyze(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AnalyzedEpisode>, ApiError> {
    let req: AnalyzeBody = parse_body(&body)?;
    let url = req.url.unwrap_or_default();
    state
        .relay
        .analyze(url.trim())
        .await
        .map(Json)
        .map_err(|e| ApiError::from_core("Failed to analyze", e))
}

#[derive(Debug, Deserialize)]
struct ChatBody {
    #[serde(default)]
    messages: Option<Vec<ChatMessage>>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

pub async fn chat(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChatReply>, ApiError> {
    let req: ChatBody = parse_body(&body)?;
    state
        .relay
        .chat(req.messages.unwrap_or_default())
        .await
        .map(|reply| Json(ChatReply { reply }))
        .map_err(|e| ApiError::from_core("Chat failed", e))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistBody {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    duration_minutes: Option<serde_json::Value>,
}

impl PlaylistBody {
    fn target_minutes(&self) -> u32 {
        match self.duration_minutes.as_ref().map(minutes_from_value) {
            Some(m) if m > 0 => m,
            _ => DEFAULT_PLAYLIST_MINUTES,
        }
    }
}

pub async fn playlist(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Playlist>, ApiError> {
    let req: PlaylistBody = parse_body(&body)?;
    let minutes = req.target_minutes();
    let prompt = req.prompt.unwrap_or_default();
    state
        .relay
        .playlist(prompt.trim(), minutes)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_core("Failed to generate playlist", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(s: &'static str) -> Bytes {
        Bytes::from_static(s.as_bytes())
    }

    #[test]
    fn duration_falls_back_to_an_hour() {
        let p: PlaylistBody = parse_body(&body(r#"{"prompt":"x"}"#)).unwrap();
        assert_eq!(p.target_minutes(), 60);
        let p: PlaylistBody = parse_body(&body(r#"{"prompt":"x","durationMinutes":"90"}"#)).unwrap();
        assert_eq!(p.target_minutes(), 90);
        let p: PlaylistBody = parse_body(&body(r#"{"prompt":"x","durationMinutes":0}"#)).unwrap();
        assert_eq!(p.target_minutes(), 60);
    }

    #[test]
    fn empty_body_is_an_empty_object() {
        let a: AnalyzeBody = parse_body(&body("")).unwrap();
        assert!(a.url.is_none());
    }

    #[test]
    fn malformed_body_is_a_bad_request() {
        let err = parse_body::<AnalyzeBody>(&body("{url:")).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid JSON");
    }
}
