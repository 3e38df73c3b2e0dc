use crate::AppState;
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use std::path::{Component, Path, PathBuf};

/// Map a request path onto the content root. `None` for anything that would leave it.
fn resolve(root: &Path, uri_path: &str) -> Option<PathBuf> {
    let rel = uri_path.trim_start_matches('/');
    let rel = if rel.is_empty() { "index.html" } else { rel };
    let rel = Path::new(rel);
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(root.join(rel))
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

/// Serve a file from the content root; `/` is `index.html`. No SPA fallback.
pub async fn serve(State(state): State<AppState>, uri: Uri) -> Response {
    let Some(path) = resolve(&state.static_dir, uri.path()) else {
        return not_found();
    };
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&path).first_or_text_plain();
            ([(header::CONTENT_TYPE, mime.as_ref())], bytes).into_response()
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "static miss");
            not_found()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_index_and_traversal_is_refused() {
        let root = Path::new("/srv/public");
        assert_eq!(resolve(root, "/"), Some(root.join("index.html")));
        assert_eq!(resolve(root, "/app.js"), Some(root.join("app.js")));
        assert_eq!(resolve(root, "/img/logo.svg"), Some(root.join("img/logo.svg")));
        assert_eq!(resolve(root, "/../secret"), None);
        assert_eq!(resolve(root, "/img/../../secret"), None);
    }
}
