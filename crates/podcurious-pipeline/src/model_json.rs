//! Getting JSON back out of model replies.
//!
//! Two tiers: [`parse_strict`] only strips Markdown fences; [`parse_recovering`] additionally
//! falls back to the outermost `{ … }` span when the model wrapped its object in prose.

use podcurious_core::{Error, Result};
use serde::de::DeserializeOwned;

/// Remove every ```` ```json ```` and ```` ``` ```` marker and trim.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// First `{` through last `}`, if both exist in that order.
pub fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

pub fn parse_strict<T: DeserializeOwned>(text: &str) -> Result<T> {
    let clean = strip_code_fences(text);
    serde_json::from_str(&clean).map_err(|e| Error::Parse(e.to_string()))
}

pub fn parse_recovering<T: DeserializeOwned>(text: &str) -> Result<T> {
    let clean = strip_code_fences(text);
    match serde_json::from_str(&clean) {
        Ok(v) => Ok(v),
        Err(direct) => {
            let Some(span) = outermost_object(&clean) else {
                return Err(Error::Parse(direct.to_string()));
            };
            serde_json::from_str(span).map_err(|e| Error::Parse(e.to_string()))
        }
    }
}
