//! Link-preview metadata from raw markup.
//!
//! Pattern based on purpose: pages are often half-broken player shells, and all we want is a
//! handful of `<meta>` values. Extraction is total: anything missing comes back empty.

use podcurious_core::MetadataBundle;
use regex::Regex;
use std::sync::LazyLock;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<title[^>]*>([^<]*)</title>").expect("title regex"));

// `<meta property|name=KEY ... content=VALUE>`; either quote style.
static META_KEY_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<meta\s(?:[^>]*?\s)?(?:property|name)\s*=\s*(?:"([^"]*)"|'([^']*)')\s(?:[^>]*?\s)?content\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
    )
    .expect("meta regex")
});

// `<meta content=VALUE ... property|name=KEY>`
static META_CONTENT_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<meta\s(?:[^>]*?\s)?content\s*=\s*(?:"([^"]*)"|'([^']*)')\s(?:[^>]*?\s)?(?:property|name)\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
    )
    .expect("meta regex")
});

const ENTITIES: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&#x27;", "'"),
    ("&#x2F;", "/"),
    ("&mdash;", "\u{2014}"),
    ("&ndash;", "\u{2013}"),
    ("&hellip;", "\u{2026}"),
];

/// Decode the small fixed entity table; anything else passes through untouched.
///
/// Single pass, so `&amp;lt;` becomes `&lt;` and not `<`.
pub fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match ENTITIES.iter().find(|(ent, _)| rest.starts_with(ent)) {
            Some((ent, ch)) => {
                out.push_str(ch);
                rest = &rest[ent.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

struct MetaTag<'a> {
    key: &'a str,
    content: &'a str,
}

fn either<'a>(caps: &regex::Captures<'a>, a: usize, b: usize) -> &'a str {
    caps.get(a)
        .or_else(|| caps.get(b))
        .map(|m| m.as_str())
        .unwrap_or("")
}

/// Key-first tags come before content-first tags, each in document order.
fn meta_tags(html: &str) -> Vec<MetaTag<'_>> {
    let mut out = Vec::new();
    for caps in META_KEY_FIRST_RE.captures_iter(html) {
        out.push(MetaTag {
            key: either(&caps, 1, 2),
            content: either(&caps, 3, 4),
        });
    }
    for caps in META_CONTENT_FIRST_RE.captures_iter(html) {
        out.push(MetaTag {
            key: either(&caps, 3, 4),
            content: either(&caps, 1, 2),
        });
    }
    out
}

fn lookup(tags: &[MetaTag<'_>], key: &str) -> String {
    // An empty duplicate tag does not shadow a later one with content.
    tags.iter()
        .find(|t| t.key.trim().eq_ignore_ascii_case(key) && !t.content.is_empty())
        .map(|t| decode_entities(t.content))
        .unwrap_or_default()
}

pub fn extract_title(html: &str) -> String {
    TITLE_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| decode_entities(m.as_str().trim()))
        .unwrap_or_default()
}

pub fn extract_metadata(html: &str) -> MetadataBundle {
    let tags = meta_tags(html);
    MetadataBundle {
        title: extract_title(html),
        og_title: lookup(&tags, "og:title"),
        og_description: lookup(&tags, "og:description"),
        og_site_name: lookup(&tags, "og:site_name"),
        og_image: lookup(&tags, "og:image"),
        description: lookup(&tags, "description"),
    }
}
