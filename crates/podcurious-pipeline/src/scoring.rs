//! Heuristic match scoring for search hits against a model-suggested episode.
//!
//! Deliberately simple and known to be loose on short, common titles.

use podcurious_core::SearchCandidate;

/// Best scores below this are treated as "no match".
pub const MIN_MATCH_SCORE: u32 = 10;

const EXACT_TITLE: u32 = 100;
const CONTAINED_TITLE: u32 = 50;
const PER_SHARED_WORD: u32 = 5;
const PODCAST_BONUS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchTarget<'a> {
    pub podcast: &'a str,
    pub episode: &'a str,
}

pub fn score(target: &MatchTarget<'_>, c: &SearchCandidate) -> u32 {
    let want_title = target.episode.to_lowercase();
    let want_podcast = target.podcast.to_lowercase();
    let title = c.title.to_lowercase();
    let podcast = c.podcast_title.to_lowercase();

    let mut s = if title == want_title {
        EXACT_TITLE
    } else if title.contains(&want_title) || want_title.contains(&title) {
        CONTAINED_TITLE
    } else {
        let shared = want_title
            .split_whitespace()
            .filter(|w| w.chars().count() > 3)
            .filter(|w| title.contains(w))
            .count() as u32;
        shared * PER_SHARED_WORD
    };

    if podcast.contains(&want_podcast) || want_podcast.contains(&podcast) {
        s += PODCAST_BONUS;
    }
    s
}

pub fn passes_threshold(score: u32) -> bool {
    score >= MIN_MATCH_SCORE
}

/// Highest-scoring candidate; on ties the earliest wins. `None` for an empty list.
pub fn best_candidate<'c>(
    target: &MatchTarget<'_>,
    candidates: &'c [SearchCandidate],
) -> Option<(&'c SearchCandidate, u32)> {
    let mut best: Option<(&SearchCandidate, u32)> = None;
    for c in candidates {
        let s = score(target, c);
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((c, s));
        }
    }
    best
}

/// Best candidate only if it clears [`MIN_MATCH_SCORE`].
pub fn select_match<'c>(
    target: &MatchTarget<'_>,
    candidates: &'c [SearchCandidate],
) -> Option<(&'c SearchCandidate, u32)> {
    best_candidate(target, candidates).filter(|(_, s)| passes_threshold(*s))
}
