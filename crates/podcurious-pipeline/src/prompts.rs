//! Prompt text sent to the model.

use podcurious_core::EpisodeReference;

pub const SYSTEM_PROMPT: &str = "You are Pod Curious, a warm and knowledgeable podcast companion. You help people discover podcasts by analyzing episodes they share and building personalized playlists.

Your personality: curious, enthusiastic but not over-the-top, well-read, like a friend who always has the best podcast recommendations. You speak naturally, not in bullet points.

IMPORTANT: The total duration of playlists matters a lot. Users specify how long they want to listen, and you must build playlists that hit that target. Track running time carefully.";

pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const PLAYLIST_MAX_TOKENS: u32 = 3000;

pub fn analysis_prompt(ep: &EpisodeReference) -> String {
    format!(
        r#"Analyze this podcast episode. Respond with ONLY a JSON object, no other text, no explanation, no markdown fences.

Podcast: "{podcast}"
Episode: "{episode}"
Description: "{description}"

Your response must be exactly this JSON structure and nothing else:
{{"summary":"A 2-3 sentence description of what this episode covers, its guest, and themes.","guest":"Guest name or null","topics":["topic1","topic2","topic3"],"tone":"e.g. academic, casual, investigative","suggestedPrompt":"A natural language playlist prompt based on this episode, ending by asking how long the playlist should be."}}"#,
        podcast = ep.podcast,
        episode = ep.episode,
        description = ep.description,
    )
}

/// Hours to one decimal place, as shown next to the minute target.
pub fn hours_label(minutes: u32) -> f64 {
    (minutes as f64 / 60.0 * 10.0).round() / 10.0
}

pub fn playlist_prompt(request: &str, minutes: u32) -> String {
    format!(
        r#"Based on the user's refined request, generate a podcast playlist.

User's playlist request: "{request}"
Target total duration: {minutes} minutes (approximately {hours} hours)

CRITICAL: The episodes must add up to approximately {minutes} minutes total. Track the running time as you build the list. You can go slightly over but never significantly under.

Respond with JSON only, no markdown:
{{
  "playlistTitle": "A catchy, descriptive title for this playlist",
  "playlistDescription": "One sentence describing the listening journey",
  "targetMinutes": {minutes},
  "episodes": [
    {{
      "podcast": "Real podcast name",
      "episode": "Real episode title",
      "guest": "Guest name or null",
      "duration": 45,
      "year": "2024",
      "description": "One sentence on what this episode covers and why it fits the playlist",
      "searchQuery": "concise search query to find this on Listen Notes"
    }}
  ],
  "totalMinutes": 0,
  "note": "A brief note about the playlist arc, how the episodes flow together"
}}

Rules:
- REAL podcasts and real or representative episode titles only
- "duration" is in minutes and must be realistic for each episode
- The sum of all durations must be close to {minutes} minutes
- Order episodes in a logical listening sequence
- Each episode from a different podcast when possible
- Include a mix of well-known and lesser-known shows
- "totalMinutes" must equal the actual sum of episode durations"#,
        hours = hours_label(minutes),
    )
}
