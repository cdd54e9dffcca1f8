//! Mention Parser
//!
//! Decides whether the text following a timestamp names a track, and if so
//! splits it into title and artist.
//!
//! **Pipeline** (any stage may reject with `None`):
//! 1. Strip leading/trailing separators (`| - : .`), index markers (`1.`) and edge emoji
//! 2. Reject noise: placeholders (`ID`, `TBA`, ...), mostly-emoji text, bad
//!    length. Reactions, ID requests and a trailing `?` only count as noise
//!    when there is no dash separator; `Gotye - Somebody That I Used To Know`
//!    is a track, `somebody know this?` is not
//! 3. Pull out the unreleased flag and a bracketed remix credit
//! 4. Try surface patterns in order: `A - B`, `A by B`, `A "B"`, `"A" - B`
//!
//! Text with no separator is never a mention. Ordinary conversation rarely
//! has one, tracklists almost always do.

use crate::config::{DashOrientation, ParserConfig};
use crate::models::MentionFragment;
use crate::services::text_normalizer::normalize;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Placeholder tokens that never identify a track (compared normalized)
const BUILTIN_NOISE_TOKENS: &[&str] = &[
    "id", "id id", "tba", "tbc", "unknown", "unknown id", "unknown artist", "unknown track",
    "intro", "outro", "track id", "trackid", "no id", "n a", "idk",
];

/// Words that on their own are reactions, not track names
const REACTION_WORDS: &[&str] = &[
    "fire", "banger", "bangers", "tune", "tunes", "heater", "vibe", "vibes", "vibing", "so",
    "what", "a", "an", "absolute", "absolutely", "massive", "insane", "amazing", "sick",
    "unreal", "huge", "crazy", "madness", "omg", "wow", "yes", "lfg", "goosebumps", "chills",
    "love", "loving", "this", "it", "that", "one", "track", "set", "mix", "such", "good",
    "great", "best", "ever", "pure", "class", "lol", "haha", "wtf", "damn", "bro", "man",
    "mate", "the", "is", "was", "of", "all", "time", "here", "we", "go", "my", "god",
    "nice", "beautiful", "perfect", "incredible", "epic", "legend", "legendary", "bomb",
];

/// Sides that are only a stop word are rejected
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "of", "this", "that", "it", "is", "in", "on", "to", "my",
    "me", "you", "song", "track", "tune", "who", "what",
];

/// Side length bounds, in characters
const SIDE_MIN_LEN: usize = 3;
const SIDE_MAX_LEN: usize = 100;

const QUOTE_CHARS: &[char] = &['\'', '"', '‘', '’', '“', '”'];
const EDGE_SEPARATORS: &[char] = &['|', '-', ':', '.', '–', '—', '~', '>', '•', '*'];

static INDEX_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d{1,3}[.)]|#\d{1,3}|\[\d{1,3}\])\s+").expect("valid regex")
});

static ELONGATED_REACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:y+e+s+|w+o+w+|o+m+g+|l+o+l+|h+a+(?:h+a+)*|f+i+r+e+|y+a+s+|l+e+t+s+g+o+)$")
        .expect("valid regex")
});

static ID_REQUEST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:any\s*(?:one|body|1)|some\s*(?:one|body)|ne1)\b.*\b(?:know|knows|got|have|has|id|name)\b|\b(?:track\s*id|song\s*name|name of (?:the|this|that) (?:track|song|tune)|what(?:'s|s| is) (?:the|this|that) (?:track|song|tune|one)|id\s*(?:please|pls|plz|\?))",
    )
    .expect("valid regex")
});

static UNRELEASED_BRACKET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[\(\[][^\(\)\[\]]*\b(?:unreleased|forthcoming|dubplate|white\s*label)\b[^\(\)\[\]]*[\)\]]",
    )
    .expect("valid regex")
});

static UNRELEASED_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:unreleased|forthcoming|dubplate|white\s*label)\b").expect("valid regex")
});

static LONE_VIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[\(\[]\s*vip\s*[\)\]]").expect("valid regex"));

static VIP_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bVIP\b").expect("valid regex"));

static REMIX_BRACKET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[\(\[]([^\(\)\[\]]*?\b(?:remix|edit|vip|dub|bootleg|rework|flip|version|mix|refix)\b[^\(\)\[\]]*)[\)\]]",
    )
    .expect("valid regex")
});

/// `<name> Remix` style credit occupying a whole dash side
static BARE_REMIX_CREDIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.+?)\s+(remix|edit|vip|dub|bootleg|rework|flip|version)$")
        .expect("valid regex")
});

static REMIX_CREDIT_PARTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.*?)\s*\b(remix|edit|vip|dub|bootleg|rework|flip|version|mix|refix)$")
        .expect("valid regex")
});

static FEATURING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+[\(\[]?(?:feat\.?|ft\.?|featuring)\s+([^\(\)\[\]]+?)[\)\]]?$")
        .expect("valid regex")
});

static DASH_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)(?:\s+-+\s+|\s*[–—]\s*)(.+)$").expect("valid regex"));

static BY_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.+?)\s+by\s+(.+)$").expect("valid regex"));

static ARTIST_QUOTED_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(.+?)\s+['"‘“](.+?)['"’”]$"#).expect("valid regex")
});

static QUOTED_TITLE_DASH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^['"‘“](.+?)['"’”]\s*[-–—]+\s*(.+)$"#).expect("valid regex")
});

static FULLY_QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^['"‘“].+['"’”]$"#).expect("valid regex"));

static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").expect("valid regex"));

static EMPTY_BRACKETS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\(\[]\s*[\)\]]").expect("valid regex"));

/// Title/artist split produced by a surface pattern
struct SurfaceSplit {
    title: String,
    artist: String,
    /// Remix credit that decided the orientation, if any
    remix_credit: Option<String>,
}

/// Mention Parser
///
/// One parser serves every source; the noise list and the default dash
/// orientation are configuration.
pub struct MentionParser {
    config: ParserConfig,
    noise_tokens: HashSet<String>,
}

impl Default for MentionParser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl MentionParser {
    /// Create parser with built-in noise tokens plus `config.extra_noise_tokens`
    pub fn new(config: ParserConfig) -> Self {
        let noise_tokens = BUILTIN_NOISE_TOKENS
            .iter()
            .map(|t| t.to_string())
            .chain(config.extra_noise_tokens.iter().map(|t| normalize(t)))
            .filter(|t| !t.is_empty())
            .collect();

        Self {
            config,
            noise_tokens,
        }
    }

    /// Parse the text following a timestamp
    ///
    /// # Returns
    /// `Some(fragment)` if the text names a track, `None` for noise
    pub fn parse(&self, text: &str) -> Option<MentionFragment> {
        if is_mostly_emoji(text) {
            tracing::debug!(text = %text, "Rejected: mostly emoji");
            return None;
        }

        let stripped = strip_edges(text);

        if let Some(reason) = self.noise_reason(&stripped) {
            tracing::debug!(text = %stripped, reason, "Rejected as noise");
            return None;
        }

        let (remaining, is_unreleased) = extract_unreleased(&stripped);
        let bracket_remix = REMIX_BRACKET
            .captures(&remaining)
            .map(|caps| caps[1].trim().to_string());

        let Some(split) = self.split_surface(&remaining) else {
            tracing::debug!(text = %remaining, "Rejected: no title/artist separator");
            return None;
        };

        let (artist, featured_artist) = split_featuring(&split.artist);

        if !self.is_valid_side(&split.title) || !self.is_valid_side(&artist) {
            tracing::debug!(
                title = %split.title,
                artist = %artist,
                "Rejected: side failed validation"
            );
            return None;
        }

        Some(MentionFragment {
            title: split.title,
            artist,
            featured_artist,
            remix_info: split.remix_credit.or(bracket_remix),
            is_unreleased,
        })
    }

    /// Why `text` is noise, if it is
    fn noise_reason(&self, text: &str) -> Option<&'static str> {
        let normalized = normalize(text);
        let length = normalized.chars().count();

        if length < self.config.min_length {
            return Some("too short");
        }
        if length > self.config.max_length {
            return Some("too long");
        }
        if self.noise_tokens.contains(&normalized) {
            return Some("placeholder token");
        }

        let has_dash = has_dash_separator(text);
        if !has_dash && normalized.split(' ').all(is_reaction_word) {
            return Some("reaction");
        }
        if (!has_dash || text.contains('?')) && ID_REQUEST.is_match(text) {
            return Some("ID request");
        }
        if text.ends_with('?') && !has_dash && !BY_SPLIT.is_match(text) {
            return Some("question");
        }

        None
    }

    /// Try the surface patterns in order
    fn split_surface(&self, text: &str) -> Option<SurfaceSplit> {
        if let Some(caps) = DASH_SPLIT.captures(text) {
            let left = caps[1].trim();
            let right = caps[2].trim();
            // `"Title" - Artist` is handled by the quoted-title pattern below
            if !FULLY_QUOTED.is_match(left) {
                return Some(self.orient_dash(left, right));
            }
        }

        if let Some(caps) = BY_SPLIT.captures(text) {
            return Some(SurfaceSplit {
                title: clean_side(&caps[1]),
                artist: clean_side(&caps[2]),
                remix_credit: None,
            });
        }

        if let Some(caps) = ARTIST_QUOTED_TITLE.captures(text) {
            return Some(SurfaceSplit {
                title: clean_side(&caps[2]),
                artist: clean_side(&caps[1]),
                remix_credit: None,
            });
        }

        if let Some(caps) = QUOTED_TITLE_DASH.captures(text) {
            return Some(SurfaceSplit {
                title: clean_side(&caps[1]),
                artist: clean_side(&caps[2]),
                remix_credit: None,
            });
        }

        None
    }

    /// Decide which side of `left - right` is the title
    ///
    /// 1. A side that is a bare `<name> Remix` credit: the other side is the
    ///    title, the credit is appended to it and `<name>` becomes the artist
    /// 2. A side carrying a bracketed remix credit is the title
    /// 3. Otherwise the configured default orientation
    fn orient_dash(&self, left: &str, right: &str) -> SurfaceSplit {
        let left = clean_side(left);
        let right = clean_side(right);

        let left_credit = bare_remix_credit(&left);
        let right_credit = bare_remix_credit(&right);

        match (left_credit, right_credit) {
            (None, Some(remixer)) => {
                return SurfaceSplit {
                    title: format!("{} ({})", left, right),
                    artist: remixer,
                    remix_credit: Some(right),
                };
            }
            (Some(remixer), None) => {
                return SurfaceSplit {
                    title: format!("{} ({})", right, left),
                    artist: remixer,
                    remix_credit: Some(left),
                };
            }
            _ => {}
        }

        let left_bracket = REMIX_BRACKET.is_match(&left);
        let right_bracket = REMIX_BRACKET.is_match(&right);

        let title_on_left = match (left_bracket, right_bracket) {
            (true, false) => true,
            (false, true) => false,
            _ => self.config.default_orientation == DashOrientation::TitleArtist,
        };

        if title_on_left {
            SurfaceSplit {
                title: left,
                artist: right,
                remix_credit: None,
            }
        } else {
            SurfaceSplit {
                title: right,
                artist: left,
                remix_credit: None,
            }
        }
    }

    /// Length 3..=100, at least two letters, not a lone stop word or placeholder
    fn is_valid_side(&self, side: &str) -> bool {
        let length = side.chars().count();
        if !(SIDE_MIN_LEN..=SIDE_MAX_LEN).contains(&length) {
            return false;
        }

        if side.chars().filter(|c| c.is_alphabetic()).count() < 2 {
            return false;
        }

        let normalized = normalize(side);
        if STOP_WORDS.contains(&normalized.as_str()) {
            return false;
        }
        if self.noise_tokens.contains(&normalized) {
            return false;
        }
        // A single reaction word ("fire", "wow") is not a name
        normalized.contains(' ') || !is_reaction_word(&normalized)
    }
}

/// Split a remix credit into remixer and remix type
///
/// `"Franky Rizardo Remix"` → `(Some("Franky Rizardo"), Some("Remix"))`;
/// generic versions such as `"Extended Mix"` have no remixer.
pub fn split_remix_credit(info: &str) -> (Option<String>, Option<String>) {
    const GENERIC: &[&str] = &[
        "", "original", "extended", "radio", "club", "instrumental", "vocal", "dub", "short",
        "long", "12", "7", "album", "single", "live",
    ];

    let info = info.trim();
    let Some(caps) = REMIX_CREDIT_PARTS.captures(info) else {
        return (None, None);
    };

    let raw = caps[1].trim();
    let name = raw
        .strip_suffix("'s")
        .or_else(|| raw.strip_suffix("’s"))
        .unwrap_or(raw);
    let kind = caps[2].to_string();

    if GENERIC.contains(&normalize(name).as_str()) {
        return (None, Some(info.to_string()));
    }

    (Some(name.trim().to_string()), Some(kind))
}

fn bare_remix_credit(side: &str) -> Option<String> {
    if side.contains(['(', '[']) {
        return None;
    }
    let caps = BARE_REMIX_CREDIT.captures(side)?;
    let name = caps[1].trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Split `Artist feat. Other` into `("Artist", Some("Other"))`
fn split_featuring(artist: &str) -> (String, Option<String>) {
    match FEATURING.captures(artist) {
        Some(caps) => {
            let featured = caps[1].trim().to_string();
            let start = caps.get(0).map(|m| m.start()).unwrap_or(artist.len());
            let primary = artist[..start].trim().to_string();
            if primary.is_empty() || featured.is_empty() {
                (artist.to_string(), None)
            } else {
                (primary, Some(featured))
            }
        }
        None => (artist.to_string(), None),
    }
}

/// Strip unreleased qualifiers, returning the cleaned text and the flag
fn extract_unreleased(text: &str) -> (String, bool) {
    let mut flagged = VIP_WORD.is_match(text);
    let mut current = text.to_string();

    for pattern in [&*UNRELEASED_BRACKET, &*LONE_VIP, &*UNRELEASED_WORD] {
        if pattern.is_match(&current) {
            flagged = true;
            current = pattern.replace_all(&current, " ").into_owned();
        }
    }

    if !flagged {
        return (current, false);
    }

    let cleaned = EMPTY_BRACKETS.replace_all(&current, " ");
    let cleaned = MULTI_SPACE.replace_all(&cleaned, " ");
    (strip_edges(&cleaned), true)
}

/// Trim separators, index markers, edge emoji and whitespace
fn strip_edges(text: &str) -> String {
    let trimmed = text.trim_matches(is_edge_char);
    let without_index = INDEX_MARKER.replace(trimmed, "");
    without_index.trim_matches(is_edge_char).to_string()
}

fn is_edge_char(c: char) -> bool {
    c.is_whitespace()
        || EDGE_SEPARATORS.contains(&c)
        || (!c.is_ascii() && !c.is_alphanumeric() && !QUOTE_CHARS.contains(&c))
}

/// Trim a side and remove wrapping quotes
fn clean_side(side: &str) -> String {
    let trimmed = side.trim().trim_matches(is_edge_char);
    let unquoted = if FULLY_QUOTED.is_match(trimmed) {
        trimmed.trim_matches(QUOTE_CHARS)
    } else {
        trimmed
    };
    MULTI_SPACE.replace_all(unquoted.trim(), " ").into_owned()
}

/// `A - B` or `"A" - B`: the shape of an answer rather than a question
fn has_dash_separator(text: &str) -> bool {
    DASH_SPLIT.is_match(text) || QUOTED_TITLE_DASH.is_match(text)
}

fn is_reaction_word(word: &str) -> bool {
    REACTION_WORDS.contains(&word) || ELONGATED_REACTION.is_match(word)
}

/// More than half of the non-whitespace characters are emoji/symbols
fn is_mostly_emoji(text: &str) -> bool {
    let mut total = 0usize;
    let mut symbols = 0usize;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        if !c.is_ascii() && !c.is_alphanumeric() && !QUOTE_CHARS.contains(&c) {
            symbols += 1;
        }
    }
    total > 0 && symbols * 2 > total
}
