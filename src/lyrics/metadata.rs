use once_cell::sync::Lazy;
use regex::Regex;

use crate::lyrics::parse::decode_json_line;

/// Credit keywords that open a non-lyric line, e.g. `作词: someone` or `Composer：someone`.
const METADATA_KEYWORDS: &[&str] = &[
    "歌词贡献者",
    "翻译贡献者",
    "作词",
    "作曲",
    "编曲",
    "制作",
    "词曲",
    "词 / 曲",
    "author",
    "lyricist",
    "composer",
    "arranger",
    "arrange",
    "producer",
    "translator",
    "translation",
];

/// Phrase the provider puts in place of lyrics for instrumental tracks.
pub const INSTRUMENTAL_PHRASE: &str = "纯音乐，请欣赏";

const INSTRUMENTAL_MARKERS: &[&str] = &[INSTRUMENTAL_PHRASE, "Pure Music"];

static METADATA_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    let keywords = METADATA_KEYWORDS
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)^(?:{keywords})\s*[:：]")).unwrap()
});

/// `clean` is the blob without credit lines; `metadata` the credits in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataExtraction {
    pub clean: String,
    pub metadata: Vec<String>,
}

/// Strip the run of leading `[...]` tags from a line.
fn strip_leading_tags(line: &str) -> &str {
    let mut rest = line.trim_start();
    while rest.starts_with('[') {
        match rest.find(']') {
            Some(close) => rest = rest[close + 1..].trim_start(),
            None => break,
        }
    }
    rest
}

/// The credit text carried by `line`, if it is a metadata line.
fn metadata_text(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(json) = decode_json_line(trimmed) {
        let content = json.text();
        let content = content.trim();
        return METADATA_KEYWORD_RE
            .is_match(content)
            .then(|| content.to_string());
    }
    let content = strip_leading_tags(trimmed).trim();
    METADATA_KEYWORD_RE
        .is_match(content)
        .then(|| content.to_string())
}

/// Whether a line (raw, tagged or JSON-wrapped) is a credit line rather than lyrics.
pub fn is_metadata_line(text: &str) -> bool {
    metadata_text(text).is_some()
}

/// Whether the raw content announces an instrumental track.
pub fn is_instrumental(content: &str) -> bool {
    INSTRUMENTAL_MARKERS
        .iter()
        .any(|marker| content.contains(marker))
}

pub(crate) fn push_unique(list: &mut Vec<String>, item: String) {
    if !item.is_empty() && !list.contains(&item) {
        list.push(item);
    }
}

/// Split a raw lyric blob into lyric lines and credit lines. Blank lines are dropped.
pub fn extract_metadata_lines(content: &str) -> MetadataExtraction {
    let mut metadata = Vec::new();
    let mut body = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match metadata_text(line) {
            Some(credit) => push_unique(&mut metadata, credit),
            None => body.push(line),
        }
    }

    MetadataExtraction {
        clean: body.join("\n").trim().to_string(),
        metadata,
    }
}
