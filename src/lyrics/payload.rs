//! Typed view of a lyric provider response.
//!
//! The provider answers with loosely shaped JSON:
//!
//! ```text
//! {
//!   "lrc":    { "lyric": "[00:01.00]..." },
//!   "yrc":    { "lyric": "[1000,2000](1000,500,0)..." },
//!   "tlyric": { "lyric": "[00:01.00]..." },
//!   "nolyric": true, "uncollected": false,
//!   "lyricUser": { "nickname": "..." }, "transUser": { "nickname": "..." }
//! }
//! ```
//!
//! Every field is read independently; a missing or mistyped field is treated
//! as absent.

use serde_json::Value;

use crate::lyrics::assemble::{AssembleOptions, assemble_lyrics_with};
use crate::lyrics::metadata::{is_instrumental, push_unique};
use crate::lyrics::types::{AssembledLyrics, LyricsError};

const LYRIC_CONTRIBUTOR_PREFIX: &str = "歌词贡献者";
const TRANSLATION_CONTRIBUTOR_PREFIX: &str = "翻译贡献者";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LyricsPayload {
    /// Line-timed lyrics.
    pub lrc: Option<String>,
    /// Word-timed lyrics.
    pub yrc: Option<String>,
    /// Line-timed translation.
    pub translation: Option<String>,
    /// API-level "no lyrics / instrumental" flag.
    pub instrumental: bool,
    pub lyric_contributor: Option<String>,
    pub translation_contributor: Option<String>,
}

fn text_at(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn flag_at(value: &Value, key: &str) -> bool {
    match value.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        _ => false,
    }
}

impl LyricsPayload {
    pub fn from_json(raw: &str) -> Result<Self, LyricsError> {
        let value: Value = serde_json::from_str(raw)?;
        if !value.is_object() {
            return Err(LyricsError::Input(
                "lyrics payload is not a JSON object".to_string(),
            ));
        }
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &Value) -> Self {
        Self {
            lrc: text_at(value, "/lrc/lyric"),
            yrc: text_at(value, "/yrc/lyric"),
            translation: text_at(value, "/tlyric/lyric"),
            instrumental: flag_at(value, "nolyric") || flag_at(value, "uncollected"),
            lyric_contributor: text_at(value, "/lyricUser/nickname"),
            translation_contributor: text_at(value, "/transUser/nickname"),
        }
    }

    pub fn has_lyrics(&self) -> bool {
        self.instrumental || self.lrc.is_some() || self.yrc.is_some()
    }

    /// Assemble the payload. Line-timed text is the primary source and the
    /// word-timed text the precise variant; either may stand in for the other.
    /// Contributor credits go in front of the extracted credit lines.
    pub fn assemble(&self, options: &AssembleOptions) -> AssembledLyrics {
        let (primary, word_timed) = match (&self.lrc, &self.yrc) {
            (Some(lrc), yrc) => (lrc.as_str(), yrc.as_deref()),
            (None, Some(yrc)) => (yrc.as_str(), None),
            (None, None) => ("", None),
        };
        let collapsed = self.instrumental
            || is_instrumental(primary)
            || word_timed.is_some_and(is_instrumental);
        let mut assembled = assemble_lyrics_with(
            primary,
            word_timed,
            self.translation.as_deref(),
            self.instrumental,
            options,
        );
        // Instrumental results carry only the sentinel phrase.
        if collapsed {
            return assembled;
        }

        let mut metadata = Vec::with_capacity(assembled.metadata.len() + 2);
        if let Some(name) = &self.lyric_contributor {
            push_unique(&mut metadata, format!("{LYRIC_CONTRIBUTOR_PREFIX}: {name}"));
        }
        if let Some(name) = &self.translation_contributor {
            push_unique(&mut metadata, format!("{TRANSLATION_CONTRIBUTOR_PREFIX}: {name}"));
        }
        for credit in assembled.metadata.drain(..) {
            push_unique(&mut metadata, credit);
        }
        assembled.metadata = metadata;
        assembled
    }
}
