use serde::Serialize;
use thiserror::Error;

/// Single timed word (or syllable) inside a line. Times are in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LyricWord {
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
}

impl LyricWord {
    pub fn new(text: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            text: text.into(),
            start_time,
            end_time: end_time.max(start_time),
        }
    }
}

/// Canonical lyric line handed to the playback layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LyricLine {
    /// Line start in seconds.
    pub time: f64,
    /// Gap to the next line's start, filled in by the duration pass.
    pub duration: Option<f64>,
    pub text: String,
    /// Per-word timings for karaoke rendering; empty for line-only sources.
    pub words: Vec<LyricWord>,
    pub translation: Option<String>,
    pub is_interlude: bool,
    /// True when the source carried word-level timestamps for this line.
    pub is_precise_timing: bool,
}

impl LyricLine {
    pub fn plain(time: f64, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn interlude(time: f64, duration: f64) -> Self {
        Self {
            time,
            duration: Some(duration),
            is_interlude: true,
            ..Default::default()
        }
    }

    /// Whether the line has anything to sing.
    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// End of the sung part: last word end for precise lines, otherwise unknown.
    pub fn sung_end(&self) -> Option<f64> {
        self.words.last().map(|w| w.end_time)
    }
}

/// Result of parsing one lyric blob, before translations are merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLyrics {
    pub lines: Vec<LyricLine>,
    pub has_word_timing: bool,
}

/// Final timeline plus the credit lines pulled out of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssembledLyrics {
    pub lines: Vec<LyricLine>,
    pub metadata: Vec<String>,
}

impl AssembledLyrics {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Line record used while parsing and merging; never leaves the crate.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ParsedLineData {
    pub time: f64,
    pub text: String,
    pub words: Vec<LyricWord>,
    /// Higher means more precise timing data (word tags count on top of the line tag).
    pub tag_count: usize,
    pub original_index: usize,
    /// End of the line when the source states it (word-timed headers).
    pub line_end: Option<f64>,
    pub is_metadata: bool,
}

#[derive(Error, Debug)]
pub enum LyricsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Input error: {0}")]
    Input(String),
}
