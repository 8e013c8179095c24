use tracing::debug;

use crate::lyrics::interlude::{
    DEFAULT_INTERLUDE_THRESHOLD, DEFAULT_LAST_LINE_DURATION, detect_interludes,
    process_lyrics_durations,
};
use crate::lyrics::metadata::{
    INSTRUMENTAL_PHRASE, extract_metadata_lines, is_instrumental, push_unique,
};
use crate::lyrics::parse::parse_lyrics;
use crate::lyrics::translation::merge_translations;
use crate::lyrics::types::{AssembledLyrics, LyricLine, ParsedLyrics};

/// Text of the single line produced for instrumental tracks.
pub const INSTRUMENTAL_TEXT: &str = "Instrumental";

/// Tunables for timeline assembly. All times are in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembleOptions {
    /// Silent gaps longer than this become interludes.
    pub interlude_threshold: f64,
    /// Duration of the last line when the track length is unknown.
    pub last_line_duration: f64,
    /// Track length, when the player knows it.
    pub track_duration: Option<f64>,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            interlude_threshold: DEFAULT_INTERLUDE_THRESHOLD,
            last_line_duration: DEFAULT_LAST_LINE_DURATION,
            track_duration: None,
        }
    }
}

fn non_empty(content: Option<&str>) -> Option<&str> {
    content.filter(|c| !c.trim().is_empty())
}

fn instrumental_lyrics(options: &AssembleOptions) -> AssembledLyrics {
    let mut lines = vec![LyricLine::plain(0.0, INSTRUMENTAL_TEXT)];
    process_lyrics_durations(&mut lines, options.last_line_duration, options.track_duration);
    AssembledLyrics {
        lines,
        metadata: vec![INSTRUMENTAL_PHRASE.to_string()],
    }
}

/// A word-timed variant with actual word timing replaces the primary outright.
fn select_base(primary: ParsedLyrics, word_timed: Option<ParsedLyrics>) -> ParsedLyrics {
    match word_timed {
        Some(variant) if variant.has_word_timing => {
            debug!(lines = variant.lines.len(), "using word-timed lyrics as base");
            variant
        }
        Some(variant) if primary.lines.is_empty() => {
            debug!("primary lyrics empty, falling back to word-timed variant");
            variant
        }
        _ => primary,
    }
}

/// Build the playable timeline with the default options.
pub fn assemble_lyrics(
    primary: &str,
    word_timed: Option<&str>,
    translation: Option<&str>,
    instrumental_hint: bool,
) -> AssembledLyrics {
    assemble_lyrics_with(
        primary,
        word_timed,
        translation,
        instrumental_hint,
        &AssembleOptions::default(),
    )
}

/// Build the playable timeline: filter credits, parse, pick the most precise
/// source, mark interludes and attach translations. Never fails; bad input
/// yields fewer (possibly zero) lines.
pub fn assemble_lyrics_with(
    primary: &str,
    word_timed: Option<&str>,
    translation: Option<&str>,
    instrumental_hint: bool,
    options: &AssembleOptions,
) -> AssembledLyrics {
    let word_timed = non_empty(word_timed);
    if instrumental_hint || is_instrumental(primary) || word_timed.is_some_and(is_instrumental) {
        debug!(hint = instrumental_hint, "collapsing to instrumental line");
        return instrumental_lyrics(options);
    }

    let primary = extract_metadata_lines(primary);
    let word_variant = word_timed.map(extract_metadata_lines);
    let translation = non_empty(translation).map(extract_metadata_lines);

    let mut metadata = Vec::new();
    for extraction in [Some(&primary), word_variant.as_ref(), translation.as_ref()]
        .into_iter()
        .flatten()
    {
        for credit in &extraction.metadata {
            push_unique(&mut metadata, credit.clone());
        }
    }

    let base = select_base(
        parse_lyrics(&primary.clean),
        word_variant.as_ref().map(|v| parse_lyrics(&v.clean)),
    );
    if !base.lines.iter().any(LyricLine::has_content) {
        debug!("no sung lines found");
        return AssembledLyrics {
            lines: Vec::new(),
            metadata,
        };
    }

    let lines = detect_interludes(base.lines, options);
    let lines = merge_translations(
        lines,
        translation.as_ref().map(|t| t.clean.as_str()),
    );
    AssembledLyrics { lines, metadata }
}
