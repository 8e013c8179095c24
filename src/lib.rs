//! Lyrics engine: parses line-timed (LRC) and word-timed lyric text, strips
//! credit lines, marks instrumental gaps and aligns an independently timed
//! translation, producing one ordered timeline for playback highlighting.
//!
//! Everything under [`lyrics`] is synchronous and stateless. [`state`] and
//! [`timer`] map a playback position onto the assembled timeline.

pub mod lyrics;
pub mod state;
pub mod timer;

pub use lyrics::{
    AssembleOptions, AssembledLyrics, LyricLine, LyricWord, LyricsError, LyricsPayload,
    assemble_lyrics, assemble_lyrics_with, extract_metadata_lines, merge_translations,
    parse_lyrics,
};
