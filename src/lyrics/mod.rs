// lyrics/mod.rs - lyric parsing, credit filtering, timeline assembly and translation merge
pub mod assemble;
pub mod interlude;
pub mod metadata;
pub mod normalize;
pub mod parse;
pub mod payload;
pub mod translation;
pub mod types;

pub use assemble::{AssembleOptions, INSTRUMENTAL_TEXT, assemble_lyrics, assemble_lyrics_with};
pub use metadata::{
    INSTRUMENTAL_PHRASE, MetadataExtraction, extract_metadata_lines, is_instrumental,
    is_metadata_line,
};
pub use parse::parse_lyrics;
pub use payload::LyricsPayload;
pub use translation::merge_translations;
pub use types::{AssembledLyrics, LyricLine, LyricWord, LyricsError, ParsedLyrics};
