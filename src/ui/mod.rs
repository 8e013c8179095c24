pub mod pipe;

pub use pipe::{PipeOptions, display_lyrics_pipe};
