mod ui;

use clap::Parser;
use lyricsync::lyrics::{AssembleOptions, AssembledLyrics, LyricsError, LyricsPayload};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Application configuration from CLI
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Config {
    /// Line-timed lyrics file (LRC). Optional when --payload is given.
    primary: Option<PathBuf>,
    /// Word-timed variant of the same lyrics
    #[arg(long)]
    word_timed: Option<PathBuf>,
    /// Translation lyrics file (LRC)
    #[arg(long)]
    translation: Option<PathBuf>,
    /// Provider JSON response holding lrc/yrc/tlyric instead of separate files
    #[arg(long, conflicts_with_all = ["primary", "word_timed", "translation"])]
    payload: Option<PathBuf>,
    /// Treat the track as instrumental regardless of the lyric text
    #[arg(long)]
    instrumental: bool,
    /// Minimum silent gap in seconds shown as an interlude (env: LYRICS_INTERLUDE_GAP)
    #[arg(long)]
    interlude_gap: Option<f64>,
    /// Duration in seconds of the last line when the track length is unknown
    #[arg(long, default_value_t = 5.0)]
    last_line_duration: f64,
    /// Track length in seconds
    #[arg(long)]
    track_duration: Option<f64>,
    /// Dump the assembled timeline as JSON instead of playing it
    #[arg(long)]
    json: bool,
    /// Playback position in seconds to start from
    #[arg(long, default_value_t = 0.0)]
    start: f64,
    /// Print words as they are sung
    #[arg(long)]
    karaoke: bool,
    /// Print translations under each line
    #[arg(long)]
    show_translation: bool,
    /// Wrap output to this many columns
    #[arg(long)]
    width: Option<usize>,
    /// Enable debug logging to stderr
    #[arg(long)]
    pub debug_log: bool,
}

fn interlude_gap_from_env_if_empty(cli: &mut Config) {
    if cli.interlude_gap.is_none()
        && let Ok(s) = std::env::var("LYRICS_INTERLUDE_GAP")
        && let Ok(gap) = s.trim().parse::<f64>()
        && gap.is_finite()
        && gap > 0.0
    {
        cli.interlude_gap = Some(gap);
    }
}

fn init_logging(debug_log: bool) {
    let default = if debug_log { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

impl Config {
    fn assemble_options(&self) -> AssembleOptions {
        let defaults = AssembleOptions::default();
        AssembleOptions {
            interlude_threshold: self.interlude_gap.unwrap_or(defaults.interlude_threshold),
            last_line_duration: self.last_line_duration,
            track_duration: self.track_duration.filter(|d| d.is_finite() && *d > 0.0),
        }
    }
}

async fn read_optional(path: Option<&Path>) -> Result<Option<String>, LyricsError> {
    match path {
        Some(p) => Ok(Some(tokio::fs::read_to_string(p).await?)),
        None => Ok(None),
    }
}

async fn load_lyrics(cfg: &Config) -> Result<AssembledLyrics, LyricsError> {
    let options = cfg.assemble_options();

    if let Some(path) = &cfg.payload {
        let raw = tokio::fs::read_to_string(path).await?;
        let mut payload = LyricsPayload::from_json(&raw)?;
        payload.instrumental |= cfg.instrumental;
        if !payload.has_lyrics() {
            tracing::warn!(path = %path.display(), "payload carries no lyrics");
        }
        return Ok(payload.assemble(&options));
    }

    let Some(primary_path) = cfg.primary.as_deref() else {
        return Err(LyricsError::Input(
            "either a lyrics file or --payload is required".to_string(),
        ));
    };
    let primary = tokio::fs::read_to_string(primary_path).await?;
    let word_timed = read_optional(cfg.word_timed.as_deref()).await?;
    let translation = read_optional(cfg.translation.as_deref()).await?;

    Ok(lyricsync::assemble_lyrics_with(
        &primary,
        word_timed.as_deref(),
        translation.as_deref(),
        cfg.instrumental,
        &options,
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut cfg = Config::parse();
    interlude_gap_from_env_if_empty(&mut cfg);
    init_logging(cfg.debug_log);

    let lyrics = match load_lyrics(&cfg).await {
        Ok(lyrics) => lyrics,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Err(e.into());
        }
    };
    tracing::debug!(
        lines = lyrics.lines.len(),
        credits = lyrics.metadata.len(),
        "lyrics assembled"
    );

    if cfg.json {
        println!("{}", serde_json::to_string_pretty(&lyrics)?);
        return Ok(());
    }

    for credit in &lyrics.metadata {
        eprintln!("{}", credit);
    }
    if lyrics.is_empty() {
        eprintln!("No lyrics");
        return Ok(());
    }

    let opts = ui::PipeOptions {
        karaoke: cfg.karaoke,
        show_translation: cfg.show_translation,
        width: cfg.width,
    };
    ui::display_lyrics_pipe(lyrics.lines, cfg.start, opts).await
}
