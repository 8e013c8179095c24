use lyricsync::lyrics::LyricLine;
use lyricsync::state::LyricState;
use lyricsync::timer::PlaybackTimer;
use std::io::Write;
use std::time::Duration;

/// Shown in place of an interlude line.
pub const INTERLUDE_GLYPH: &str = "\u{266a}";

#[derive(Debug, Clone, Default)]
pub struct PipeOptions {
    /// Print words as they are sung instead of whole lines.
    pub karaoke: bool,
    /// Print the translation under each line.
    pub show_translation: bool,
    /// Wrap output to this many columns.
    pub width: Option<usize>,
}

fn wrap(text: &str, width: Option<usize>) -> Vec<String> {
    match width {
        Some(w) if w > 0 => textwrap::wrap(text, w)
            .into_iter()
            .map(|line| line.into_owned())
            .collect(),
        _ => vec![text.to_string()],
    }
}

/// Output rows for a whole line: text (or the interlude glyph), then translation.
pub fn render_line(line: &LyricLine, opts: &PipeOptions) -> Vec<String> {
    if line.is_interlude {
        return vec![INTERLUDE_GLYPH.to_string()];
    }
    let mut rows = wrap(&line.text, opts.width);
    if opts.show_translation
        && let Some(translation) = &line.translation
    {
        for part in translation.lines() {
            rows.extend(wrap(part, opts.width));
        }
    }
    rows
}

/// Number of words of `line` whose start has been reached at `position`.
pub fn sung_word_count(line: &LyricLine, position: f64) -> usize {
    line.words.partition_point(|w| w.start_time <= position)
}

/// Display lyrics in pipe mode (stdout only, for scripting), simulating playback
/// from `start` on the tokio clock.
pub async fn display_lyrics_pipe(
    lines: Vec<LyricLine>,
    start: f64,
    opts: PipeOptions,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut state = LyricState::new(lines);
    let mut timer = PlaybackTimer::default();
    timer.start(start);

    // Words already written for the current line in karaoke mode.
    let mut printed_words = 0usize;
    let mut stdout = std::io::stdout();

    loop {
        let position = timer.position();
        if state.update_index(position) {
            if opts.karaoke && printed_words > 0 {
                writeln!(stdout)?;
            }
            printed_words = 0;
            if let Some(line) = state.current()
                && (!opts.karaoke || line.words.is_empty())
            {
                for row in render_line(line, &opts) {
                    writeln!(stdout, "{}", row)?;
                }
            }
        }

        if opts.karaoke
            && let Some(line) = state.current()
            && !line.words.is_empty()
        {
            let sung = sung_word_count(line, position);
            for word in &line.words[printed_words.min(sung)..sung] {
                write!(stdout, "{}", word.text)?;
            }
            printed_words = printed_words.max(sung);
        }
        stdout.flush()?;

        match state.next_boundary(position) {
            Some(at) => {
                let wait = (at - timer.position()).max(0.0);
                tokio::time::sleep(Duration::from_secs_f64(wait)).await;
            }
            None => break,
        }
    }

    if opts.karaoke && printed_words > 0 {
        writeln!(stdout)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyricsync::lyrics::LyricWord;

    #[test]
    fn test_render_interlude_and_translation() {
        let opts = PipeOptions {
            show_translation: true,
            ..Default::default()
        };
        assert_eq!(render_line(&LyricLine::interlude(0.0, 6.0), &opts), vec!["\u{266a}"]);

        let mut line = LyricLine::plain(1.0, "你好");
        line.translation = Some("Hello".to_string());
        assert_eq!(render_line(&line, &opts), vec!["你好", "Hello"]);
        assert_eq!(render_line(&line, &PipeOptions::default()), vec!["你好"]);
    }

    #[test]
    fn test_render_wraps_to_width() {
        let opts = PipeOptions {
            width: Some(10),
            ..Default::default()
        };
        let rows = render_line(&LyricLine::plain(0.0, "one two three four"), &opts);
        assert!(rows.len() > 1);
        assert!(rows.iter().all(|r| r.chars().count() <= 10));
    }

    #[test]
    fn test_sung_word_count() {
        let mut line = LyricLine::plain(1.0, "a b");
        line.words = vec![LyricWord::new("a ", 1.0, 1.5), LyricWord::new("b", 1.5, 2.0)];
        assert_eq!(sung_word_count(&line, 0.5), 0);
        assert_eq!(sung_word_count(&line, 1.0), 1);
        assert_eq!(sung_word_count(&line, 1.7), 2);
    }
}
