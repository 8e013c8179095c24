//! Duration assignment and instrumental-gap detection.

use tracing::debug;

use crate::lyrics::assemble::AssembleOptions;
use crate::lyrics::types::LyricLine;

/// Minimum silent gap, in seconds, that becomes an interlude.
pub const DEFAULT_INTERLUDE_THRESHOLD: f64 = 5.0;
/// Duration given to the last line when the track length is unknown.
pub const DEFAULT_LAST_LINE_DURATION: f64 = 5.0;

/// Set every line's `duration` to the gap before the next line. The last line runs
/// to the end of the track when known, otherwise `last_line_duration`.
pub fn process_lyrics_durations(
    lines: &mut [LyricLine],
    last_line_duration: f64,
    track_duration: Option<f64>,
) {
    for i in 0..lines.len() {
        let next_time = lines.get(i + 1).map(|next| next.time);
        let line = &mut lines[i];
        let duration = match (next_time, track_duration) {
            (Some(next), _) => next - line.time,
            (None, Some(total)) if total > line.time => total - line.time,
            (None, _) => last_line_duration,
        };
        line.duration = Some(duration.max(0.0));
    }
}

fn into_interlude(mut line: LyricLine) -> LyricLine {
    line.text.clear();
    line.words.clear();
    line.translation = None;
    line.is_interlude = true;
    line.is_precise_timing = false;
    line
}

/// A line that survived empty-line classification, plus the time of a dropped
/// empty line that closed it.
struct Kept {
    line: LyricLine,
    marked_end: Option<f64>,
}

/// Keep empty lines only where they open a gap longer than the threshold before
/// the next sung line; those become interludes. The rest are dropped, but still
/// mark where the preceding sung line ends.
fn classify_empty_lines(lines: Vec<LyricLine>, options: &AssembleOptions) -> Vec<Kept> {
    let sung_after: Vec<Option<f64>> = {
        let mut next_sung = None;
        let mut out = vec![None; lines.len()];
        for (i, line) in lines.iter().enumerate().rev() {
            out[i] = next_sung;
            if line.has_content() {
                next_sung = Some(line.time);
            }
        }
        out
    };

    let mut kept: Vec<Kept> = Vec::with_capacity(lines.len());
    let mut inside_interlude = false;
    for (line, next_sung) in lines.into_iter().zip(sung_after) {
        if line.has_content() {
            inside_interlude = false;
            kept.push(Kept {
                line,
                marked_end: None,
            });
            continue;
        }
        if inside_interlude {
            continue;
        }
        let gap = next_sung
            .or(options.track_duration)
            .map(|end| end - line.time);
        if gap.is_some_and(|gap| gap > options.interlude_threshold) {
            inside_interlude = true;
            kept.push(Kept {
                line: into_interlude(line),
                marked_end: None,
            });
        } else if let Some(prev) = kept.last_mut()
            && !prev.line.is_interlude
            && prev.marked_end.is_none()
        {
            prev.marked_end = Some(line.time);
        }
    }
    kept
}

/// End of the sung part of `kept` when the source says so: the last word of a
/// word-timed line, or an empty-line marker after it.
fn known_end(kept: &Kept) -> Option<f64> {
    kept.line
        .sung_end()
        .or(kept.marked_end)
        .map(|end| end.max(kept.line.time))
}

/// Start of the interlude between `kept` and a sung line at `next_time`, if the
/// silence between them is long enough.
///
/// With a known end the silence is measured from it. A bare line has none, so
/// the start-to-start gap is compared instead and the line is held for
/// `last_line_duration` (never reaching the next line) before the interlude.
fn interlude_before(kept: &Kept, next_time: f64, options: &AssembleOptions) -> Option<f64> {
    let threshold = options.interlude_threshold;
    if let Some(end) = known_end(kept) {
        return (next_time - end > threshold).then_some(end);
    }
    if next_time - kept.line.time <= threshold {
        return None;
    }
    Some(kept.line.time + options.last_line_duration).filter(|start| *start < next_time)
}

/// Mark and insert interludes, then assign final durations.
///
/// Interludes come from explicit empty lines, from long gaps between sung lines,
/// before the first line, and between the last sung line and the end of the
/// track (when the track duration is known).
pub fn detect_interludes(lines: Vec<LyricLine>, options: &AssembleOptions) -> Vec<LyricLine> {
    let threshold = options.interlude_threshold;
    let mut kept = classify_empty_lines(lines, options);
    let mut timeline: Vec<LyricLine> = Vec::with_capacity(kept.len() + 2);

    match kept.first_mut() {
        // An opening empty-line interlude covers the silence from 0 itself.
        Some(first) if first.line.is_interlude => first.line.time = 0.0,
        Some(first) if first.line.time > threshold => {
            timeline.push(LyricLine::interlude(0.0, first.line.time));
        }
        _ => {}
    }

    let mut iter = kept.into_iter().peekable();
    while let Some(current) = iter.next() {
        let sung = !current.line.is_interlude;
        let inserted = match iter.peek() {
            Some(next) if sung && !next.line.is_interlude => {
                interlude_before(&current, next.line.time, options)
                    .map(|start| LyricLine::interlude(start, next.line.time - start))
            }
            None if sung => options.track_duration.and_then(|total| {
                let end = known_end(&current)
                    .unwrap_or(current.line.time + options.last_line_duration);
                (total - end > threshold).then(|| LyricLine::interlude(end, total - end))
            }),
            _ => None,
        };
        timeline.push(current.line);
        timeline.extend(inserted);
    }

    process_lyrics_durations(
        &mut timeline,
        options.last_line_duration,
        options.track_duration,
    );
    debug!(
        lines = timeline.len(),
        interludes = timeline.iter().filter(|l| l.is_interlude).count(),
        "timeline durations assigned"
    );
    timeline
}
