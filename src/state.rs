// state.rs: Playback-position lookups over an assembled timeline

use crate::lyrics::{LyricLine, LyricWord};
use std::sync::Arc;

/// Index of the last line starting at or before `position`.
/// `None` before the first line or when times are not comparable.
pub fn index_at(lines: &[LyricLine], position: f64) -> Option<usize> {
    if lines.is_empty() || position.is_nan() || lines.iter().any(|line| line.time.is_nan()) {
        return None;
    }
    // Equal times resolve to the last of the run so repeated timestamps advance.
    match lines.partition_point(|line| line.time <= position) {
        0 => None,
        idx => Some(idx - 1),
    }
}

/// Current lines plus the highlighted index.
#[derive(Debug, Default)]
pub struct LyricState {
    pub lines: Arc<Vec<LyricLine>>,
    pub index: Option<usize>,
}

impl LyricState {
    pub fn new(lines: Vec<LyricLine>) -> Self {
        Self {
            lines: Arc::new(lines),
            index: None,
        }
    }

    pub fn update_lines(&mut self, lines: Vec<LyricLine>) {
        self.index = None;
        self.lines = Arc::new(lines);
    }

    /// Move the highlight to `position`. Returns true when the line changed.
    pub fn update_index(&mut self, position: f64) -> bool {
        let new_index = index_at(&self.lines, position);
        if new_index != self.index {
            self.index = new_index;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<&LyricLine> {
        self.index.and_then(|idx| self.lines.get(idx))
    }

    /// Word of the current line being sung at `position`, with its index.
    pub fn active_word(&self, position: f64) -> Option<(usize, &LyricWord)> {
        self.current()?
            .words
            .iter()
            .enumerate()
            .find(|(_, w)| w.start_time <= position && position < w.end_time)
    }

    /// Next instant after `position` where the display changes: a word starts or
    /// ends in the current line, or the next line begins.
    pub fn next_boundary(&self, position: f64) -> Option<f64> {
        let next_line = match self.index {
            Some(idx) => self.lines.get(idx + 1),
            None => self.lines.iter().find(|line| line.time > position),
        }
        .map(|line| line.time);

        let word_edges = self
            .current()
            .into_iter()
            .flat_map(|line| line.words.iter())
            .flat_map(|w| [w.start_time, w.end_time]);

        next_line
            .into_iter()
            .chain(word_edges)
            .filter(|t| *t > position)
            .min_by(f64::total_cmp)
    }
}
