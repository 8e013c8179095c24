//! Line and word cleanup between tokenizing and timeline assembly.
//!
//! - punctuation-only tokens are folded into the preceding word
//! - words without an end time get one from the next word (or the line end)
//! - lines sharing a rounded timestamp are collapsed, preferring the more
//!   precisely timed source

use tracing::trace;

use crate::lyrics::types::{LyricLine, LyricWord, ParsedLineData};

/// End assigned to the last word of a line when neither the word nor the line says.
pub(crate) const DEFAULT_WORD_DURATION: f64 = 1.0;

/// Round a time to hundredths of a second for equality checks and map keys.
pub(crate) fn time_key(time: f64) -> i64 {
    (time * 100.0).round() as i64
}

fn is_punctuation_char(c: char) -> bool {
    c.is_ascii_punctuation()
        || ('\u{2000}'..='\u{206F}').contains(&c)
        || ('\u{3000}'..='\u{303F}').contains(&c)
        || ('\u{FF01}'..='\u{FF0F}').contains(&c)
        || ('\u{FF1A}'..='\u{FF20}').contains(&c)
        || ('\u{FF3B}'..='\u{FF40}').contains(&c)
        || ('\u{FF5B}'..='\u{FF65}').contains(&c)
}

/// True when the token holds nothing but punctuation and whitespace.
pub fn is_punctuation(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_whitespace() || is_punctuation_char(c))
}

/// Fold punctuation-only tokens into the previous word. Leading punctuation is
/// carried onto the first real word instead.
pub fn merge_punctuation(words: Vec<LyricWord>) -> Vec<LyricWord> {
    let mut merged: Vec<LyricWord> = Vec::with_capacity(words.len());
    let mut pending: Option<LyricWord> = None;

    for mut word in words {
        if is_punctuation(&word.text) {
            match merged.last_mut().or(pending.as_mut()) {
                Some(prev) => {
                    prev.text.push_str(&word.text);
                    prev.end_time = prev.end_time.max(word.end_time);
                }
                None => pending = Some(word),
            }
            continue;
        }
        if let Some(lead) = pending.take() {
            word.text.insert_str(0, &lead.text);
            word.start_time = word.start_time.min(lead.start_time);
        }
        merged.push(word);
    }

    // A line made only of punctuation keeps it as its single word.
    if let Some(lead) = pending {
        merged.push(lead);
    }
    merged
}

/// Give zero-length words an end, then clamp so no word runs into the next one.
pub fn repair_word_end_times(words: &mut [LyricWord], line_time: f64, line_end: Option<f64>) {
    words.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
    let fallback_end = line_end.unwrap_or(line_time + DEFAULT_WORD_DURATION);

    for i in 0..words.len() {
        let next_start = words.get(i + 1).map(|w| w.start_time);
        let word = &mut words[i];
        if word.end_time <= word.start_time {
            word.end_time = next_start.unwrap_or(fallback_end).max(word.start_time);
        }
        if let Some(next) = next_start
            && word.end_time > next
        {
            word.end_time = next.max(word.start_time);
        }
    }
}

/// Collapse consecutive lines that share a rounded timestamp. Identical text keeps
/// one copy; differing text keeps the line with the higher tag count. Lines with
/// differing text and equal tag counts are all kept.
pub(crate) fn collapse_duplicates(lines: Vec<ParsedLineData>) -> Vec<ParsedLineData> {
    let mut out: Vec<ParsedLineData> = Vec::with_capacity(lines.len());
    for line in lines {
        if let Some(prev) = out.last_mut()
            && time_key(prev.time) == time_key(line.time)
            && (prev.text == line.text || prev.tag_count != line.tag_count)
        {
            if line.tag_count > prev.tag_count {
                trace!(time = line.time, dropped = %prev.text, "replacing less precise duplicate");
                *prev = line;
            } else {
                trace!(time = line.time, dropped = %line.text, "dropping duplicate line");
            }
            continue;
        }
        out.push(line);
    }
    out
}

/// Turn sorted raw records into canonical lines.
pub(crate) fn normalize_lines(raw: Vec<ParsedLineData>) -> Vec<LyricLine> {
    collapse_duplicates(raw)
        .into_iter()
        .map(|mut line| {
            repair_word_end_times(&mut line.words, line.time, line.line_end);
            let words = merge_punctuation(line.words);
            let text = if words.is_empty() {
                line.text
            } else {
                words
                    .iter()
                    .map(|w| w.text.as_str())
                    .collect::<String>()
                    .trim()
                    .to_string()
            };
            LyricLine {
                time: line.time,
                duration: None,
                text,
                is_precise_timing: !words.is_empty(),
                words,
                translation: None,
                is_interlude: false,
            }
        })
        .collect()
}
