use serde::Deserialize;
use tracing::trace;

use crate::lyrics::metadata::is_metadata_line;
use crate::lyrics::normalize::normalize_lines;
use crate::lyrics::types::{LyricWord, ParsedLineData, ParsedLyrics};

/// JSON-wrapped line as emitted by word-timed providers for credits:
/// `{"t":0,"c":[{"tx":"作词: "},{"tx":"someone"}]}`.
#[derive(Debug, Deserialize)]
pub(crate) struct JsonLine {
    #[serde(default)]
    t: Option<f64>,
    c: Vec<JsonChunk>,
}

#[derive(Debug, Deserialize)]
struct JsonChunk {
    #[serde(default)]
    tx: Option<String>,
}

impl JsonLine {
    pub(crate) fn text(&self) -> String {
        self.c.iter().filter_map(|chunk| chunk.tx.as_deref()).collect()
    }

    fn time(&self) -> f64 {
        self.t
            .filter(|t| t.is_finite() && *t >= 0.0)
            .map(|t| t / 1000.0)
            .unwrap_or(0.0)
    }
}

/// Decode a JSON-wrapped line. Anything that is not an object with a `c` array
/// yields `None` and is handled as plain text by the caller.
pub(crate) fn decode_json_line(line: &str) -> Option<JsonLine> {
    let trimmed = line.trim();
    if !trimmed.starts_with('{') || !trimmed.ends_with('}') {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

/// One bracketed tag at the start of a line.
#[derive(Debug, Clone, PartialEq)]
enum Tag {
    /// `[mm:ss.xx]`
    Time(f64),
    /// `[startMs,durationMs]` header of word-timed lines.
    Span { start: f64, end: f64 },
    /// `[ar:Artist]`, `[offset:+200]`, ...
    Id { key: String, value: String },
}

#[derive(Debug, PartialEq)]
enum TagParse {
    Tag(Tag),
    Malformed,
    NotATag,
}

/// What the leading tags of a physical line amount to.
#[derive(Debug, PartialEq)]
enum LineHeader<'a> {
    Timed {
        times: Vec<f64>,
        line_end: Option<f64>,
        body: &'a str,
    },
    Id {
        key: String,
        value: String,
    },
    Untagged,
}

fn parse_digits(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Parse `mm:ss`, `mm:ss.x`, `mm:ss.xx`, `mm:ss.xxx` (or `:` before the fraction) into seconds.
pub(crate) fn parse_timestamp(raw: &str) -> Option<f64> {
    let (minutes, rest) = raw.trim().split_once(':')?;
    let (seconds, fraction) = match rest.split_once(['.', ':']) {
        Some((s, f)) => (s, Some(f)),
        None => (rest, None),
    };
    let minutes = parse_digits(minutes)?;
    let seconds = parse_digits(seconds)?;
    let fraction = match fraction {
        None => 0.0,
        Some(f) if (1..=3).contains(&f.len()) => {
            parse_digits(f)? as f64 / 10f64.powi(f.len() as i32)
        }
        Some(_) => return None,
    };
    Some(minutes as f64 * 60.0 + seconds as f64 + fraction)
}

fn classify_tag(inner: &str) -> TagParse {
    if let Some((key, value)) = inner.split_once(':') {
        let key = key.trim();
        if !key.is_empty() && key.chars().all(|c| c.is_ascii_alphabetic()) {
            return TagParse::Tag(Tag::Id {
                key: key.to_ascii_lowercase(),
                value: value.trim().to_string(),
            });
        }
        return match parse_timestamp(inner) {
            Some(t) => TagParse::Tag(Tag::Time(t)),
            None => TagParse::Malformed,
        };
    }
    if let Some((start, duration)) = inner.split_once(',') {
        let start = parse_digits(start.trim());
        let end = start
            .zip(parse_digits(duration.trim()))
            .and_then(|(start, duration)| start.checked_add(duration));
        return match (start, end) {
            (Some(start), Some(end)) => TagParse::Tag(Tag::Span {
                start: start as f64 / 1000.0,
                end: end as f64 / 1000.0,
            }),
            _ => TagParse::Malformed,
        };
    }
    TagParse::NotATag
}

/// Consume the run of leading tags. A malformed tag is dropped on its own and
/// scanning continues with the next one.
fn scan_header(line: &str) -> LineHeader<'_> {
    let mut rest = line;
    let mut times = Vec::new();
    let mut line_end = None;

    while rest.starts_with('[') {
        let Some(close) = rest.find(']') else {
            break;
        };
        match classify_tag(&rest[1..close]) {
            TagParse::Tag(Tag::Time(t)) => times.push(t),
            TagParse::Tag(Tag::Span { start, end }) => {
                times.push(start);
                line_end = Some(end);
            }
            TagParse::Tag(Tag::Id { key, value }) => {
                if times.is_empty() {
                    return LineHeader::Id { key, value };
                }
                break;
            }
            TagParse::Malformed => trace!(tag = &rest[..=close], "skipping malformed tag"),
            TagParse::NotATag => break,
        }
        rest = &rest[close + 1..];
    }

    if times.is_empty() {
        LineHeader::Untagged
    } else {
        LineHeader::Timed {
            times,
            line_end,
            body: rest,
        }
    }
}

/// Parse an inline word tag at the start of `rest`: `(startMs,durationMs,flag)` or `<mm:ss.xx>`.
/// Returns (start, end, consumed bytes); `end == start` when the source gives no end.
fn parse_word_tag(rest: &str) -> Option<(f64, f64, usize)> {
    if rest.starts_with('(') {
        let close = rest.find(')')?;
        let mut parts = rest[1..close].split(',');
        let start = parse_digits(parts.next()?.trim())?;
        let duration = parse_digits(parts.next()?.trim())?;
        parse_digits(parts.next()?.trim())?;
        if parts.next().is_some() {
            return None;
        }
        let end = start.checked_add(duration)?;
        return Some((start as f64 / 1000.0, end as f64 / 1000.0, close + 1));
    }
    if rest.starts_with('<') {
        let close = rest.find('>')?;
        let t = parse_timestamp(&rest[1..close])?;
        return Some((t, t, close + 1));
    }
    None
}

/// Split a line body into timed words. `None` when the body has no word tags.
fn parse_words(body: &str) -> Option<Vec<LyricWord>> {
    let mut words: Vec<LyricWord> = Vec::new();
    let mut leading = String::new();
    let mut rest = body;

    while let Some(ch) = rest.chars().next() {
        if let Some((start, end, consumed)) = parse_word_tag(rest) {
            words.push(LyricWord::new(String::new(), start, end));
            rest = &rest[consumed..];
            continue;
        }
        match words.last_mut() {
            Some(word) => word.text.push(ch),
            None => leading.push(ch),
        }
        rest = &rest[ch.len_utf8()..];
    }

    let first = words.first_mut()?;
    if !leading.trim().is_empty() {
        first.text.insert_str(0, leading.trim_start());
    }
    Some(words)
}

fn shift_words(words: &[LyricWord], delta: f64) -> Vec<LyricWord> {
    words
        .iter()
        .map(|w| LyricWord {
            text: w.text.clone(),
            start_time: (w.start_time + delta).max(0.0),
            end_time: (w.end_time + delta).max(0.0),
        })
        .collect()
}

/// Tokenize a lyric blob into raw line records, stably sorted by (time, input order).
pub(crate) fn parse_raw_lines(content: &str) -> Vec<ParsedLineData> {
    let mut lines = Vec::new();
    // LRC `[offset:ms]`: positive values make lyrics appear earlier.
    let mut offset = 0.0;

    for (original_index, raw) in content.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(json) = decode_json_line(trimmed) {
            let text = json.text().trim().to_string();
            lines.push(ParsedLineData {
                time: (json.time() - offset).max(0.0),
                is_metadata: is_metadata_line(trimmed),
                text,
                words: Vec::new(),
                tag_count: 1,
                original_index,
                line_end: None,
            });
            continue;
        }

        let (times, line_end, body) = match scan_header(trimmed) {
            LineHeader::Timed {
                times,
                line_end,
                body,
            } => (times, line_end, body),
            LineHeader::Id { key, value } => {
                if key == "offset" {
                    match value.parse::<f64>() {
                        Ok(ms) if ms.is_finite() => offset = ms / 1000.0,
                        _ => trace!(value = %value, "ignoring unparsable offset tag"),
                    }
                }
                continue;
            }
            LineHeader::Untagged => continue,
        };

        let words = parse_words(body).unwrap_or_default();
        let text = if words.is_empty() {
            body.trim().to_string()
        } else {
            words
                .iter()
                .map(|w| w.text.as_str())
                .collect::<String>()
                .trim()
                .to_string()
        };
        let tag_count = 1 + words.len();
        let is_metadata = is_metadata_line(&text);
        let first_time = times[0];

        for time in times {
            let delta = time - first_time - offset;
            lines.push(ParsedLineData {
                time: (time - offset).max(0.0),
                text: text.clone(),
                words: shift_words(&words, delta),
                tag_count,
                original_index,
                line_end: line_end.map(|end| (end + delta).max(0.0)),
                is_metadata,
            });
        }
    }

    lines.sort_by(|a, b| {
        a.time
            .total_cmp(&b.time)
            .then(a.original_index.cmp(&b.original_index))
    });
    lines
}

/// Parse one lyric blob (line-tagged, word-tagged or a mix of both) into
/// normalized lines. Credit lines are dropped; malformed tags are skipped.
pub fn parse_lyrics(content: &str) -> ParsedLyrics {
    let raw: Vec<ParsedLineData> = parse_raw_lines(content)
        .into_iter()
        .filter(|line| !line.is_metadata)
        .collect();
    let lines = normalize_lines(raw);
    let has_word_timing = lines.iter().any(|line| line.is_precise_timing);
    ParsedLyrics {
        lines,
        has_word_timing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("00:12"), Some(12.0));
        assert_eq!(parse_timestamp("01:30.5"), Some(90.5));
        assert_eq!(parse_timestamp("00:12.34"), Some(12.34));
        assert_eq!(parse_timestamp("00:12.340"), Some(12.34));
        assert_eq!(parse_timestamp("00:12:34"), Some(12.34));
        assert_eq!(parse_timestamp("00:1a.00"), None);
        assert_eq!(parse_timestamp("00:12.3456"), None);
    }

    #[test]
    fn test_line_tags_and_sorting() {
        let parsed = parse_lyrics("[00:05.00]World\n[00:01.00]Hello\nno tag here");
        assert_eq!(parsed.lines.len(), 2);
        assert_eq!(parsed.lines[0].time, 1.0);
        assert_eq!(parsed.lines[0].text, "Hello");
        assert_eq!(parsed.lines[1].time, 5.0);
        assert!(!parsed.has_word_timing);
        assert!(!parsed.lines[0].is_precise_timing);
    }

    #[test]
    fn test_repeated_timestamps_copy_text() {
        let parsed = parse_lyrics("[00:10.00][00:30.00]Chorus\n[00:20.00]Verse");
        let texts: Vec<_> = parsed.lines.iter().map(|l| (l.time, l.text.as_str())).collect();
        assert_eq!(
            texts,
            vec![(10.0, "Chorus"), (20.0, "Verse"), (30.0, "Chorus")]
        );
    }

    #[test]
    fn test_equal_times_keep_input_order() {
        let raw = parse_raw_lines("[00:03.00]first\n[00:01.00]early\n[00:03.00]second");
        let texts: Vec<_> = raw.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["early", "first", "second"]);
    }

    #[test]
    fn test_malformed_tag_is_skipped_not_the_line() {
        let parsed = parse_lyrics("[00:1x.00][00:12.00]Still here\n[zz:00.00]\n[00:15.00]Next");
        assert_eq!(parsed.lines.len(), 2);
        assert_eq!(parsed.lines[0].time, 12.0);
        assert_eq!(parsed.lines[0].text, "Still here");
    }

    #[test]
    fn test_oversized_timing_numbers_do_not_overflow() {
        let parsed = parse_lyrics("[18446744073709551615,10]hi\n[00:02.00]ok");
        assert_eq!(parsed.lines.len(), 1);
        assert_eq!(parsed.lines[0].text, "ok");

        let parsed = parse_lyrics("[00:01.00](18446744073709551615,10,0)x\n[00:02.00]ok");
        assert_eq!(parsed.lines.len(), 2);
        assert!(parsed.lines[0].words.is_empty());
        assert!(!parsed.has_word_timing);
        assert_eq!(parsed.lines[1].text, "ok");
    }

    #[test]
    fn test_id_tags_and_offset() {
        let parsed = parse_lyrics("[ar:Someone]\n[offset:500]\n[00:02.00]Shifted");
        assert_eq!(parsed.lines.len(), 1);
        assert!((parsed.lines[0].time - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_word_timed_line() {
        let parsed = parse_lyrics("[1000,2000](1000,500,0)Hel(1500,500,0)lo (2000,1000,0)world");
        assert!(parsed.has_word_timing);
        let line = &parsed.lines[0];
        assert_eq!(line.time, 1.0);
        assert_eq!(line.text, "Hello world");
        assert!(line.is_precise_timing);
        assert_eq!(line.words.len(), 3);
        assert_eq!(line.words[0].text, "Hel");
        assert_eq!(line.words[0].start_time, 1.0);
        assert_eq!(line.words[0].end_time, 1.5);
        assert_eq!(line.words[2].end_time, 3.0);
    }

    #[test]
    fn test_word_tags_after_lrc_timestamp() {
        let parsed = parse_lyrics("[00:01.00](1000,400,0)Hi(1400,600,0) there");
        assert!(parsed.has_word_timing);
        assert_eq!(parsed.lines[0].text, "Hi there");
        assert_eq!(parsed.lines[0].words.len(), 2);
    }

    #[test]
    fn test_parenthesised_text_is_not_a_word_tag() {
        let parsed = parse_lyrics("[00:01.00]Hold on (ooh)");
        assert!(!parsed.has_word_timing);
        assert_eq!(parsed.lines[0].text, "Hold on (ooh)");
    }

    #[test]
    fn test_enhanced_lrc_words_get_end_times() {
        let parsed = parse_lyrics("[00:01.00]<00:01.00>One <00:01.50>two");
        let words = &parsed.lines[0].words;
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].end_time, 1.5);
        assert!(words[1].end_time >= words[1].start_time);
    }

    #[test]
    fn test_empty_text_lines_survive_parsing() {
        let raw = parse_raw_lines("[00:01.00]Hello\n[00:03.00]   \n");
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[1].text, "");
    }

    #[test]
    fn test_json_lines() {
        let raw = parse_raw_lines(
            "{\"t\":0,\"c\":[{\"tx\":\"作词: \"},{\"tx\":\"X\"}]}\n{\"t\":2000,\"c\":[{\"tx\":\"plain\"}]}",
        );
        assert_eq!(raw.len(), 2);
        assert!(raw[0].is_metadata);
        assert_eq!(raw[1].time, 2.0);
        assert_eq!(raw[1].text, "plain");
        assert!(!raw[1].is_metadata);
    }

    #[test]
    fn test_broken_json_is_plain_text() {
        assert!(decode_json_line("{not json}").is_none());
        assert!(decode_json_line("{\"c\": 5}").is_none());
        assert!(parse_lyrics("{not json}").lines.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let parsed = parse_lyrics("");
        assert!(parsed.lines.is_empty());
        assert!(!parsed.has_word_timing);
    }
}
