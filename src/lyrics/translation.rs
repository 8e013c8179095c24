//! Translation merging.
//!
//! Translations arrive as an ordinary line-tagged blob whose timestamps drift a
//! little from the original. They are parsed with the same parser, keyed by time
//! in hundredths of a second and matched to original lines within a tolerance
//! window. Each translated line is handed out at most once.

use std::collections::BTreeMap;

use tracing::debug;

use crate::lyrics::metadata::extract_metadata_lines;
use crate::lyrics::normalize::time_key;
use crate::lyrics::parse::parse_raw_lines;
use crate::lyrics::types::LyricLine;

/// Tolerances in hundredths of a second. Forward means the translation is
/// timestamped after the original line.
const PRECISE_FORWARD_TOLERANCE: i64 = 100;
const PRECISE_BACKWARD_TOLERANCE: i64 = 35;
const LINE_FORWARD_TOLERANCE: i64 = 35;
const LINE_BACKWARD_TOLERANCE: i64 = 20;

/// Map of time key -> translated text. Lines sharing a key are joined with `\n`.
pub fn build_translation_map(content: &str) -> BTreeMap<i64, String> {
    let mut map = BTreeMap::new();
    if content.trim().is_empty() {
        return map;
    }

    // Raw lines: duplicate collapse would drop translated lines sharing a timestamp.
    let clean = extract_metadata_lines(content).clean;
    for line in parse_raw_lines(&clean) {
        let text = line.text.trim();
        if line.is_metadata || text.is_empty() {
            continue;
        }
        map.entry(time_key(line.time))
            .and_modify(|existing: &mut String| {
                if !existing.split('\n').any(|part| part == text) {
                    existing.push('\n');
                    existing.push_str(text);
                }
            })
            .or_insert_with(|| text.to_string());
    }
    map
}

/// Take the translation for `line` out of `map`: an exact key first, otherwise the
/// nearest key inside the tolerance window. Equal distances go to the earlier key.
pub fn find_translation(map: &mut BTreeMap<i64, String>, line: &LyricLine) -> Option<String> {
    let key = time_key(line.time);
    if let Some(exact) = map.remove(&key) {
        return Some(exact);
    }

    let (forward, backward) = if line.is_precise_timing {
        (PRECISE_FORWARD_TOLERANCE, PRECISE_BACKWARD_TOLERANCE)
    } else {
        (LINE_FORWARD_TOLERANCE, LINE_BACKWARD_TOLERANCE)
    };

    let nearest = map
        .range(key - backward..=key + forward)
        .map(|(candidate, _)| *candidate)
        .min_by_key(|candidate| (candidate - key).abs())?;
    map.remove(&nearest)
}

/// Attach translations from `translation` to `lines`.
///
/// Interludes are skipped. Every other line takes its match out of the map even
/// if it already carries a translation, which is never overwritten; merging the
/// same translation twice therefore leaves the lines unchanged.
pub fn merge_translations(lines: Vec<LyricLine>, translation: Option<&str>) -> Vec<LyricLine> {
    let Some(content) = translation.filter(|c| !c.trim().is_empty()) else {
        return lines;
    };

    let mut map = build_translation_map(content);
    if map.is_empty() {
        return lines;
    }

    let mut matched = 0usize;
    let merged: Vec<LyricLine> = lines
        .into_iter()
        .map(|mut line| {
            if line.is_interlude {
                return line;
            }
            let found = find_translation(&mut map, &line);
            if line.translation.is_some() {
                return line;
            }
            if let Some(text) = found.map(|t| t.trim().to_string())
                && !text.is_empty()
            {
                line.translation = Some(text);
                matched += 1;
            }
            line
        })
        .collect();

    debug!(matched, unmatched = map.len(), "merged translations");
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(time: f64, text: &str, precise: bool) -> LyricLine {
        LyricLine {
            is_precise_timing: precise,
            ..LyricLine::plain(time, text)
        }
    }

    #[test]
    fn test_map_joins_same_timestamp() {
        let map = build_translation_map("[00:01.00]One\n[00:01.00]Uno\n[00:02.00]Two");
        assert_eq!(map.get(&100).map(String::as_str), Some("One\nUno"));
        assert_eq!(map.get(&200).map(String::as_str), Some("Two"));
    }

    #[test]
    fn test_map_keeps_same_timestamp_lines_of_any_precision() {
        let map = build_translation_map(
            "[00:01.00]Plain\n[1000,500](1000,500,0)Timed\n[00:01.00]Plain",
        );
        assert_eq!(map.get(&100).map(String::as_str), Some("Plain\nTimed"));
    }

    #[test]
    fn test_map_skips_credits_and_blank_lines() {
        let map = build_translation_map("[00:00.00]翻译贡献者: X\n[00:01.00]\n[00:02.00]Two");
        assert_eq!(map.len(), 1);
        assert!(map.contains_key(&200));
    }

    #[test]
    fn test_forward_drift_within_line_tolerance() {
        let lines = merge_translations(vec![line(2.0, "你好", false)], Some("[00:02.10]Hello"));
        assert_eq!(lines[0].translation.as_deref(), Some("Hello"));
    }

    #[test]
    fn test_asymmetric_windows() {
        // 0.3s early is outside the line-only backward window but inside the precise one
        let plain = merge_translations(vec![line(2.0, "a", false)], Some("[00:01.70]A"));
        assert_eq!(plain[0].translation, None);
        let precise = merge_translations(vec![line(2.0, "a", true)], Some("[00:01.70]A"));
        assert_eq!(precise[0].translation.as_deref(), Some("A"));

        // 0.8s late only matches precise lines
        let plain = merge_translations(vec![line(2.0, "a", false)], Some("[00:02.80]A"));
        assert_eq!(plain[0].translation, None);
        let precise = merge_translations(vec![line(2.0, "a", true)], Some("[00:02.80]A"));
        assert_eq!(precise[0].translation.as_deref(), Some("A"));
    }

    #[test]
    fn test_each_translation_used_once() {
        let lines = vec![line(2.0, "first", false), line(2.2, "second", false)];
        let merged = merge_translations(lines, Some("[00:02.10]only one"));
        let attached: Vec<_> = merged.iter().filter(|l| l.translation.is_some()).collect();
        assert_eq!(attached.len(), 1);
        assert_eq!(merged[0].translation.as_deref(), Some("only one"));
        assert_eq!(merged[1].translation, None);
    }

    #[test]
    fn test_equal_distance_prefers_earlier_key() {
        let mut map = BTreeMap::from([(190, "early".to_string()), (210, "late".to_string())]);
        let found = find_translation(&mut map, &line(2.0, "x", false));
        assert_eq!(found.as_deref(), Some("early"));
        assert!(map.contains_key(&210));
    }

    #[test]
    fn test_existing_translation_is_kept() {
        let mut original = line(1.0, "x", false);
        original.translation = Some("kept".to_string());
        let merged = merge_translations(vec![original], Some("[00:01.00]other"));
        assert_eq!(merged[0].translation.as_deref(), Some("kept"));
    }

    #[test]
    fn test_merge_is_idempotent_on_lines() {
        let translation = "[00:02.10]only one\n[00:05.00]Five";
        let lines = vec![
            line(2.0, "first", false),
            line(2.2, "second", false),
            line(5.0, "five", false),
        ];
        let once = merge_translations(lines, Some(translation));
        let twice = merge_translations(once.clone(), Some(translation));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_interludes_never_translated() {
        let merged = merge_translations(
            vec![LyricLine::interlude(1.0, 6.0), line(7.0, "x", false)],
            Some("[00:01.00]gap\n[00:07.00]X"),
        );
        assert_eq!(merged[0].translation, None);
        assert_eq!(merged[1].translation.as_deref(), Some("X"));
    }

    #[test]
    fn test_absent_translation_is_noop() {
        let lines = vec![line(1.0, "x", false)];
        assert_eq!(merge_translations(lines.clone(), None), lines);
        assert_eq!(merge_translations(lines.clone(), Some("  \n")), lines);
    }
}
