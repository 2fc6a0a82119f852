//! Repeat-phrase hallucination filter.
//!
//! Whisper decoders under poor acoustic conditions emit degenerate loops: a
//! short phrase repeated many times ("那个吧 那个吧 那个吧 …"). This is a purely
//! textual cleanup pass that collapses such runs to a single occurrence and
//! leaves everything else untouched.

use crate::asr::segment::Transcript;
use crate::defaults;

/// Shortest phrase considered for collapse, in characters.
pub const MIN_PHRASE_CHARS: usize = 2;

/// Longest phrase considered for collapse, in characters.
pub const MAX_PHRASE_CHARS: usize = 20;

/// Collapse pathological phrase repetitions in `text`.
///
/// A contiguous phrase of 2-20 characters that occurs more than `max_repeats`
/// times in a row is reduced to a single occurrence. Scanning is leftmost-first
/// and shortest-phrase-first, so the tightest loop wins. A truncated final
/// repetition at the end of the string (the decoder cut off mid-phrase at the
/// segment boundary) counts toward the tally and is absorbed by the collapse.
///
/// The pass is repeated until the text stops changing, which makes the filter
/// idempotent: `collapse(collapse(x)) == collapse(x)`.
pub fn collapse_repeated_phrases(text: &str, max_repeats: usize) -> String {
    let mut current = text.to_string();
    loop {
        let next = collapse_once(&current, max_repeats);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Single left-to-right collapse pass.
fn collapse_once(text: &str, max_repeats: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    'scan: while i < len {
        for phrase_len in MIN_PHRASE_CHARS..=MAX_PHRASE_CHARS {
            if i + phrase_len > len {
                break;
            }
            let phrase = &chars[i..i + phrase_len];

            // Count consecutive full copies, including the first.
            let mut count = 1;
            let mut j = i + phrase_len;
            while j + phrase_len <= len && chars[j..j + phrase_len] == *phrase {
                count += 1;
                j += phrase_len;
            }

            // A proper prefix of the phrase running to the end of the string is
            // a repetition the decoder didn't finish.
            let tail = len - j;
            let truncated = tail > 0 && tail < phrase_len && chars[j..] == phrase[..tail];

            if count + usize::from(truncated) > max_repeats {
                out.extend(phrase.iter());
                i = if truncated { len } else { j };
                continue 'scan;
            }
        }

        out.push(chars[i]);
        i += 1;
    }

    out
}

/// Apply the filter to every segment of a transcript with the default
/// threshold. Returns the number of segments whose text changed.
pub fn scrub_transcript(transcript: &mut Transcript) -> usize {
    let mut changed = 0;
    for segment in &mut transcript.segments {
        let cleaned = collapse_repeated_phrases(&segment.text, defaults::MAX_PHRASE_REPEATS);
        if cleaned != segment.text {
            segment.text = cleaned;
            changed += 1;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asr::segment::Segment;

    const MAX: usize = defaults::MAX_PHRASE_REPEATS;

    #[test]
    fn clean_text_is_unchanged() {
        let inputs = [
            "",
            "大家好，今天我们讨论一下项目进度。",
            "The quick brown fox jumps over the lazy dog.",
            "好的 好的 好的", // three repetitions: at the threshold, not over it
            "嗯",
        ];
        for input in inputs {
            assert_eq!(collapse_repeated_phrases(input, MAX), input);
        }
    }

    #[test]
    fn collapses_four_phrase_repetitions_exactly() {
        let result = collapse_repeated_phrases("那个吧 那个吧 那个吧 那个吧", MAX);
        assert_eq!(result, "那个吧 ");
    }

    #[test]
    fn collapses_single_character_loop_to_shortest_phrase() {
        // Phrases start at two characters, so a run of eight collapses to two.
        assert_eq!(collapse_repeated_phrases("哈哈哈哈哈哈哈哈", MAX), "哈哈");
    }

    #[test]
    fn surrounding_text_is_preserved() {
        let result = collapse_repeated_phrases("他说对对对对对对对对，然后就走了", MAX);
        assert_eq!(result, "他说对对，然后就走了");
    }

    #[test]
    fn filter_is_idempotent() {
        let inputs = [
            "那个吧 那个吧 那个吧 那个吧",
            "哈哈哈哈哈哈哈哈",
            "他说对对对对对对对对，然后就走了",
            "就是说就是说就是说就是说我们应该先做这个",
            "正常的一句话",
        ];
        for input in inputs {
            let once = collapse_repeated_phrases(input, MAX);
            let twice = collapse_repeated_phrases(&once, MAX);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn collapse_is_exact_not_truncation() {
        // The whole run disappears, including a trailing partial repetition.
        let result = collapse_repeated_phrases("就是说就是说就是说就是说我们应该先做这个", MAX);
        assert_eq!(result, "就是说我们应该先做这个");
    }

    #[test]
    fn threshold_is_strictly_greater_than() {
        // Exactly max_repeats occurrences stay; one more collapses.
        assert_eq!(collapse_repeated_phrases("abababab", MAX), "ab");
        assert_eq!(collapse_repeated_phrases("ababab", MAX), "ababab");
    }

    #[test]
    fn respects_custom_threshold() {
        assert_eq!(collapse_repeated_phrases("abab", 1), "ab");
        assert_eq!(collapse_repeated_phrases("abab", 3), "abab");
    }

    #[test]
    fn scrub_transcript_counts_changed_segments() {
        let mut transcript = Transcript {
            language: "zh".to_string(),
            segments: vec![
                Segment::new(0.0, 5.0, "那个吧 那个吧 那个吧 那个吧"),
                Segment::new(5.0, 9.0, "大家好"),
                Segment::new(9.0, 12.0, "哈哈哈哈哈哈哈哈"),
            ],
        };

        let changed = scrub_transcript(&mut transcript);

        assert_eq!(changed, 2);
        assert_eq!(transcript.segments[0].text, "那个吧 ");
        assert_eq!(transcript.segments[1].text, "大家好");
        assert_eq!(transcript.segments[2].text, "哈哈");
    }
}
