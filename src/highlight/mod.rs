pub mod tokenizer;

use crate::{Change, HighlightRange};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokenizer::{find_whole_word, tokenize};
use tracing::debug;

/// How changed words are located in the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Zip original and corrected words by position.
    #[default]
    Positional,
    /// Ask the provider for an explicit `original->corrected` list.
    Pairs,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "positional" => Ok(Strategy::Positional),
            "pairs" => Ok(Strategy::Pairs),
            _ => Err(format!("Unknown strategy: {}", s)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Positional => write!(f, "positional"),
            Strategy::Pairs => write!(f, "pairs"),
        }
    }
}

/// Pair words of both texts by index and keep the ones that differ.
/// Words past the end of the shorter text are ignored.
pub fn positional_changes(original: &str, corrected: &str) -> Vec<Change> {
    tokenize(original)
        .into_iter()
        .zip(tokenize(corrected))
        .filter(|(orig, fixed)| orig.text != fixed.text)
        .map(|(orig, fixed)| Change::new(orig.text, fixed.text))
        .collect()
}

/// Highlight every original word whose positional counterpart in `corrected`
/// differs.
///
/// Each word is located at or after the end of the previous one, so a
/// repeated word is highlighted at its own occurrence rather than the first
/// one in the text. Insertions and deletions are not realigned: once the
/// token counts diverge the trailing words are simply not compared.
pub fn positional(original: &str, corrected: &str) -> Vec<HighlightRange> {
    tokenize(original)
        .into_iter()
        .zip(tokenize(corrected))
        .filter(|(orig, fixed)| orig.text != fixed.text)
        .map(|(orig, _)| HighlightRange::new(orig.start, orig.end()))
        .collect()
}

/// Highlight whole-word occurrences of each change's original word, walking
/// the text with a cursor that never moves backwards.
///
/// Every occurrence after the cursor is highlighted before moving on to the
/// next change. A change whose word cannot be found past the cursor is
/// dropped without error.
pub fn explicit_pairs(original: &str, changes: &[Change]) -> Vec<HighlightRange> {
    let mut ranges = Vec::new();
    let mut cursor = 0;

    for change in changes {
        let mut matched = false;

        while let Some(start) = find_whole_word(original, &change.original, cursor) {
            let end = start + change.original.len();
            ranges.push(HighlightRange::new(start, end));
            cursor = end;
            matched = true;
        }

        if !matched {
            debug!(
                word = %change.original,
                cursor,
                "changed word not found in original text, skipping"
            );
        }
    }

    ranges
}

/// Compute highlights for one check with the selected strategy.
pub fn highlight(
    strategy: Strategy,
    original: &str,
    corrected: &str,
    changes: &[Change],
) -> Vec<HighlightRange> {
    match strategy {
        Strategy::Positional => positional(original, corrected),
        Strategy::Pairs => explicit_pairs(original, changes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words<'a>(text: &'a str, ranges: &[HighlightRange]) -> Vec<&'a str> {
        ranges.iter().map(|r| r.word(text)).collect()
    }

    fn is_sorted(ranges: &[HighlightRange]) -> bool {
        ranges.windows(2).all(|w| w[0].start <= w[1].start && w[0].end <= w[1].start)
    }

    #[test]
    fn test_identical_text_has_no_highlights() {
        let text = "The quick brown fox";
        assert!(positional(text, text).is_empty());
        assert!(positional_changes(text, text).is_empty());
    }

    #[test]
    fn test_positional_marks_original_words() {
        let original = "I has a apple";
        let ranges = positional(original, "I have an apple");

        assert_eq!(ranges, vec![HighlightRange::new(2, 5), HighlightRange::new(6, 7)]);
        assert_eq!(words(original, &ranges), vec!["has", "a"]);
    }

    #[test]
    fn test_positional_changes_pairs() {
        let changes = positional_changes("I has a apple", "I have an apple");
        assert_eq!(changes, vec![Change::new("has", "have"), Change::new("a", "an")]);
    }

    #[test]
    fn test_positional_repeated_word_uses_own_occurrence() {
        let original = "teh cat saw teh dog";
        let ranges = positional(original, "teh cat saw the dog");

        assert_eq!(ranges, vec![HighlightRange::new(12, 15)]);
        assert!(is_sorted(&ranges));
    }

    #[test]
    fn test_positional_ignores_trailing_words() {
        let original = "one two three four";
        assert!(positional(original, "one two").is_empty());

        let ranges = positional("one too", "one two three");
        assert_eq!(words("one too", &ranges), vec!["too"]);
    }

    #[test]
    fn test_positional_punctuation_is_part_of_word() {
        let original = "Hello world";
        let ranges = positional(original, "Hello world.");
        assert_eq!(words(original, &ranges), vec!["world"]);
    }

    #[test]
    fn test_pairs_single_occurrence() {
        let original = "The quick brown fox";
        let ranges = explicit_pairs(original, &[Change::new("fox", "foxes")]);

        assert_eq!(ranges, vec![HighlightRange::new(16, 19)]);
        assert_eq!(words(original, &ranges), vec!["fox"]);
    }

    #[test]
    fn test_pairs_whole_word_only() {
        let original = "The category of the cat";
        let ranges = explicit_pairs(original, &[Change::new("cat", "cats")]);

        assert_eq!(words(original, &ranges), vec!["cat"]);
        assert_eq!(ranges[0].start, 20);
    }

    #[test]
    fn test_pairs_never_match_inside_longer_word() {
        let ranges = explicit_pairs("category", &[Change::new("cat", "dog")]);
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_pairs_missing_word_is_skipped() {
        let original = "I has a apple";
        let changes = vec![
            Change::new("banana", "bananas"),
            Change::new("has", "have"),
            Change::new("a", "an"),
        ];
        let ranges = explicit_pairs(original, &changes);

        assert_eq!(words(original, &ranges), vec!["has", "a"]);
    }

    #[test]
    fn test_pairs_cursor_never_regresses() {
        let original = "the cat the cat";
        let changes = vec![Change::new("cat", "cats"), Change::new("the", "a")];
        let ranges = explicit_pairs(original, &changes);

        // Every "cat" after the cursor is taken, after which "the" only
        // occurs behind the cursor and is dropped.
        assert_eq!(ranges, vec![HighlightRange::new(4, 7), HighlightRange::new(12, 15)]);
        assert!(is_sorted(&ranges));
    }

    #[test]
    fn test_pairs_out_of_order_changes_stay_sorted() {
        let original = "recieve the mesage and recieve it";
        let changes = vec![
            Change::new("mesage", "message"),
            Change::new("recieve", "receive"),
        ];
        let ranges = explicit_pairs(original, &changes);

        assert_eq!(words(original, &ranges), vec!["mesage", "recieve"]);
        assert_eq!(ranges[1].start, 23);
        assert!(is_sorted(&ranges));
    }

    #[test]
    fn test_highlight_dispatch() {
        let original = "I has a apple";
        let corrected = "I have an apple";
        let changes = vec![Change::new("apple", "pear")];

        assert_eq!(
            highlight(Strategy::Positional, original, corrected, &changes).len(),
            2
        );
        assert_eq!(
            highlight(Strategy::Pairs, original, corrected, &changes),
            vec![HighlightRange::new(8, 13)]
        );
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("positional".parse::<Strategy>().unwrap(), Strategy::Positional);
        assert_eq!("PAIRS".parse::<Strategy>().unwrap(), Strategy::Pairs);
        assert!("fuzzy".parse::<Strategy>().is_err());
        assert_eq!(Strategy::default().to_string(), "positional");
    }
}
