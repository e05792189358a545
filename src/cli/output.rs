use crate::app::{Notice, NoticeLevel};
use crate::highlight::Strategy;
use crate::{Change, CheckOutcome, HighlightRange};
use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonHighlight<'a> {
    start: usize,
    end: usize,
    word: &'a str,
}

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    strategy: String,
    original: &'a str,
    corrected: &'a str,
    total_changes: usize,
    highlights: Vec<JsonHighlight<'a>>,
    changes: &'a [Change],
}

pub fn print_outcome(
    outcome: &CheckOutcome,
    strategy: Strategy,
    colored_output: bool,
    format: &OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            print_text_outcome(outcome, colored_output);
            Ok(())
        }
        OutputFormat::Json => print_json_outcome(outcome, strategy),
    }
}

fn print_text_outcome(outcome: &CheckOutcome, colored_output: bool) {
    let original = render_highlighted(&outcome.original, &outcome.highlights, colored_output);

    if colored_output {
        println!("{}", "Original Text:".bold());
        println!("{}", original);
        println!();
        println!("{}", "Corrected Text:".bold());
        println!("{}", outcome.corrected.green());
    } else {
        println!("Original Text:");
        println!("{}", original);
        println!();
        println!("Corrected Text:");
        println!("{}", outcome.corrected);
    }

    print_check_summary(outcome, colored_output);
}

fn print_json_outcome(outcome: &CheckOutcome, strategy: Strategy) -> Result<()> {
    let output = JsonOutput {
        strategy: strategy.to_string(),
        original: &outcome.original,
        corrected: &outcome.corrected,
        total_changes: outcome.change_count(),
        highlights: outcome
            .highlights
            .iter()
            .map(|r| JsonHighlight {
                start: r.start,
                end: r.end,
                word: r.word(&outcome.original),
            })
            .collect(),
        changes: &outcome.changes,
    };

    let json = serde_json::to_string_pretty(&output).context("Failed to serialize result")?;
    println!("{}", json);
    Ok(())
}

/// Mark the highlighted ranges of `text`: red underline when colored,
/// `[word]` otherwise.
pub fn render_highlighted(text: &str, highlights: &[HighlightRange], colored: bool) -> String {
    let mut rendered = String::with_capacity(text.len() + highlights.len() * 2);
    let mut cursor = 0;

    for range in highlights {
        // Ranges come sorted and disjoint; skip anything that is not.
        if range.start < cursor || range.end > text.len() || range.is_empty() {
            continue;
        }

        rendered.push_str(&text[cursor..range.start]);
        let word = range.word(text);
        if colored {
            rendered.push_str(&word.red().underline().to_string());
        } else {
            rendered.push('[');
            rendered.push_str(word);
            rendered.push(']');
        }
        cursor = range.end;
    }

    rendered.push_str(&text[cursor..]);
    rendered
}

pub fn print_notice(notice: &Notice, colored: bool) {
    let (symbol, title) = match notice.level {
        NoticeLevel::Info => ("ℹ", notice.title.cyan().bold()),
        NoticeLevel::Warning => ("⚠", notice.title.yellow().bold()),
        NoticeLevel::Error => ("✗", notice.title.red().bold()),
    };

    if colored {
        eprintln!("{} {}: {}", symbol, title, notice.message);
    } else {
        eprintln!("{} {}: {}", symbol, notice.title, notice.message);
    }
}

/// Closing line of a text report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Summary {
    Clean,
    Changed(usize),
    /// The text changed but no word of the original could be marked,
    /// e.g. the correction only appended words.
    Unmarked,
}

impl Summary {
    fn of(outcome: &CheckOutcome) -> Self {
        if outcome.is_clean() {
            Summary::Clean
        } else if outcome.change_count() > 0 {
            Summary::Changed(outcome.change_count())
        } else {
            Summary::Unmarked
        }
    }
}

pub fn print_check_summary(outcome: &CheckOutcome, colored: bool) {
    println!();
    match Summary::of(outcome) {
        Summary::Clean => {
            if colored {
                println!("{}", "✓ No corrections needed!".green().bold());
            } else {
                println!("✓ No corrections needed!");
            }
        }
        Summary::Changed(total_changes) => {
            let word = if total_changes == 1 { "word" } else { "words" };
            if colored {
                println!(
                    "{} {} {} changed",
                    "✗".red().bold(),
                    total_changes.to_string().red().bold(),
                    word
                );
            } else {
                println!("✗ {} {} changed", total_changes, word);
            }
        }
        Summary::Unmarked => {
            let message = "Text corrected, no changed words highlighted";
            if colored {
                println!("{} {}", "✗".yellow().bold(), message.yellow());
            } else {
                println!("✗ {}", message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_plain_markers() {
        let text = "I has a apple";
        let ranges = [HighlightRange::new(2, 5), HighlightRange::new(6, 7)];
        assert_eq!(render_highlighted(text, &ranges, false), "I [has] [a] apple");
    }

    #[test]
    fn test_render_without_highlights() {
        assert_eq!(render_highlighted("All good", &[], false), "All good");
        assert_eq!(render_highlighted("", &[], false), "");
    }

    #[test]
    fn test_render_skips_invalid_ranges() {
        let text = "one two";
        let ranges = [
            HighlightRange::new(4, 7),
            HighlightRange::new(0, 3),
            HighlightRange::new(5, 20),
        ];
        assert_eq!(render_highlighted(text, &ranges, false), "one [two]");
    }

    #[test]
    fn test_render_colored_keeps_text() {
        colored::control::set_override(true);
        let rendered = render_highlighted("a cat", &[HighlightRange::new(2, 5)], true);
        assert!(rendered.starts_with("a "));
        assert!(rendered.contains("cat"));
        assert!(rendered.contains('\u{1b}'));
    }

    fn outcome(original: &str, corrected: &str, highlights: Vec<HighlightRange>) -> CheckOutcome {
        CheckOutcome {
            original: original.to_string(),
            corrected: corrected.to_string(),
            changes: Vec::new(),
            highlights,
        }
    }

    #[test]
    fn test_summary_clean_only_when_text_unchanged() {
        assert_eq!(Summary::of(&outcome("one two", "one two", vec![])), Summary::Clean);
        assert_eq!(Summary::of(&outcome("one two\n", "one two", vec![])), Summary::Clean);
    }

    #[test]
    fn test_summary_appended_words_are_not_clean() {
        let appended = outcome("one two", "one two three", vec![]);
        assert!(!appended.is_clean());
        assert_eq!(Summary::of(&appended), Summary::Unmarked);
    }

    #[test]
    fn test_summary_counts_highlights() {
        let changed = outcome(
            "I has a apple",
            "I have an apple",
            vec![HighlightRange::new(2, 5), HighlightRange::new(6, 7)],
        );
        assert_eq!(Summary::of(&changed), Summary::Changed(2));
    }

    #[test]
    fn test_output_format_parse() {
        assert!(matches!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json)));
        assert!("yaml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Text.to_string(), "text");
    }
}
