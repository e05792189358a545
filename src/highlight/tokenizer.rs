/// A whitespace-delimited word and the byte offset it starts at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordToken<'a> {
    pub text: &'a str,
    pub start: usize,
}

impl WordToken<'_> {
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

/// Split `text` on whitespace, keeping offsets. Punctuation stays attached
/// to the word it touches.
pub fn tokenize(text: &str) -> Vec<WordToken<'_>> {
    let mut tokens = Vec::new();
    let mut word_start = None;

    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if let Some(start) = word_start.take() {
                tokens.push(WordToken {
                    text: &text[start..idx],
                    start,
                });
            }
        } else if word_start.is_none() {
            word_start = Some(idx);
        }
    }

    if let Some(start) = word_start {
        tokens.push(WordToken {
            text: &text[start..],
            start,
        });
    }

    tokens
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Find the first occurrence of `word` at or after byte offset `from` that is
/// not part of a longer word.
pub fn find_whole_word(text: &str, word: &str, from: usize) -> Option<usize> {
    if word.is_empty() || from > text.len() || !text.is_char_boundary(from) {
        return None;
    }

    let first = word.chars().next()?;
    let last = word.chars().next_back()?;
    let mut cursor = from;

    while let Some(found) = text[cursor..].find(word) {
        let start = cursor + found;
        let end = start + word.len();

        // Boundaries only matter where the word itself starts or ends in a
        // word character, so "apple." still matches before a space.
        let before_ok = !is_word_char(first)
            || text[..start].chars().next_back().map_or(true, |c| !is_word_char(c));
        let after_ok = !is_word_char(last)
            || text[end..].chars().next().map_or(true, |c| !is_word_char(c));

        if before_ok && after_ok {
            return Some(start);
        }

        cursor = start + first.len_utf8();
    }

    None
}
