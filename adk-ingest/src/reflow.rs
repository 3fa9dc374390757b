//! Cross-page text reflow.
//!
//! PDF text arrives one page at a time, and a sentence broken by a page
//! boundary shows up as two fragments. [`reflow`] stitches those fragments back
//! together using punctuation and capitalization cues.

use crate::document::Passage;

/// Characters that end a passage.
const TERMINAL_PUNCTUATION: [char; 5] = ['.', '!', '?', ':', ';'];

/// Merge ordered raw fragments into passages.
///
/// Each fragment is trimmed and the current passage is flushed when it ends
/// with terminal punctuation (`. ! ? : ;`) or when the next fragment starts
/// with an uppercase letter. Otherwise the next fragment is appended after a
/// single space. Blank fragments are skipped.
///
/// The heuristic is greedy and has no lookahead: a continuation that happens
/// to begin with a capitalized proper noun is split from the sentence it
/// belongs to.
///
/// # Example
///
/// ```rust
/// use adk_ingest::reflow::reflow;
///
/// let passages = reflow(["The quick brown", "fox jumps.", "Over the", "lazy dog"]);
/// let texts: Vec<_> = passages.iter().map(|p| p.text.as_str()).collect();
/// assert_eq!(texts, ["The quick brown fox jumps.", "Over the lazy dog"]);
/// ```
pub fn reflow<I, S>(fragments: I) -> Vec<Passage>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut passages = Vec::new();
    let mut current = String::new();

    for fragment in fragments {
        let next = fragment.as_ref().trim();
        if next.is_empty() {
            continue;
        }
        if current.is_empty() {
            current.push_str(next);
            continue;
        }

        if ends_passage(&current) || starts_sentence(next) {
            passages.push(Passage::new(std::mem::take(&mut current)));
            current.push_str(next);
        } else {
            current.push(' ');
            current.push_str(next);
        }
    }

    if !current.is_empty() {
        passages.push(Passage::new(current));
    }

    passages
}

fn ends_passage(text: &str) -> bool {
    text.chars().next_back().is_some_and(|c| TERMINAL_PUNCTUATION.contains(&c))
}

fn starts_sentence(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_uppercase)
}
