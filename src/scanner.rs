//! Placeholder extraction: every complete `{{key}}` in a buffer, and the
//! partial placeholder under an editing cursor.
use std::sync::LazyLock;

use regex::Regex;

use crate::types::Occurrence;

/// Opening delimiter of a placeholder.
pub const OPEN: &str = "{{";
/// Closing delimiter of a placeholder.
pub const CLOSE: &str = "}}";

/// Two braces, any run of non-`}` characters, two braces.
#[allow(clippy::expect_used, reason = "the pattern is a literal that always compiles")]
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"\{\{([^}]+)\}\}").expect("valid placeholder regex"));

/// All complete placeholders in `text`, left to right and non-overlapping.
/// Keys are the raw interior text, untrimmed.
pub fn scan_all(text: &str) -> Vec<Occurrence> {
    return PLACEHOLDER
        .captures_iter(text)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let key = cap.get(1)?;
            return Some(Occurrence {
                end: whole.end(),
                is_complete: true,
                key: key.as_str().to_string(),
                start: whole.start(),
            });
        })
        .collect();
}

/// The placeholder the cursor sits in, complete or still being typed.
///
/// Walks backward from `cursor` to the nearest `{{`. Whitespace or a `}}`
/// met first means the cursor is not inside a placeholder. From the opening
/// delimiter, the next `}}` on the same line closes it; otherwise the
/// occurrence is incomplete and ends at the cursor. Keys are trimmed.
pub fn find_at_cursor(text: &str, cursor: usize) -> Option<Occurrence> {
    let head = text.get(..cursor)?;
    let open = find_unmatched_open(head)?;
    let interior_start = open.checked_add(OPEN.len())?;
    let after_open = text.get(interior_start..)?;

    if let Some(close) = find_close_on_same_line(after_open) {
        let interior = after_open.get(..close)?;
        let end = interior_start.checked_add(close)?.checked_add(CLOSE.len())?;
        return Some(Occurrence {
            end,
            is_complete: true,
            key: interior.trim().to_string(),
            start: open,
        });
    }

    let typed = text.get(interior_start..cursor)?;
    return Some(Occurrence {
        end: cursor,
        is_complete: false,
        key: typed.trim().to_string(),
        start: open,
    });
}

/// Byte offset of the nearest `{{` in `head` not preceded (going backward)
/// by whitespace or a `}}`.
fn find_unmatched_open(head: &str) -> Option<usize> {
    let mut later: Option<char> = None;
    for (idx, ch) in head.char_indices().rev() {
        if ch.is_whitespace() {
            return None;
        }
        if ch == '{' && later == Some('{') {
            return Some(idx);
        }
        if ch == '}' && later == Some('}') {
            return None;
        }
        later = Some(ch);
    }
    return None;
}

/// Offset of the `}}` closing a placeholder whose interior starts at the
/// beginning of `rest`. A newline or a fresh `{{` before it means this
/// placeholder is unterminated.
fn find_close_on_same_line(rest: &str) -> Option<usize> {
    let close = rest.find(CLOSE)?;
    let interior = rest.get(..close)?;
    if interior.contains('\n') || interior.contains(OPEN) {
        return None;
    }
    return Some(close);
}
