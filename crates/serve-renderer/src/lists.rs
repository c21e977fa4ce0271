//! List termination on blank-line runs.
//!
//! CommonMark folds list items separated by any number of blank lines into
//! one loose list. Here two or more consecutive blank lines end the list
//! instead: the preprocessor inserts an inert comment line before the next
//! item so the parser starts a fresh list.

use std::borrow::Cow;

use crate::fence::FenceTracker;

/// Comment line that forces an open list closed. Invisible when rendered.
const LIST_BREAK: &str = "<!-- -->\n";

/// Split lists whose items are separated by two or more blank lines.
///
/// Blank lines inside fenced code are content and never count. The break
/// only applies between items; a paragraph after the blank run already
/// ends the list on its own.
#[must_use]
pub fn break_lists(source: &str) -> Cow<'_, str> {
    let mut output = String::with_capacity(source.len());
    let mut fences = FenceTracker::default();
    let mut in_list = false;
    let mut blank_run = 0;
    let mut changed = false;

    for line in source.lines() {
        let trimmed = line.trim_start();

        if fences.process(trimmed) {
            blank_run = 0;
            output.push_str(line);
            output.push('\n');
            continue;
        }

        if trimmed.is_empty() {
            blank_run += 1;
            output.push_str(line);
            output.push('\n');
            continue;
        }

        let item = is_list_item_start(trimmed);
        if item && in_list && blank_run >= 2 {
            output.push_str(LIST_BREAK);
            changed = true;
        }
        if item {
            in_list = true;
        } else if blank_run > 0 && line.len() - trimmed.len() < 2 {
            // Flush text after a blank line ends the list. Indented lines
            // are item continuations, and flush text with no blank before
            // it is a lazy continuation.
            in_list = false;
        }
        blank_run = 0;
        output.push_str(line);
        output.push('\n');
    }

    if changed {
        Cow::Owned(output)
    } else {
        Cow::Borrowed(source)
    }
}

/// Lines that start a bullet or ordered list item.
fn is_list_item_start(trimmed: &str) -> bool {
    if let Some(rest) = trimmed.strip_prefix(['-', '+', '*']) {
        return rest.starts_with(' ') || rest.starts_with('\t');
    }

    let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || digits > 9 {
        return false;
    }
    let Some(rest) = trimmed[digits..].strip_prefix(['.', ')']) else {
        return false;
    };
    rest.starts_with(' ') || rest.starts_with('\t')
}
