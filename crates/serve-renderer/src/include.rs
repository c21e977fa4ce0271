//! File include directive handling.
//!
//! Lines of the form `{{path}}` or `{{path}}[address]` are include
//! directives. No file access is performed for them, so they render as
//! nothing: the preprocessor drops them before parsing. Inside fenced code
//! blocks they are literal text and pass through untouched.

use std::borrow::Cow;

use crate::fence::FenceTracker;

/// Strip include directive lines from markdown source.
///
/// A directive line is `{{...}}` optionally followed by `[...]`, indented
/// at most three spaces. Deeper indentation is code, and fence state is
/// tracked so directives quoted inside code blocks survive.
#[must_use]
pub fn strip_includes(source: &str) -> Cow<'_, str> {
    if !source.contains("{{") {
        return Cow::Borrowed(source);
    }

    let mut output = String::with_capacity(source.len());
    let mut fences = FenceTracker::default();

    for line in source.lines() {
        if !fences.process(line.trim_start()) && is_include_directive(line) {
            continue;
        }
        output.push_str(line);
        output.push('\n');
    }

    Cow::Owned(output)
}

/// Check whether a line is an include directive.
///
/// Accepts `{{path}}` and `{{path}}[address]` with nothing else on the
/// line. Four or more leading spaces, or a leading tab, make the line
/// indented code instead.
fn is_include_directive(line: &str) -> bool {
    let indent = line.bytes().take_while(|&b| b == b' ').count();
    if indent > 3 {
        return false;
    }
    let line = &line[indent..];
    if line.starts_with('\t') {
        return false;
    }

    let Some(rest) = line.strip_prefix("{{") else {
        return false;
    };
    let Some(close) = rest.find("}}") else {
        return false;
    };
    let path = &rest[..close];
    if path.is_empty() || path.contains('{') || path.contains('}') {
        return false;
    }

    let after = &rest[close + 2..];
    if after.is_empty() {
        return true;
    }

    // Optional address segment, e.g. {{file.go}}[/start/,/end/].
    after.starts_with('[') && after.ends_with(']')
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_untouched_source_borrows() {
        let source = "# Title\n\nNo directives here.\n";
        assert!(matches!(strip_includes(source), Cow::Borrowed(_)));
    }

    #[test]
    fn test_strips_plain_include() {
        let source = "before\n{{other.md}}\nafter\n";
        assert_eq!(strip_includes(source), "before\nafter\n");
    }

    #[test]
    fn test_strips_include_with_address() {
        let source = "{{snippet.go}}[/func main/,/^}/]\ntext\n";
        assert_eq!(strip_includes(source), "text\n");
    }

    #[test]
    fn test_preserves_include_inside_fence() {
        let source = "```\n{{literal.md}}\n```\n";
        assert_eq!(strip_includes(source), source);
    }

    #[test]
    fn test_shorter_run_keeps_fence_open() {
        let source = "````\n{{kept.md}}\n```\n{{also kept.md}}\n````\n{{dropped.md}}\n";
        assert_eq!(
            strip_includes(source),
            "````\n{{kept.md}}\n```\n{{also kept.md}}\n````\n"
        );
    }

    #[test]
    fn test_indented_directive_is_code() {
        let source = "text\n\n    {{literal.md}}\n";
        assert_eq!(strip_includes(source), source);
    }

    #[test]
    fn test_directive_indented_up_to_three_spaces() {
        let source = "text\n   {{other.md}}\n";
        assert_eq!(strip_includes(source), "text\n");
    }

    #[test]
    fn test_preserves_inline_braces() {
        let source = "a {{not an include}} b\n";
        assert_eq!(strip_includes(source), source);
    }

    #[test]
    fn test_tilde_fence() {
        let source = "~~~\n{{kept.md}}\n~~~\n{{dropped.md}}\n";
        assert_eq!(strip_includes(source), "~~~\n{{kept.md}}\n~~~\n");
    }
}
