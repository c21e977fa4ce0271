//! Code fence tracking for line-oriented preprocessing.
//!
//! Fences use backticks or tildes, three or more. A closing fence must
//! repeat the opening character at least as many times and carry nothing
//! but trailing whitespace; a shorter run or the other character is
//! ordinary fence content.

/// Tracks fence state while feeding markdown source line by line.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    /// Marker character and opening run length of the current fence.
    open: Option<(char, usize)>,
}

impl FenceTracker {
    /// Feed the next line, leading whitespace already removed.
    ///
    /// Returns `true` while the line belongs to fenced code, the opening
    /// and closing fence lines included.
    pub(crate) fn process(&mut self, trimmed: &str) -> bool {
        match self.open {
            Some((marker, min_len)) => {
                if is_closing_fence(trimmed, marker, min_len) {
                    self.open = None;
                }
                true
            }
            None => match opening_fence(trimmed) {
                Some(open) => {
                    self.open = Some(open);
                    true
                }
                None => false,
            },
        }
    }
}

/// Marker character and run length of an opening fence, if the line is one.
fn opening_fence(trimmed: &str) -> Option<(char, usize)> {
    let marker = trimmed.chars().next()?;
    if marker != '`' && marker != '~' {
        return None;
    }
    let len = trimmed.chars().take_while(|&c| c == marker).count();
    (len >= 3).then_some((marker, len))
}

/// A closing fence repeats the marker at least `min_len` times with only
/// whitespace after the run.
fn is_closing_fence(trimmed: &str, marker: char, min_len: usize) -> bool {
    let len = trimmed.chars().take_while(|&c| c == marker).count();
    // The marker is ASCII, so the char count doubles as a byte offset.
    len >= min_len && trimmed[len..].chars().all(char::is_whitespace)
}
