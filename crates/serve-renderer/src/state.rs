//! Rendering state carried across markdown events.
//!
//! These structs track context during event processing so the renderer
//! itself stays a flat event loop instead of a pile of boolean flags.

use std::collections::HashMap;

use pulldown_cmark::Alignment;

/// Code block capture.
///
/// Content is buffered until the closing fence so the block can be
/// emitted as one escaped `<pre><code>` element.
#[derive(Default)]
pub(crate) struct CodeBlockState {
    active: bool,
    /// Info-string language of the open block, if any.
    language: Option<String>,
    buffer: String,
}

impl CodeBlockState {
    /// Open a block with an optional language.
    pub(crate) fn start(&mut self, language: Option<String>) {
        self.active = true;
        self.language = language;
        self.buffer.clear();
    }

    /// Close the block, yielding (language, content).
    pub(crate) fn end(&mut self) -> (Option<String>, String) {
        self.active = false;
        (self.language.take(), std::mem::take(&mut self.buffer))
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub(crate) fn push_newline(&mut self) {
        self.buffer.push('\n');
    }
}

/// Table position tracking.
///
/// The column index decides which alignment applies to the cell being
/// written; the head flag decides `<th>` against `<td>`.
#[derive(Default)]
pub(crate) struct TableState {
    in_head: bool,
    alignments: Vec<Alignment>,
    cell_index: usize,
}

impl TableState {
    pub(crate) fn start(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.in_head = false;
        self.cell_index = 0;
    }

    pub(crate) fn start_head(&mut self) {
        self.in_head = true;
        self.cell_index = 0;
    }

    pub(crate) fn end_head(&mut self) {
        self.in_head = false;
    }

    pub(crate) fn start_row(&mut self) {
        self.cell_index = 0;
    }

    pub(crate) fn next_cell(&mut self) {
        self.cell_index += 1;
    }

    pub(crate) fn is_in_head(&self) -> bool {
        self.in_head
    }

    /// Style attribute for the current cell, empty when unaligned.
    pub(crate) fn current_alignment_style(&self) -> &'static str {
        match self.alignments.get(self.cell_index) {
            Some(Alignment::Left) => r#" style="text-align:left""#,
            Some(Alignment::Center) => r#" style="text-align:center""#,
            Some(Alignment::Right) => r#" style="text-align:right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

/// Alt text capture between image start and end events.
///
/// While active, inline events feed this buffer instead of the output,
/// since the `<img>` tag is still half-written.
#[derive(Default)]
pub(crate) struct ImageState {
    active: bool,
    alt_text: String,
}

impl ImageState {
    pub(crate) fn start(&mut self) {
        self.active = true;
        self.alt_text.clear();
    }

    /// Finish capture and take the collected alt text.
    pub(crate) fn end(&mut self) -> String {
        self.active = false;
        std::mem::take(&mut self.alt_text)
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.alt_text.push_str(text);
    }
}

/// A finished heading, ready to be written as one tag.
pub(crate) struct Heading {
    pub(crate) level: u8,
    /// Anchor ID, manual or generated.
    pub(crate) id: String,
    /// Extra attributes pre-rendered as ` key="value"` pairs, or empty.
    pub(crate) extra_attrs: String,
    /// Inner HTML, inline formatting included.
    pub(crate) html: String,
}

/// State for tracking headings and anchor ID generation.
///
/// Headings are buffered until the closing tag because the anchor ID is
/// derived from the full heading text. Manual IDs (`{#my-id}`) win over
/// generated slugs; generated slugs are deduplicated per document
/// (`faq`, `faq-1`, ...).
#[derive(Default)]
pub(crate) struct HeadingState {
    /// Level of the open heading, `None` outside one.
    current_level: Option<u8>,
    /// ID from heading attributes, if the author gave one.
    manual_id: Option<String>,
    /// Rendered class and custom attributes of the open heading.
    extra_attrs: String,
    /// Plain text of the heading, the slug source.
    text: String,
    /// Inner HTML of the heading, inline formatting included.
    html: String,
    /// Times each ID has been issued, for the `-1`, `-2` suffixes.
    id_counts: HashMap<String, usize>,
}

impl HeadingState {
    pub(crate) fn is_active(&self) -> bool {
        self.current_level.is_some()
    }

    /// Open a heading and reset the per-heading buffers.
    pub(crate) fn start(&mut self, level: u8, manual_id: Option<String>, extra_attrs: String) {
        self.current_level = Some(level);
        self.manual_id = manual_id;
        self.extra_attrs = extra_attrs;
        self.text.clear();
        self.html.clear();
    }

    /// Complete the open heading.
    ///
    /// Returns `None` if no heading is being tracked.
    pub(crate) fn complete(&mut self) -> Option<Heading> {
        let level = self.current_level.take()?;
        let text = std::mem::take(&mut self.text);
        let html = std::mem::take(&mut self.html);
        let extra_attrs = std::mem::take(&mut self.extra_attrs);

        let id = match self.manual_id.take() {
            // Manual IDs are used verbatim but still registered so a later
            // generated slug cannot collide with them.
            Some(id) => {
                let count = self.id_counts.entry(id.clone()).or_insert(0);
                *count = (*count).max(1);
                id
            }
            None => self.generate_id(&text),
        };

        Some(Heading {
            level,
            id,
            extra_attrs,
            html,
        })
    }

    /// Slugify the heading text, suffixing duplicates.
    fn generate_id(&mut self, text: &str) -> String {
        let base_id = slugify(text);
        let count = self.id_counts.entry(base_id.clone()).or_default();
        let id = match *count {
            0 => base_id,
            n => format!("{base_id}-{n}"),
        };
        *count += 1;
        id
    }

    pub(crate) fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub(crate) fn push_html(&mut self, html: &str) {
        self.html.push_str(html);
    }
}

/// State for footnote numbering.
///
/// Footnotes are numbered in order of first appearance, whether that is a
/// reference or a definition, so references and their definitions always
/// agree on the label.
#[derive(Default)]
pub(crate) struct FootnoteState {
    numbers: HashMap<String, usize>,
}

impl FootnoteState {
    /// Get the number for a footnote name, assigning the next one if new.
    pub(crate) fn number(&mut self, name: &str) -> usize {
        let next = self.numbers.len() + 1;
        *self.numbers.entry(name.to_owned()).or_insert(next)
    }
}

/// Reduce text to a URL-safe anchor slug.
///
/// Lowercases ASCII alphanumerics, collapses runs of whitespace, dashes,
/// and underscores into single dashes, and drops everything else. Never
/// starts or ends with a dash.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();

    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if (c.is_whitespace() || c == '-' || c == '_')
            && !slug.is_empty()
            && !slug.ends_with('-')
        {
            slug.push('-');
        }
    }

    if slug.ends_with('-') {
        slug.pop();
    }

    slug
}

/// Escape the characters HTML assigns meaning to.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
