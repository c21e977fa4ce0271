//! Event-driven markdown to HTML rendering.

use std::fmt::Write;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::include::strip_includes;
use crate::lists::break_lists;
use crate::state::{
    CodeBlockState, FootnoteState, HeadingState, ImageState, TableState, escape_html,
};

/// Render markdown source to an HTML fragment.
///
/// Never fails: malformed input degrades to whatever the parser makes of
/// it, and the same input always yields the same fragment.
#[must_use]
pub fn render_markdown(source: &str) -> String {
    MarkdownRenderer::new().render(source)
}

/// Parser options for the supported dialect.
///
/// Task lists and smart punctuation are deliberately off.
fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_MATH
        | Options::ENABLE_DEFINITION_LIST
        | Options::ENABLE_SUPERSCRIPT
        | Options::ENABLE_SUBSCRIPT
}

/// Renders pulldown-cmark events to an HTML fragment.
///
/// The renderer is consumed per document so heading IDs and footnote
/// numbers always restart from a clean slate.
pub struct MarkdownRenderer {
    output: String,
    /// Code block rendering state.
    code: CodeBlockState,
    /// Table rendering state.
    table: TableState,
    /// Image alt text capture state.
    image: ImageState,
    /// Heading buffering and anchor ID state.
    heading: HeadingState,
    /// Footnote numbering state.
    footnotes: FootnoteState,
}

impl MarkdownRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::default(),
            footnotes: FootnoteState::default(),
        }
    }

    /// Render markdown source and return the HTML fragment.
    ///
    /// Two passes run before parsing: include directives are stripped
    /// (nothing reads files here), and blank-line runs between list items
    /// are turned into list breaks.
    #[must_use]
    pub fn render(mut self, source: &str) -> String {
        let source = strip_includes(source);
        let source = break_lists(&source);
        for event in Parser::new_ext(&source, parser_options()) {
            self.process_event(event);
        }
        self.output
    }

    /// Push inline HTML to the heading buffer or the output based on context.
    ///
    /// While an image is collecting alt text, markup is dropped: alt
    /// attributes hold plain text only.
    fn push_inline(&mut self, content: &str) {
        if self.image.is_active() {
            return;
        }
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::InlineMath(math) => self.inline_math(&math),
            Event::DisplayMath(math) => self.display_math(&math),
            Event::Html(html) | Event::InlineHtml(html) => self.raw_html(&html),
            Event::FootnoteReference(name) => self.footnote_reference(&name),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.hard_break(),
            Event::Rule => self.horizontal_rule(),
            // Task list syntax is not part of the dialect.
            Event::TaskListMarker(_) => {}
        }
    }

    #[allow(clippy::too_many_lines)]
    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if !self.code.is_active() {
                    self.output.push_str("<p>");
                }
            }
            Tag::Heading {
                level,
                id,
                classes,
                attrs,
            } => {
                // Opening tag is written in end_tag once the ID is known.
                let mut extra = String::new();
                if !classes.is_empty() {
                    let classes: Vec<String> = classes.iter().map(|c| escape_html(c)).collect();
                    write!(extra, r#" class="{}""#, classes.join(" ")).unwrap();
                }
                for (name, value) in attrs {
                    match value {
                        Some(value) => {
                            write!(extra, r#" {}="{}""#, escape_html(&name), escape_html(&value))
                                .unwrap();
                        }
                        None => write!(extra, r#" {}="""#, escape_html(&name)).unwrap(),
                    }
                }
                self.heading.start(
                    heading_level_to_num(level),
                    id.map(|id| id.to_string()),
                    extra,
                );
            }
            Tag::BlockQuote(_) => {
                self.output.push_str("<blockquote>");
            }
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) if !info.is_empty() => {
                        info.split_whitespace().next().map(str::to_owned)
                    }
                    _ => None,
                };
                self.code.start(lang);
            }
            Tag::List(start) => match start {
                Some(1) => self.output.push_str("<ol>"),
                Some(n) => write!(self.output, r#"<ol start="{n}">"#).unwrap(),
                None => self.output.push_str("<ul>"),
            },
            Tag::Item => {
                self.output.push_str("<li>");
            }
            Tag::FootnoteDefinition(name) => {
                let number = self.footnotes.number(&name);
                write!(
                    self.output,
                    r##"<div class="footnote-definition" id="fn-{}"><sup class="footnote-definition-label">{number}</sup>"##,
                    escape_html(&name)
                )
                .unwrap();
            }
            Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
            Tag::DefinitionList => {
                self.output.push_str("<dl>");
            }
            Tag::DefinitionListTitle => {
                self.output.push_str("<dt>");
            }
            Tag::DefinitionListDefinition => {
                self.output.push_str("<dd>");
            }
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_style();
                let tag = if self.table.is_in_head() { "th" } else { "td" };
                write!(self.output, "<{tag}{align}>").unwrap();
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Link {
                dest_url, title, ..
            } => {
                let mut link = format!(r#"<a href="{}""#, escape_html(&dest_url));
                if !title.is_empty() {
                    write!(link, r#" title="{}""#, escape_html(&title)).unwrap();
                }
                if is_absolute_url(&dest_url) {
                    link.push_str(r#" rel="noreferrer noopener""#);
                }
                link.push('>');
                self.push_inline(&link);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                // Start collecting alt text; the tag is closed in end_tag.
                self.image.start();
                write!(self.output, r#"<img src="{}""#, escape_html(&dest_url)).unwrap();
                if !title.is_empty() {
                    write!(self.output, r#" title="{}""#, escape_html(&title)).unwrap();
                }
            }
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
        }
    }

    #[allow(clippy::too_many_lines)]
    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if !self.code.is_active() {
                    self.output.push_str("</p>");
                }
            }
            TagEnd::Heading(_) => {
                if let Some(heading) = self.heading.complete() {
                    write!(
                        self.output,
                        r#"<h{level} id="{id}"{attrs}>{html}</h{level}>"#,
                        level = heading.level,
                        id = escape_html(&heading.id),
                        attrs = heading.extra_attrs,
                        html = heading.html.trim()
                    )
                    .unwrap();
                }
            }
            TagEnd::BlockQuote(_) => {
                self.output.push_str("</blockquote>");
            }
            TagEnd::CodeBlock => {
                let (lang, content) = self.code.end();
                if let Some(lang) = lang {
                    write!(
                        self.output,
                        r#"<pre><code class="language-{}">{}</code></pre>"#,
                        escape_html(&lang),
                        escape_html(&content)
                    )
                    .unwrap();
                } else {
                    write!(
                        self.output,
                        "<pre><code>{}</code></pre>",
                        escape_html(&content)
                    )
                    .unwrap();
                }
            }
            TagEnd::List(ordered) => {
                self.output
                    .push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => {
                self.output.push_str("</li>");
            }
            TagEnd::FootnoteDefinition => {
                self.output.push_str("</div>");
            }
            TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
            TagEnd::Image => {
                // Close the image tag with the collected alt text.
                let alt = self.image.end();
                write!(
                    self.output,
                    r#" alt="{}" loading="lazy">"#,
                    escape_html(&alt)
                )
                .unwrap();
            }
            TagEnd::DefinitionList => {
                self.output.push_str("</dl>");
            }
            TagEnd::DefinitionListTitle => {
                self.output.push_str("</dt>");
            }
            TagEnd::DefinitionListDefinition => {
                self.output.push_str("</dd>");
            }
            TagEnd::Table => {
                self.output.push_str("</tbody></table>");
            }
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => {
                self.output.push_str("</tr>");
            }
            TagEnd::TableCell => {
                self.output.push_str(if self.table.is_in_head() {
                    "</th>"
                } else {
                    "</td>"
                });
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Link => self.push_inline("</a>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
        }
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
        } else if self.image.is_active() {
            self.image.push_str(text);
        } else if self.heading.is_active() {
            self.heading.push_text(text);
            self.heading.push_html(&escape_html(text));
        } else {
            self.output.push_str(&escape_html(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.image.is_active() {
            self.image.push_str(code);
        } else if self.heading.is_active() {
            self.heading.push_text(code);
            self.heading
                .push_html(&format!("<code>{}</code>", escape_html(code)));
        } else {
            write!(self.output, "<code>{}</code>", escape_html(code)).unwrap();
        }
    }

    /// Math spans carry MathJax delimiters so the client-side library can
    /// find them in the rendered page.
    fn inline_math(&mut self, math: &str) {
        let span = format!(
            r#"<span class="math math-inline">\({}\)</span>"#,
            escape_html(math)
        );
        self.push_inline(&span);
    }

    fn display_math(&mut self, math: &str) {
        let span = format!(
            r#"<span class="math math-display">\[{}\]</span>"#,
            escape_html(math)
        );
        self.push_inline(&span);
    }

    fn raw_html(&mut self, html: &str) {
        if self.image.is_active() {
            self.image.push_str(html);
        } else if self.heading.is_active() {
            self.heading.push_html(html);
        } else {
            self.output.push_str(html);
        }
    }

    fn footnote_reference(&mut self, name: &str) {
        let number = self.footnotes.number(name);
        let reference = format!(
            r##"<sup class="footnote-reference"><a href="#fn-{}">{number}</a></sup>"##,
            escape_html(name)
        );
        self.push_inline(&reference);
    }

    fn soft_break(&mut self) {
        if self.code.is_active() {
            self.code.push_newline();
        } else if self.image.is_active() {
            self.image.push_str(" ");
        } else if self.heading.is_active() {
            self.heading.push_text(" ");
            self.heading.push_html("\n");
        } else {
            self.output.push('\n');
        }
    }

    fn hard_break(&mut self) {
        if self.image.is_active() {
            self.image.push_str(" ");
        } else {
            self.push_inline("<br>");
        }
    }

    fn horizontal_rule(&mut self) {
        self.output.push_str("<hr>");
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert heading level enum to number.
fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Absolute and protocol-relative destinations point off-site.
fn is_absolute_url(url: &str) -> bool {
    if url.starts_with("//") {
        return true;
    }
    // scheme = ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )
    match url.split_once(':') {
        Some((scheme, _)) => {
            scheme
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}
