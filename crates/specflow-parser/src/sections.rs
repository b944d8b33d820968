//! List items under requirement-category sections
//!
//! Walks the markdown event stream (pulldown-cmark) and collects every
//! top-level list item found below a heading or label line that names a
//! requirement category. Nested items are folded into their parent.

use crate::ident::Draft;
use pulldown_cmark::{Event, Parser as MdParser, Tag, TagEnd};

const CATEGORY_KEYWORDS: &[&str] = &[
    "requirement",
    "user stor",
    "feature",
    "acceptance criteria",
    "functional",
    "capabilit",
    "use case",
];

/// Longest stand-alone line still treated as a section label
const MAX_LABEL_CHARS: usize = 80;

/// Does a heading or label name a requirement category?
pub(crate) fn is_category(title: &str) -> bool {
    let lower = title.to_lowercase();
    CATEGORY_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn as_label(paragraph: &str) -> Option<&str> {
    let text = paragraph.trim();
    if text.contains('\n') || text.chars().count() > MAX_LABEL_CHARS {
        return None;
    }
    if let Some(stripped) = text.strip_suffix(':') {
        return Some(stripped.trim());
    }
    (is_category(text) && text.split_whitespace().count() <= 6).then_some(text)
}

#[derive(Debug, Default)]
struct Scanner {
    section: Option<String>,
    depth: usize,
    heading: Option<String>,
    paragraph: Option<String>,
    item: Option<String>,
    drafts: Vec<Draft>,
}

impl Scanner {
    fn push_text(&mut self, text: &str) {
        if let Some(h) = self.heading.as_mut() {
            h.push_str(text);
        } else if let Some(item) = self.item.as_mut() {
            item.push_str(text);
        } else if let Some(p) = self.paragraph.as_mut() {
            p.push_str(text);
        }
    }

    fn push_break(&mut self) {
        if let Some(h) = self.heading.as_mut() {
            h.push(' ');
        } else if let Some(item) = self.item.as_mut() {
            item.push('\n');
        } else if let Some(p) = self.paragraph.as_mut() {
            p.push('\n');
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading { .. }) => self.heading = Some(String::new()),
            Event::End(TagEnd::Heading(_)) => {
                let title = self.heading.take().unwrap_or_default();
                let title = title.trim();
                self.section = is_category(title).then(|| title.to_string());
            }
            Event::Start(Tag::Paragraph) => {
                if let Some(item) = self.item.as_mut() {
                    if !item.is_empty() && !item.ends_with('\n') && !item.ends_with("- ") {
                        item.push('\n');
                    }
                } else if self.depth == 0 {
                    self.paragraph = Some(String::new());
                }
            }
            Event::End(TagEnd::Paragraph) => {
                if self.depth == 0 {
                    if let Some(p) = self.paragraph.take() {
                        if let Some(label) = as_label(&p) {
                            self.section = is_category(label).then(|| label.to_string());
                        }
                    }
                }
            }
            Event::Start(Tag::List(_)) => self.depth += 1,
            Event::End(TagEnd::List(_)) => self.depth = self.depth.saturating_sub(1),
            Event::Start(Tag::Item) => {
                if self.depth == 1 {
                    if self.section.is_some() {
                        self.item = Some(String::new());
                    }
                } else if let Some(item) = self.item.as_mut() {
                    item.push_str("\n- ");
                }
            }
            Event::End(TagEnd::Item) => {
                if self.depth == 1 {
                    if let Some(text) = self.item.take() {
                        if let Some(draft) = Draft::from_text(&text, self.section.as_deref()) {
                            self.drafts.push(draft);
                        }
                    }
                }
            }
            Event::Text(text) | Event::Code(text) => self.push_text(&text),
            Event::SoftBreak | Event::HardBreak => self.push_break(),
            _ => {}
        }
    }
}

/// Collect requirement items from category sections
pub(crate) fn scan(text: &str) -> Vec<Draft> {
    let mut scanner = Scanner::default();
    for event in MdParser::new(text) {
        scanner.handle(event);
    }
    scanner.drafts
}
