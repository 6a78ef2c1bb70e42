//! Per-source chunkers turning raw files into passages

use crate::corpus::{Passage, SourceClass};
use uuid::Uuid;

/// Section window for documentation, in characters
pub const DOCS_WINDOW: usize = 1200;
/// Section window for blog posts, in characters
pub const BLOG_WINDOW: usize = 1600;

const UNTITLED: &str = "Untitled";

/// Split `text` according to the conventions of `class`
pub fn chunk(class: SourceClass, text: &str, origin: &str) -> Vec<Passage> {
    match class {
        SourceClass::Docs => chunk_sections(class, text, origin, DOCS_WINDOW),
        SourceClass::Blog => chunk_sections(class, text, origin, BLOG_WINDOW),
        SourceClass::Forum => chunk_posts(text, origin),
    }
}

/// Markdown-heading sections, flushed early once a section exceeds `window`
///
/// Each passage carries the enclosing heading as its `section` attribute.
pub fn chunk_sections(class: SourceClass, text: &str, origin: &str, window: usize) -> Vec<Passage> {
    let mut passages = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut buffered_chars = 0usize;
    let mut section = UNTITLED.to_string();

    let mut flush = |buffer: &mut Vec<&str>, buffered_chars: &mut usize, section: &str| {
        if buffer.is_empty() {
            return;
        }
        if let Some(passage) = make_passage(class, &buffer.join("\n"), origin) {
            passages.push(passage.with_attribute("section", section));
        }
        buffer.clear();
        *buffered_chars = 0;
    };

    for line in text.lines() {
        if line.starts_with('#') {
            flush(&mut buffer, &mut buffered_chars, &section);
            section = line.trim_matches(|c| c == '#' || c == ' ').trim().to_string();
        } else {
            buffer.push(line);
            buffered_chars += line.chars().count();
            if buffered_chars > window {
                flush(&mut buffer, &mut buffered_chars, &section);
            }
        }
    }

    flush(&mut buffer, &mut buffered_chars, &section);
    passages
}

/// One passage per blank-line-separated post
pub fn chunk_posts(text: &str, origin: &str) -> Vec<Passage> {
    let normalized = text.replace("\r\n", "\n");
    normalized
        .split("\n\n")
        .filter_map(|block| make_passage(SourceClass::Forum, block, origin))
        .collect()
}

fn make_passage(class: SourceClass, text: &str, origin: &str) -> Option<Passage> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Passage::new(Uuid::new_v4().to_string(), class, origin, trimmed).ok()
}
