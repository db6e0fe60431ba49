//! Bot reply formatting.
//!
//! Turns raw reply text into blocks a surface can lay out without parsing
//! text itself:
//! - Lines starting with `N. ` become ordered-list items.
//! - Runs of text separated by blank lines become paragraphs.
//! - Single line breaks inside a paragraph are kept as separate lines.

use std::sync::LazyLock;

use regex::Regex;

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\.\s+(\S.*)$").unwrap());

/// A laid-out piece of a bot reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Lines of one paragraph, to be separated by line breaks.
    Paragraph(Vec<String>),
    /// An ordered-list item with the number the server wrote.
    ListItem { number: u32, text: String },
}

/// Format a bot reply into blocks.
#[must_use]
pub fn format_reply(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut lines: Vec<String> = Vec::new();

    let flush = |lines: &mut Vec<String>, blocks: &mut Vec<Block>| {
        if !lines.is_empty() {
            blocks.push(Block::Paragraph(std::mem::take(lines)));
        }
    };

    for raw in text.lines() {
        let line = raw.trim_end();
        if line.trim().is_empty() {
            flush(&mut lines, &mut blocks);
            continue;
        }

        if let Some(item) = list_item(line) {
            flush(&mut lines, &mut blocks);
            blocks.push(item);
        } else {
            lines.push(line.to_string());
        }
    }
    flush(&mut lines, &mut blocks);

    blocks
}

fn list_item(line: &str) -> Option<Block> {
    let caps = LIST_ITEM.captures(line)?;
    let number = caps.get(1)?.as_str().parse().ok()?;
    let text = caps.get(2)?.as_str().to_string();
    Some(Block::ListItem { number, text })
}

/// Render blocks back to plain text lines, numbering list items.
///
/// Used by text surfaces that cannot draw real lists.
#[must_use]
pub fn to_lines(blocks: &[Block]) -> Vec<String> {
    let mut out = Vec::new();
    let mut previous_was_paragraph = false;

    for block in blocks {
        match block {
            Block::Paragraph(lines) => {
                if !out.is_empty() {
                    out.push(String::new());
                }
                out.extend(lines.iter().cloned());
                previous_was_paragraph = true;
            }
            Block::ListItem { number, text } => {
                if previous_was_paragraph {
                    out.push(String::new());
                }
                out.push(format!("  {number}. {text}"));
                previous_was_paragraph = false;
            }
        }
    }

    out
}
