//! Reply Parsing
//!
//! Models are asked for "JSON only" but routinely wrap it in prose, code
//! fences or reasoning blocks. These helpers reduce a raw reply to the first
//! complete JSON object, leaving deserialization to the caller.

use regex::Regex;
use std::sync::OnceLock;

/// Why no JSON object could be taken from a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractError {
    /// The reply contains no `{` at all
    NoObject,
    /// A `{` was found but never closed
    Unbalanced,
}

fn think_block() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<think>.*?</think>").ok()).as_ref()
}

/// Strip `<think>...</think>` reasoning blocks from a reply.
///
/// An unclosed `<think>` keeps whatever came before it when that part holds
/// an object, otherwise the text after the tag.
pub fn strip_think_tags(text: &str) -> String {
    let text = match think_block() {
        Some(re) => re.replace_all(text, "").into_owned(),
        None => text.to_string(),
    };

    match text.to_ascii_lowercase().find("<think>") {
        Some(start) => {
            let before = text[..start].trim();
            if before.contains('{') {
                before.to_string()
            } else {
                text[start + "<think>".len()..].trim().to_string()
            }
        }
        None => text.trim().to_string(),
    }
}

/// Return the first balanced `{...}` span in `text`.
///
/// Braces inside JSON string literals (including escaped quotes) do not
/// count towards nesting.
pub fn extract_json_object(text: &str) -> Result<&str, ExtractError> {
    let start = text.find('{').ok_or(ExtractError::NoObject)?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    Err(ExtractError::Unbalanced)
}
