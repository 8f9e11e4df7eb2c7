//! Comment stripping and whitespace normalization
//!
//! The parser works on a compacted form of the document: comments removed,
//! and all whitespace outside quoted strings dropped. `%` directives stay on
//! their own line so the parser can find where each one ends.

use super::ParserOptions;

/// Normalize a raw configuration document for the block parser
///
/// # Example
///
/// ```
/// use ganesha_core::conf::{ParserOptions, normalize};
///
/// let raw = "EXPORT {\n  path = \"/a b\"; # comment\n}\n";
/// assert_eq!(normalize(raw, &ParserOptions::default()), "EXPORT{path=\"/a b\";}");
/// ```
pub fn normalize(raw: &str, options: &ParserOptions) -> String {
    let text = strip_comments(raw, options);
    remove_whitespace(&text, options)
}

/// Pass 1: drop `#` comments and join lines
///
/// Line based and unaware of quoting: a `#` inside a quoted string still
/// starts a comment.
fn strip_comments(raw: &str, options: &ParserOptions) -> String {
    let mut text = String::with_capacity(raw.len());
    for line in raw.split('\n') {
        match line.find('#') {
            Some(idx) => text.push_str(&line[..idx]),
            None => text.push_str(line),
        }
        if options.url_directives && line.starts_with('%') {
            text.push('\n');
        }
    }
    text
}

/// Pass 2: drop whitespace outside strings and directives
fn remove_whitespace(text: &str, options: &ParserOptions) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut in_section = false;
    let mut prev: Option<char> = None;

    for cha in text.chars() {
        let escaped = prev == Some('\\');

        if in_section {
            if cha == '\n' {
                out.push(cha);
                in_section = false;
            } else if cha != '"' || escaped {
                out.push(cha);
            }
        } else if options.url_directives
            && !in_string
            && cha == '%'
            && matches!(prev, None | Some('\n') | Some('}'))
        {
            in_section = true;
            out.push(cha);
        } else {
            if in_string || !matches!(cha, ' ' | '\t' | '\n') {
                out.push(cha);
            }
            if cha == '"' && !escaped {
                in_string = !in_string;
            }
        }

        prev = Some(cha);
    }

    out
}
