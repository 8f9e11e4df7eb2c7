//! Recursive-descent parser for normalized Ganesha configuration text
//!
//! Grammar:
//!
//! ```text
//! document     := (block | urlDirective)*
//! block        := NAME "{" body "}"
//! urlDirective := "%url" value NEWLINE
//! body         := (stanza | block)*
//! stanza       := key "=" value ";"
//! value        := INT | "true" | "false" | quotedString | value "," value
//! ```
//!
//! Input must already be normalized by [`normalize`](super::normalize).

use super::block::{Block, URL_BLOCK_NAME, Value};
use super::ParserOptions;
use crate::error::ParseError;
use tracing::trace;

const URL_DIRECTIVE: &str = "%url ";

/// Attribute names the block model reserves for itself
const RESERVED_KEYS: [&str; 2] = ["block_name", "_blocks_"];

/// Parse a normalized document into its top-level blocks
pub fn parse(normalized: &str, options: &ParserOptions) -> Result<Vec<Block>, ParseError> {
    Parser::new(normalized, options).parse_document()
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
    options: &'a ParserOptions,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, options: &'a ParserOptions) -> Self {
        Self {
            text,
            pos: 0,
            options,
        }
    }

    fn stream(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn malformed(&self, message: impl Into<String>) -> ParseError {
        ParseError::MalformedConfig {
            message: message.into(),
            parsed: self.text[..self.pos].to_string(),
            remaining: self.stream().to_string(),
        }
    }

    fn parse_document(&mut self) -> Result<Vec<Block>, ParseError> {
        let mut blocks = Vec::new();
        while !self.stream().is_empty() {
            blocks.push(self.parse_block_or_directive()?);
        }
        Ok(blocks)
    }

    fn parse_block_or_directive(&mut self) -> Result<Block, ParseError> {
        if self.options.url_directives && self.stream().starts_with('%') {
            return self.parse_url_directive();
        }

        let name = self.parse_block_name()?;
        trace!("Parsing block {} at {}", name, self.pos);
        let mut block = Block::new(name);
        self.parse_block_body(&mut block)?;
        if !self.stream().starts_with('}') {
            return Err(self.malformed("No closing bracket '}' found at the end of block"));
        }
        self.pos += 1;
        Ok(block)
    }

    fn parse_url_directive(&mut self) -> Result<Block, ParseError> {
        if !self.stream().starts_with(URL_DIRECTIVE) {
            return Err(self.malformed("Unsupported directive"));
        }
        self.pos += URL_DIRECTIVE.len();

        let stream = self.stream();
        let (value, consumed) = match stream.find('\n') {
            Some(idx) => (&stream[..idx], idx + 1),
            None => (stream, stream.len()),
        };
        self.pos += consumed;

        let value = value.trim();
        if value.is_empty() {
            return Err(self.malformed(format!("{} directive without a value", URL_BLOCK_NAME)));
        }
        Ok(Block::url(value))
    }

    fn parse_block_name(&mut self) -> Result<String, ParseError> {
        let idx = self
            .stream()
            .find('{')
            .ok_or_else(|| self.malformed("Cannot find block name"))?;
        let name = self.stream()[..idx].to_uppercase();
        if name.is_empty() {
            return Err(self.malformed("Empty block name"));
        }
        self.pos += idx + 1;
        Ok(name)
    }

    fn parse_block_body(&mut self, block: &mut Block) -> Result<(), ParseError> {
        let mut last_pos = self.pos;
        loop {
            let stream = self.stream();
            let semicolon = stream.find(';');
            let lbracket = stream.find('{');

            if stream.starts_with('}') {
                return Ok(());
            }

            match (semicolon, lbracket) {
                (Some(s), Some(l)) if s < l => self.parse_stanza(block)?,
                (Some(_), None) => self.parse_stanza(block)?,
                (Some(_), Some(_)) | (None, Some(_)) => {
                    let child = self.parse_block_or_directive()?;
                    block.children.push(child);
                }
                (None, None) => return Err(self.malformed("Malformed stanza: no semicolon found.")),
            }

            if last_pos == self.pos {
                return Err(self.malformed("Infinite loop while parsing block content"));
            }
            last_pos = self.pos;
        }
    }

    fn parse_stanza(&mut self, block: &mut Block) -> Result<(), ParseError> {
        let stream = self.stream();
        let semicolon = stream
            .find(';')
            .ok_or_else(|| self.malformed("Malformed stanza: no semicolon found."))?;
        let equal = match stream.find('=') {
            Some(idx) if idx < semicolon => idx,
            _ => return Err(self.malformed("Malformed stanza: no equal symbol found.")),
        };

        let key = stream[..equal].to_lowercase();
        if key.is_empty() {
            return Err(self.malformed("Malformed stanza: empty parameter name."));
        }
        if RESERVED_KEYS.contains(&key.as_str()) {
            return Err(self.malformed(format!("Reserved parameter name '{}'", key)));
        }

        let value = parse_value(&stream[equal + 1..semicolon]);
        block.attributes.insert(key, value);
        self.pos += semicolon + 1;
        Ok(())
    }
}

/// Parse a stanza value
///
/// A comma anywhere makes the value a list; each comma separated fragment is
/// parsed on its own.
pub fn parse_value(raw: &str) -> Value {
    if raw.contains(',') {
        Value::List(raw.split(',').map(|f| parse_list_item(f.trim())).collect())
    } else {
        parse_scalar(raw)
    }
}

/// A quoted list such as `"a,b"` splits inside the quotes, so a stray
/// quote may sit on either end of a fragment.
fn parse_list_item(fragment: &str) -> Value {
    if fragment.starts_with('"') || fragment.ends_with('"') {
        let inner = fragment.strip_prefix('"').unwrap_or(fragment);
        let inner = inner.strip_suffix('"').unwrap_or(inner);
        Value::Str(inner.to_string())
    } else {
        parse_scalar(fragment)
    }
}

fn parse_scalar(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Int(i);
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => match raw.strip_prefix('"') {
            Some(quoted) => Value::Str(quoted.strip_suffix('"').unwrap_or(quoted).to_string()),
            None => Value::Str(raw.to_string()),
        },
    }
}
