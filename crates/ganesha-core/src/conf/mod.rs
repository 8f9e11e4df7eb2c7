//! Ganesha configuration grammar
//!
//! - [`normalize`]: comment and whitespace removal
//! - [`parse`]: normalized text → [`Block`] tree
//! - [`write`]: [`Block`] tree → canonical text
//!
//! Round trips are not byte-exact. Lost on the way:
//!
//! - comments and layout
//! - falsy attributes, which are dropped on write
//! - quoting around commas: any value containing `,` parses as a list, so
//!   `path = "/data,archive"` reads back as two strings
//! - one-item lists, which are written as the bare item and read back as a
//!   scalar

pub mod block;
pub mod parser;
pub mod tokenizer;
pub mod writer;

pub use block::{Attributes, Block, BlockKind, EXPORT_ID_KEY, URL_BLOCK_NAME, Value};
pub use parser::{parse, parse_value};
pub use tokenizer::normalize;
pub use writer::write;

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Grammar feature switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserOptions {
    /// Recognize `%url` directives
    ///
    /// When disabled, `%` is an ordinary character.
    #[serde(default = "default_url_directives")]
    pub url_directives: bool,
}

fn default_url_directives() -> bool {
    true
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            url_directives: default_url_directives(),
        }
    }
}

/// Normalize and parse a raw document with default options
pub fn parse_config(raw: &str) -> Result<Vec<Block>, ParseError> {
    parse_config_with(raw, &ParserOptions::default())
}

/// Normalize and parse a raw document
pub fn parse_config_with(raw: &str, options: &ParserOptions) -> Result<Vec<Block>, ParseError> {
    let normalized = normalize(raw, options);
    debug!("Normalized config: {:?}", normalized);
    let blocks = parse(&normalized, options)?;
    debug!("Parsed {} block(s)", blocks.len());
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_then_write_is_stable() {
        let raw = r#"
            # Generated by DeepSea
            EXPORT
            {
                Export_Id = 3;
                Path = "/volumes";
                Pseudo = "/cephfs";
                Access_Type = "RW";
                Squash = "No_root_squash";
                Protocols = 3, 4;
                FSAL {
                    Name = "CEPH";
                }
            }
        "#;
        let blocks = parse_config(raw).unwrap();
        let written = write(&blocks);
        let reparsed = parse_config(&written).unwrap();
        assert_eq!(blocks, reparsed);
        assert_eq!(write(&reparsed), written);
    }

    #[test]
    fn test_comma_in_string_reads_as_list() {
        let blocks = parse_config("EXPORT { path = \"/data,archive\"; }").unwrap();
        let expected = Value::List(vec![Value::from("/data"), Value::from("archive")]);
        assert_eq!(blocks[0].get("path"), Some(&expected));

        let reparsed = parse_config(&write(&blocks)).unwrap();
        assert_eq!(reparsed[0].get("path"), Some(&expected));
    }

    #[test]
    fn test_single_item_list_reads_back_as_scalar() {
        let export = Block::new("EXPORT").with_attr("protocols", Value::List(vec![Value::Int(4)]));
        let written = write(&[export]);
        assert_eq!(written, "EXPORT {\n    protocols = 4;\n}\n\n");

        let reparsed = parse_config(&written).unwrap();
        assert_eq!(reparsed[0].get("protocols"), Some(&Value::Int(4)));
    }

    #[test]
    fn test_options_default_from_json() {
        let options: ParserOptions = serde_json::from_str("{}").unwrap();
        assert!(options.url_directives);
    }
}
