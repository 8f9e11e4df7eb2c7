//! Canonical text rendering of block trees
//!
//! Output uses four spaces per nesting level, one `key = value;` line per
//! attribute, and a blank line after every block. Falsy attributes (0,
//! `false`, empty string, empty list) are left out.

use super::block::{Block, BlockKind, URL_BLOCK_NAME, Value};
use std::fmt::Write as _;

const INDENT: usize = 4;

/// Render blocks as a configuration document
///
/// # Example
///
/// ```
/// use ganesha_core::conf::{Block, write};
///
/// let export = Block::new("EXPORT")
///     .with_attr("export_id", 1i64)
///     .with_attr("path", "/");
/// assert_eq!(write(&[export]), "EXPORT {\n    export_id = 1;\n    path = \"/\";\n}\n\n");
/// ```
pub fn write(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        write_block(&mut out, block, 0);
    }
    out
}

fn write_block(out: &mut String, block: &Block, depth: usize) {
    if block.kind() == BlockKind::Url {
        let _ = write!(out, "{} \"{}\"\n\n", URL_BLOCK_NAME, block.url_target().unwrap_or_default());
        return;
    }

    indent(out, depth);
    out.push_str(&block.name);
    out.push_str(" {\n");
    write_block_body(out, block, depth + 1);
    indent(out, depth);
    out.push_str("}\n\n");
}

fn write_block_body(out: &mut String, block: &Block, depth: usize) {
    for (key, value) in block.attributes.iter() {
        if value.is_falsy() {
            continue;
        }
        indent(out, depth);
        let _ = writeln!(out, "{} = {};", key, format_value(block, key, value));
    }
    for child in &block.children {
        write_block(out, child, depth);
    }
}

fn format_value(block: &Block, key: &str, value: &Value) -> String {
    match value {
        Value::List(items) => items
            .iter()
            .map(|item| format_value(block, key, item))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Str(s) if is_bare_token(block, key) => s.clone(),
        Value::Str(s) => format!("\"{}\"", s),
    }
}

/// Client address lists are written unquoted
fn is_bare_token(block: &Block, key: &str) -> bool {
    block.kind() == BlockKind::Client && key == "clients"
}

fn indent(out: &mut String, depth: usize) {
    out.extend(std::iter::repeat_n(' ', depth * INDENT));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_write_nested_export() {
        let export = Block::new("EXPORT")
            .with_attr("export_id", 1i64)
            .with_attr("path", "/")
            .with_child(Block::new("FSAL").with_attr("name", "CEPH"))
            .with_child(
                Block::new("CLIENT")
                    .with_attr("clients", Value::List(vec!["10.0.0.1".into(), "10.0.0.2".into()]))
                    .with_attr("access_type", "RW"),
            );

        let expected = "\
EXPORT {
    export_id = 1;
    path = \"/\";
    FSAL {
        name = \"CEPH\";
    }

    CLIENT {
        clients = 10.0.0.1, 10.0.0.2;
        access_type = \"RW\";
    }

}

";
        assert_eq!(write(&[export]), expected);
    }

    #[test]
    fn test_write_skips_falsy() {
        let block = Block::new("EXPORT")
            .with_attr("export_id", 0i64)
            .with_attr("attr_expiration_time", 60i64)
            .with_attr("squash", "")
            .with_attr("manage_gids", false)
            .with_attr("delegations", true)
            .with_attr("protocols", Value::List(vec![]));
        assert_eq!(
            write(&[block]),
            "EXPORT {\n    attr_expiration_time = 60;\n    delegations = true;\n}\n\n"
        );
    }

    #[test]
    fn test_write_url_directives() {
        let blocks = vec![
            Block::url("rados://nfs/ganesha/export-1"),
            Block::url("rados://nfs/ganesha/export-2"),
        ];
        assert_eq!(
            write(&blocks),
            "%url \"rados://nfs/ganesha/export-1\"\n\n%url \"rados://nfs/ganesha/export-2\"\n\n"
        );
    }

    #[test]
    fn test_clients_quoted_outside_client_block() {
        let block = Block::new("EXPORT").with_attr("clients", "10.0.0.1");
        assert_eq!(write(&[block]), "EXPORT {\n    clients = \"10.0.0.1\";\n}\n\n");
    }

    #[test]
    fn test_list_of_strings_quoted() {
        let block = Block::new("EXPORT").with_attr(
            "protocols",
            Value::List(vec!["3".into(), Value::Int(4)]),
        );
        assert_eq!(write(&[block]), "EXPORT {\n    protocols = \"3\", 4;\n}\n\n");
    }

    #[test]
    fn test_write_empty() {
        assert_eq!(write(&[]), "");
    }
}
