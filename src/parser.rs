//! Parser adapter.
//!
//! Uses `tree-sitter` + `tree-sitter-go`. Comments are preserved
//! automatically: tree-sitter's concrete syntax tree retains every byte of
//! the source, and since the emitter (`rewriter.rs`) only ever splices
//! *around* untouched spans of the original text, comments attached
//! anywhere outside an inserted span survive verbatim without any extra
//! bookkeeping.

use crate::error::ParseError;
use once_cell::sync::Lazy;
use tree_sitter::{Language, Parser, Tree};

pub(crate) static LANGUAGE: Lazy<Language> =
    Lazy::new(|| Language::from(tree_sitter_go::LANGUAGE));

pub struct ParsedFile<'src> {
    pub path: String,
    pub text: &'src str,
    pub tree: Tree,
}

/// Parses `text` (attributed to `path` for error messages) into a
/// [`ParsedFile`]. Fails with a [`ParseError`] if tree-sitter could not
/// build a tree at all, or if the tree it built contains an error or
/// missing node — tree-sitter does not fail `parse()` on invalid syntax, it
/// returns a best-effort error tree instead, so the adapter must actively
/// scan for such nodes to make a syntax error fatal for the file.
pub fn parse<'src>(path: &str, text: &'src str) -> Result<ParsedFile<'src>, ParseError> {
    let mut parser = Parser::new();
    parser.set_language(&LANGUAGE).map_err(|err| ParseError {
        file: path.to_owned(),
        line: 1,
        col: 0,
        message: format!("failed to load Go grammar: {err}"),
        suggestion: None,
    })?;

    let tree = parser.parse(text, None).ok_or_else(|| ParseError {
        file: path.to_owned(),
        line: 1,
        col: 0,
        message: "tree-sitter produced no parse tree".to_owned(),
        suggestion: None,
    })?;

    if let Some(node) = first_error_node(tree.root_node()) {
        let start = node.start_position();
        return Err(ParseError {
            file: path.to_owned(),
            line: start.row + 1,
            col: start.column,
            message: format!("syntax error near `{}`", node_text(node, text)),
            suggestion: None,
        });
    }

    Ok(ParsedFile {
        path: path.to_owned(),
        text,
        tree,
    })
}

fn node_text<'a>(node: tree_sitter::Node<'_>, text: &'a str) -> &'a str {
    node.utf8_text(text.as_bytes()).unwrap_or("<invalid utf-8>")
}

fn first_error_node(node: tree_sitter::Node<'_>) -> Option<tree_sitter::Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(err) = first_error_node(child) {
            return Some(err);
        }
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_valid_source() {
        let src = "package main\n\nfunc main() {}\n";
        let parsed = parse("f.go", src).unwrap();
        assert_eq!(parsed.tree.root_node().kind(), "source_file");
    }

    #[test]
    fn rejects_invalid_source() {
        let src = "package main\n\nfunc main( {\n";
        let err = parse("f.go", src).unwrap_err();
        assert_eq!(err.file, "f.go");
    }
}
