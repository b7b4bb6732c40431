//! A minimal in-file symbol table.
//!
//! The oracle wants to know whether an identifier's binding object is a
//! constant, function, type, or package -- "when resolvable in-file".
//! tree-sitter performs no semantic analysis, so "resolvable in-file" here
//! means: found by a single shallow scan of this file's top-level
//! declarations. This is deliberately weaker than a real name-resolution
//! pass (see DESIGN.md for the chosen trade-off) and is meant only to catch
//! the common cases the built-in/stdlib allow-lists in the oracle can't.

use crate::parser::ParsedFile;
use std::collections::HashSet;
use tree_sitter::Node;

#[derive(Debug, Default)]
pub struct Bindings {
    pub consts: HashSet<String>,
    pub types: HashSet<String>,
    pub funcs: HashSet<String>,
    /// Local names bound by import declarations (the alias if one is given,
    /// otherwise the package's default name, approximated as the last path
    /// component).
    pub packages: HashSet<String>,
}

impl Bindings {
    pub fn collect(file: &ParsedFile<'_>) -> Self {
        let mut bindings = Self::default();
        let mut cursor = file.tree.root_node().walk();
        for decl in file.tree.root_node().named_children(&mut cursor) {
            match decl.kind() {
                "const_declaration" => collect_spec_names(decl, file.text, &mut bindings.consts),
                "type_declaration" => collect_type_names(decl, file.text, &mut bindings.types),
                "function_declaration" => {
                    if let Some(name) = decl
                        .child_by_field_name("name")
                        .and_then(|n| n.utf8_text(file.text.as_bytes()).ok())
                    {
                        bindings.funcs.insert(name.to_owned());
                    }
                }
                "import_declaration" => collect_import_names(decl, file.text, &mut bindings.packages),
                _ => {}
            }
        }
        bindings
    }
}

fn collect_spec_names(decl: Node<'_>, text: &str, out: &mut HashSet<String>) {
    let mut cursor = decl.walk();
    for spec in decl.named_children(&mut cursor) {
        if spec.kind() != "const_spec" {
            continue;
        }
        if let Some(names) = spec.child_by_field_name("name") {
            push_identifier(names, text, out);
        } else {
            let mut spec_cursor = spec.walk();
            for child in spec.named_children(&mut spec_cursor) {
                if child.kind() == "identifier" {
                    push_identifier(child, text, out);
                }
            }
        }
    }
}

fn collect_type_names(decl: Node<'_>, text: &str, out: &mut HashSet<String>) {
    let mut cursor = decl.walk();
    for spec in decl.named_children(&mut cursor) {
        if spec.kind() != "type_spec" {
            continue;
        }
        if let Some(name) = spec
            .child_by_field_name("name")
            .and_then(|n| n.utf8_text(text.as_bytes()).ok())
        {
            out.insert(name.to_owned());
        }
    }
}

fn collect_import_names(decl: Node<'_>, text: &str, out: &mut HashSet<String>) {
    let mut cursor = decl.walk();
    for child in decl.named_children(&mut cursor) {
        if child.kind() == "import_spec_list" {
            let mut inner_cursor = child.walk();
            for import_spec in child.named_children(&mut inner_cursor) {
                record_import_spec(import_spec, text, out);
            }
        } else if child.kind() == "import_spec" {
            record_import_spec(child, text, out);
        }
    }
}

fn record_import_spec(import_spec: Node<'_>, text: &str, out: &mut HashSet<String>) {
    if import_spec.kind() != "import_spec" {
        return;
    }
    if let Some(alias) = import_spec
        .child_by_field_name("name")
        .and_then(|n| n.utf8_text(text.as_bytes()).ok())
    {
        out.insert(alias.to_owned());
        return;
    }
    if let Some(path_node) = import_spec.child_by_field_name("path") {
        if let Ok(path_text) = path_node.utf8_text(text.as_bytes()) {
            let trimmed = path_text.trim_matches('"');
            if let Some(last) = trimmed.rsplit('/').next() {
                out.insert(last.to_owned());
            }
        }
    }
}

fn push_identifier(node: Node<'_>, text: &str, out: &mut HashSet<String>) {
    if node.kind() == "identifier" {
        if let Ok(name) = node.utf8_text(text.as_bytes()) {
            out.insert(name.to_owned());
        }
        return;
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        push_identifier(child, text, out);
    }
}
