//! Addressability oracle.
//!
//! Purely syntactic and deliberately conservative: [`classify`] answers
//! "could `&expr` be taken legally by the compiler?", erring towards a skip
//! whenever it cannot be sure. Compilability is the non-negotiable
//! guarantee; completeness is not.
//!
//! Skip reasons are reported as one of four buckets on `InstrumentStats`.
//! This oracle actually distinguishes more distinct reasons than that
//! (constants; built-in functions; built-in types; function/type/package
//! identifiers; the stdlib-package heuristic; index expressions; literals;
//! blank). This implementation folds every "structurally or nominally not a
//! memory location" reason other than constant/literal/blank into
//! `Builtin`, since that is the closest of the four buckets in spirit —
//! see DESIGN.md.

use crate::bindings::Bindings;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use tree_sitter::Node;

/// Nullary predeclared identifiers. tree-sitter-go parses these as ordinary
/// `identifier` nodes (Go has no `nil`/`true`/`false`/`iota` keywords --
/// they are predeclared identifiers), so the oracle must recognize them by
/// name rather than by node kind.
static NULLARY_BUILTINS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["nil", "true", "false", "iota"].into_iter().collect());

/// Built-in functions that cannot be addressed.
static BUILTIN_FUNCS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "make", "new", "len", "cap", "append", "copy", "delete", "close", "panic", "recover",
        "print", "println", "complex", "real", "imag", "clear", "min", "max",
    ]
    .into_iter()
    .collect()
});

/// Built-in type names.
static BUILTIN_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16", "uint32", "uint64",
        "float32", "float64", "complex64", "complex128", "bool", "byte", "rune", "string",
        "error", "uintptr", "any", "comparable",
    ]
    .into_iter()
    .collect()
});

/// Closed allow-list of well-known standard-library package root names,
/// used as the fallback heuristic when in-file binding information for a
/// package qualifier is unavailable.
static STDLIB_PACKAGES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "bufio", "bytes", "context", "crypto", "encoding", "errors", "flag", "fmt", "io",
        "log", "math", "net", "os", "path", "reflect", "regexp", "runtime", "sort", "strconv",
        "strings", "sync", "syscall", "testing", "time", "unicode", "unsafe",
    ]
    .into_iter()
    .collect()
});

const DISCARD_IDENTIFIER: &str = "_";

/// True iff `expr` is the callee of an enclosing `call_expression` (its
/// `function` field), i.e. `expr(...)` or `expr.Field(...)`'s `expr.Field`
/// part. Addressing a call target is never valid in the target language:
/// neither a plain function nor a method value is addressable.
fn is_call_target(expr: Node<'_>) -> bool {
    expr.parent().is_some_and(|parent| {
        parent.kind() == "call_expression"
            && parent
                .child_by_field_name("function")
                .is_some_and(|function| function.id() == expr.id())
    })
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Addressability {
    Ok,
    Constant,
    Builtin,
    Literal,
    Blank,
}

impl Addressability {
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Addressability::Ok)
    }
}

/// Decides whether `expr` is a legal operand of `&` (or, for a dereference,
/// names the pointer identifier itself), and if not, why.
pub fn classify(expr: Node<'_>, text: &str, bindings: &Bindings) -> Addressability {
    match expr.kind() {
        kind if kind.ends_with("_literal") => Addressability::Literal,

        "identifier" if is_call_target(expr) => Addressability::Builtin,

        "identifier" => {
            let Ok(name) = expr.utf8_text(text.as_bytes()) else {
                return Addressability::Builtin;
            };
            if name == DISCARD_IDENTIFIER {
                Addressability::Blank
            } else if bindings.consts.contains(name) {
                Addressability::Constant
            } else if NULLARY_BUILTINS.contains(name)
                || BUILTIN_FUNCS.contains(name)
                || BUILTIN_TYPES.contains(name)
                || bindings.funcs.contains(name)
                || bindings.types.contains(name)
                || bindings.packages.contains(name)
                || STDLIB_PACKAGES.contains(name)
            {
                Addressability::Builtin
            } else {
                Addressability::Ok
            }
        }

        // Deliberate over-approximation: without type information we
        // cannot tell an addressable slice/array index from a
        // non-addressable map index, so every index expression is skipped.
        "index_expression" => Addressability::Builtin,

        // A selector used as a call's function (`t.Method()`, `pkg.Fn()`) is
        // skipped outright: without types, the oracle cannot tell a method
        // value (never addressable in the target language) from a
        // func-typed struct field (addressable), so it conservatively
        // treats every call-position selector as non-addressable. This is
        // the same compilability-over-completeness trade-off made
        // explicit above for index expressions -- see DESIGN.md.
        "selector_expression" if is_call_target(expr) => Addressability::Builtin,

        "selector_expression" => {
            let Some(operand) = expr.child_by_field_name("operand") else {
                return Addressability::Builtin;
            };
            if operand.kind() == "identifier" {
                if let Ok(name) = operand.utf8_text(text.as_bytes()) {
                    if bindings.packages.contains(name) || STDLIB_PACKAGES.contains(name) {
                        return Addressability::Builtin;
                    }
                }
            }
            Addressability::Ok
        }

        "parenthesized_expression" => expr
            .named_child(0)
            .map_or(Addressability::Builtin, |inner| classify(inner, text, bindings)),

        // Unary dereference (`*p`): `p` is the address, and the oracle
        // considers `*p` itself addressable as an access target.
        "unary_expression" => Addressability::Ok,

        _ => Addressability::Ok,
    }
}
