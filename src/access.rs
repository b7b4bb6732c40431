//! [`AccessKind`] and address-expression synthesis.

use tree_sitter::Node;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AccessKind {
    Read,
    Write,
}

impl AccessKind {
    /// The name of the barrier-runtime function this access kind calls.
    #[must_use]
    pub fn barrier_fn(self) -> &'static str {
        match self {
            AccessKind::Read => "RaceRead",
            AccessKind::Write => "RaceWrite",
        }
    }
}

/// A synthesized, well-formed address expression, e.g. `&x`, `p`, `&o.f`.
///
/// Rather than manufacturing new AST nodes, this crate's emitter splices
/// text directly, so the address expression *is* its final source text.
/// Two points whose `AddressExpr`s are equal as strings are, by
/// construction (see `address_of` below), syntactically equal in the
/// structural sense the coalescing analyzer requires: each string is built
/// from exactly one of the four LHS forms below, so string equality cannot
/// conflate two differently-shaped expressions.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AddressExpr(pub String);

impl std::fmt::Display for AddressExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Synthesizes the address expression for a left-hand-side form accepted by
/// the oracle. Returns `None` for any unrecognized LHS shape; the caller
/// silently skips the access in that case.
pub fn address_of(lhs: Node<'_>, text: &str) -> Option<AddressExpr> {
    match lhs.kind() {
        "identifier" => {
            let name = lhs.utf8_text(text.as_bytes()).ok()?;
            Some(AddressExpr(format!("&{name}")))
        }
        "unary_expression" => {
            let operator = lhs.child_by_field_name("operator")?;
            if operator.utf8_text(text.as_bytes()).ok()? != "*" {
                return None;
            }
            let operand = lhs.child_by_field_name("operand")?;
            Some(AddressExpr(operand.utf8_text(text.as_bytes()).ok()?.to_owned()))
        }
        "selector_expression" => {
            let whole = lhs.utf8_text(text.as_bytes()).ok()?;
            Some(AddressExpr(format!("&{whole}")))
        }
        "parenthesized_expression" => {
            let inner = lhs.named_child(0)?;
            address_of(inner, text)
        }
        // Index expressions never reach here: the oracle rejects them
        // before `address_of` is called.
        _ => None,
    }
}
