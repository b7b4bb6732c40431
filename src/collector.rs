//! Access classifier & instrumentation collector.
//!
//! Performs a depth-first walk and records [`InstrumentationPoint`]s. This
//! is the first of the engine's two passes over the tree: nothing here
//! mutates it. `host` fields are plain borrows of the statement nodes the
//! [`crate::coalesce`] and [`crate::instrument`] stages later key off of by
//! tree-sitter node identity.

use crate::access::{address_of, AccessKind, AddressExpr};
use crate::bindings::Bindings;
use crate::oracle::{classify, Addressability};
use crate::stats::InstrumentStats;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use tree_sitter::Node;

/// One decision to emit a barrier call for one source access.
#[derive(Clone, Copy, Debug)]
pub struct InstrumentationPoint<'ast> {
    pub host: Node<'ast>,
    pub kind: AccessKind,
}

/// Container node kinds whose direct children form a statement list the
/// rewriter can insert into: ordinary blocks, and switch/select case
/// bodies.
static CONTAINER_KINDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "block",
        "expression_case",
        "default_case",
        "communication_case",
        "type_case",
    ]
    .into_iter()
    .collect()
});

static STATEMENT_KINDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "block",
        "break_statement",
        "const_declaration",
        "continue_statement",
        "defer_statement",
        "empty_statement",
        "expression_statement",
        "fallthrough_statement",
        "for_statement",
        "go_statement",
        "goto_statement",
        "if_statement",
        "inc_statement",
        "dec_statement",
        "labeled_statement",
        "return_statement",
        "select_statement",
        "send_statement",
        "short_var_declaration",
        "switch_statement",
        "expression_switch_statement",
        "type_declaration",
        "type_switch_statement",
        "var_declaration",
        "assignment_statement",
    ]
    .into_iter()
    .collect()
});

/// Node kinds that denote pure type syntax, never a memory access. These
/// are skipped without recursion and without affecting [`InstrumentStats`]:
/// they were never access candidates, unlike the oracle's own skip
/// buckets.
static TYPE_SYNTAX_KINDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "type_identifier",
        "qualified_type",
        "field_identifier",
        "package_identifier",
        "pointer_type",
        "slice_type",
        "array_type",
        "map_type",
        "struct_type",
        "interface_type",
        "function_type",
        "channel_type",
        "generic_type",
        "type_parameter_list",
        "type_arguments",
    ]
    .into_iter()
    .collect()
});

/// One entry per `InstrumentationPoint` plus the address text it was
/// synthesized with, keyed back to the point by index.
pub struct Collected<'ast> {
    pub points: Vec<InstrumentationPoint<'ast>>,
    pub addrs: Vec<AddressExpr>,
    pub stats: InstrumentStats,
}

pub fn collect<'ast>(root: Node<'ast>, text: &str, bindings: &Bindings) -> Collected<'ast> {
    let mut collected = Collected {
        points: Vec::new(),
        addrs: Vec::new(),
        stats: InstrumentStats::default(),
    };
    walk(root, text, bindings, &mut collected);
    collected
}

fn walk<'ast>(node: Node<'ast>, text: &str, bindings: &Bindings, out: &mut Collected<'ast>) {
    if CONTAINER_KINDS.contains(node.kind()) {
        process_container(node, text, bindings, out);
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        walk(child, text, bindings, out);
    }
}

fn process_container<'ast>(container: Node<'ast>, text: &str, bindings: &Bindings, out: &mut Collected<'ast>) {
    let mut cursor = container.walk();
    for stmt in container
        .named_children(&mut cursor)
        .filter(|n| STATEMENT_KINDS.contains(n.kind()))
    {
        process_statement(stmt, text, bindings, out);
    }
}

fn process_statement<'ast>(stmt: Node<'ast>, text: &str, bindings: &Bindings, out: &mut Collected<'ast>) {
    match stmt.kind() {
        "assignment_statement" => {
            if let Some(right) = stmt.child_by_field_name("right") {
                for item in expr_list_items(right) {
                    extract_reads(item, text, bindings, stmt, out);
                }
            }
            if let Some(left) = stmt.child_by_field_name("left") {
                for item in expr_list_items(left) {
                    record(item, text, bindings, stmt, AccessKind::Write, out);
                }
            }
        }
        "short_var_declaration" => {
            // Declare-with-initializer: the binding is introduced, not
            // overwritten, so no `Write` point for the left-hand side.
            if let Some(right) = stmt.child_by_field_name("right") {
                for item in expr_list_items(right) {
                    extract_reads(item, text, bindings, stmt, out);
                }
            }
        }
        "var_declaration" | "const_declaration" => {
            for spec in direct_specs(stmt) {
                if let Some(value) = spec.child_by_field_name("value") {
                    for item in expr_list_items(value) {
                        extract_reads(item, text, bindings, stmt, out);
                    }
                }
            }
        }
        "type_declaration" => {
            // Pure type syntax; nothing to read.
        }
        "inc_statement" | "dec_statement" => {
            if let Some(operand) = stmt.child_by_field_name("operand") {
                // Two independent address clones, to avoid aliasing them.
                record(operand, text, bindings, stmt, AccessKind::Read, out);
                record(operand, text, bindings, stmt, AccessKind::Write, out);
            }
        }
        // `if_statement` needs its own walk rather than the generic fallback
        // below: an `else if` is itself a nested `if_statement`, reached via
        // the `alternative` field rather than as a block's statement-list
        // member, and `extract_reads`'s own recursion intentionally stops at
        // any `STATEMENT_KINDS` node (see its comment) to avoid treating a
        // `for`-clause's init/post as a barrier site. Without this carve-out
        // every condition past the first `if` in a chain would be silently
        // dropped.
        "if_statement" => process_if_chain(stmt, text, bindings, stmt, out),
        // `for_statement` needs its own carve-out for exactly one of its
        // possible clause children: a `range_clause`'s `left` identifiers
        // (`k, v` in `for k, v := range xs` or `for k, v = range xs`) are
        // loop-bound once per iteration, not read -- the same reasoning
        // `short_var_declaration` gets above, but neither a `:=`- nor a
        // `=`-range clause is itself an `assignment_statement` or
        // `short_var_declaration` node, so the suppression has to be
        // repeated here. spec.md never mentions `range` at all; this
        // crate resolves that silence by instrumenting only the ranged-over
        // `right` expression and leaving the loop variables uninstrumented
        // in both forms -- see DESIGN.md. A plain `for_clause` or bare
        // condition falls through to the same per-child walk the generic
        // arm below does.
        "for_statement" => {
            let mut cursor = stmt.walk();
            for child in stmt.named_children(&mut cursor) {
                if child.kind() == "range_clause" {
                    if let Some(right) = child.child_by_field_name("right") {
                        extract_reads(right, text, bindings, stmt, out);
                    }
                } else {
                    extract_reads(child, text, bindings, stmt, out);
                }
            }
        }
        // Every other compound or simple statement: extract reads from each
        // direct child rather than from `stmt` itself, since `stmt`'s own
        // kind is a `STATEMENT_KINDS` member and `extract_reads` would
        // otherwise bail out immediately on its own top-level guard. Nested
        // block-like children (a `for`'s body, a `switch`'s cases, ...) are
        // `CONTAINER_KINDS` and so still resolve to a no-op here, left for
        // `walk`'s separate descent to process.
        _ => {
            let mut cursor = stmt.walk();
            for child in stmt.named_children(&mut cursor) {
                extract_reads(child, text, bindings, stmt, out);
            }
        }
    }
}

/// Extracts reads from an `if`/`else if`/`else` chain's conditions, per the
/// comment on `process_statement`'s `"if_statement"` arm.
fn process_if_chain<'ast>(
    if_stmt: Node<'ast>,
    text: &str,
    bindings: &Bindings,
    host: Node<'ast>,
    out: &mut Collected<'ast>,
) {
    if let Some(cond) = if_stmt.child_by_field_name("condition") {
        extract_reads(cond, text, bindings, host, out);
    }
    if let Some(alt) = if_stmt.child_by_field_name("alternative") {
        if alt.kind() == "if_statement" {
            process_if_chain(alt, text, bindings, host, out);
        }
        // A plain `else { ... }` block is a `CONTAINER_KINDS` member,
        // discovered and processed by `walk`'s own descent.
    }
}

/// Exposed so [`crate::coalesce`] can recompute a host statement's position
/// within its parent block using the same statement-list definition the
/// collector used to build it.
pub(crate) fn is_statement_kind(kind: &str) -> bool {
    STATEMENT_KINDS.contains(kind)
}

fn direct_specs<'ast>(decl: Node<'ast>) -> Vec<Node<'ast>> {
    let mut cursor = decl.walk();
    decl.named_children(&mut cursor)
        .filter(|n| n.kind() == "var_spec" || n.kind() == "const_spec")
        .collect()
}

fn expr_list_items<'ast>(node: Node<'ast>) -> Vec<Node<'ast>> {
    if node.kind() == "expression_list" {
        let mut cursor = node.walk();
        node.named_children(&mut cursor).collect()
    } else {
        vec![node]
    }
}

/// Recursively records `Read` points for every addressable identifier,
/// field selection, or dereference reachable from `expr`.
fn extract_reads<'ast>(
    expr: Node<'ast>,
    text: &str,
    bindings: &Bindings,
    host: Node<'ast>,
    out: &mut Collected<'ast>,
) {
    if TYPE_SYNTAX_KINDS.contains(expr.kind()) {
        return;
    }
    // Block-like containers nested inside a compound statement (an `if`'s
    // consequence, a `for`'s body, ...) are discovered and processed in
    // their own right by `walk`'s generic descent; recursing into them here
    // too would both double-count their accesses and misclassify writes
    // inside them as reads.
    if CONTAINER_KINDS.contains(expr.kind()) {
        return;
    }
    // A nested full statement can only appear here as a `for`-clause's
    // init/post or a `labeled_statement`'s body -- never a valid barrier
    // insertion point (no statement-list slot to prepend into), so treat
    // it the same conservative way as a container: found and instrumented
    // separately if it itself encloses a block, otherwise skipped.
    if STATEMENT_KINDS.contains(expr.kind()) {
        return;
    }

    match expr.kind() {
        "identifier" | "selector_expression" => {
            // Field selections are recorded whole, without descending into
            // the receiver or selector children, to avoid
            // double-instrumenting `pkg.Fn`-like constructs.
            record(expr, text, bindings, host, AccessKind::Read, out);
        }
        "unary_expression" => {
            if is_dereference(expr, text) {
                record(expr, text, bindings, host, AccessKind::Read, out);
            } else if let Some(operand) = expr.child_by_field_name("operand") {
                extract_reads(operand, text, bindings, host, out);
            }
        }
        "index_expression" => {
            // The index expression itself never yields a barrier (the
            // oracle rejects it outright), but its operand and index may
            // still contain ordinary reads.
            if let Some(operand) = expr.child_by_field_name("operand") {
                extract_reads(operand, text, bindings, host, out);
            }
            if let Some(index) = expr.child_by_field_name("index") {
                extract_reads(index, text, bindings, host, out);
            }
        }
        _ => {
            let mut cursor = expr.walk();
            for child in expr.named_children(&mut cursor) {
                extract_reads(child, text, bindings, host, out);
            }
        }
    }
}

fn is_dereference(unary: Node<'_>, text: &str) -> bool {
    unary
        .child_by_field_name("operator")
        .and_then(|op| op.utf8_text(text.as_bytes()).ok())
        .is_some_and(|op| op == "*")
}

fn record<'ast>(
    expr: Node<'ast>,
    text: &str,
    bindings: &Bindings,
    host: Node<'ast>,
    kind: AccessKind,
    out: &mut Collected<'ast>,
) {
    match classify(expr, text, bindings) {
        Addressability::Ok => {
            let Some(addr) = address_of(expr, text) else {
                // Unrecognized LHS form: silently skipped, no counter
                // applies.
                return;
            };
            out.points.push(InstrumentationPoint { host, kind });
            out.addrs.push(addr);
            match kind {
                AccessKind::Read => out.stats.reads += 1,
                AccessKind::Write => out.stats.writes += 1,
            }
        }
        Addressability::Constant => out.stats.constants_skipped += 1,
        Addressability::Builtin => out.stats.builtins_skipped += 1,
        Addressability::Literal => out.stats.literals_skipped += 1,
        Addressability::Blank => out.stats.blanks_skipped += 1,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::parse;

    fn collect_src(src: &str) -> Collected<'static> {
        let file = Box::leak(Box::new(parse("f.go", Box::leak(src.to_owned().into_boxed_str())).unwrap()));
        let bindings = Bindings::collect(file);
        collect(file.tree.root_node(), file.text, &bindings)
    }

    #[test]
    fn single_write() {
        let collected = collect_src("package main\nfunc main() {\n\tvar x int\n\tx = 42\n}\n");
        assert_eq!(collected.stats.writes, 1);
        assert_eq!(collected.stats.reads, 0);
        assert_eq!(collected.addrs[0].0, "&x");
    }

    #[test]
    fn increment_decrement() {
        let collected = collect_src("package main\nfunc main() {\n\tcounter++\n\tcounter--\n}\n");
        assert_eq!(collected.stats.reads, 2);
        assert_eq!(collected.stats.writes, 2);
    }

    #[test]
    fn builtins_skipped() {
        let collected = collect_src(
            "package main\nimport \"os\"\nfunc main() {\n\tm := make([]int, 10)\n\t_ = len(m)\n\tos.Exit(0)\n}\n",
        );
        assert!(collected.stats.builtins_skipped >= 2);
    }

    #[test]
    fn method_call_receiver_is_not_addressed() {
        // `t.Lock` is a method value and is never addressable; the collector
        // must not synthesize `&t.Lock`.
        let collected = collect_src(
            "package main\ntype T struct{}\nfunc (t T) Lock() {}\nfunc f(t T) {\n\tt.Lock()\n}\n",
        );
        assert!(collected.addrs.iter().all(|a| a.0 != "&t.Lock"));
    }

    #[test]
    fn expression_statement_call_arguments_are_read() {
        let collected = collect_src(
            "package main\nimport \"fmt\"\nfunc f(x int) {\n\tfmt.Println(x)\n}\n",
        );
        assert_eq!(collected.stats.reads, 1);
        assert_eq!(collected.addrs[0].0, "&x");
    }

    #[test]
    fn if_condition_is_read() {
        let collected = collect_src(
            "package main\nfunc f(cond bool) {\n\tif cond {\n\t}\n}\n",
        );
        assert_eq!(collected.stats.reads, 1);
    }

    #[test]
    fn else_if_chain_conditions_are_all_read() {
        let collected = collect_src(
            "package main\nfunc f(a, b, c bool) {\n\tif a {\n\t} else if b {\n\t} else if c {\n\t}\n}\n",
        );
        assert_eq!(collected.stats.reads, 3);
    }

    #[test]
    fn for_clause_condition_is_read() {
        let collected = collect_src(
            "package main\nfunc f(n int) {\n\tfor i := 0; i < n; i++ {\n\t}\n}\n",
        );
        // `i < n` contributes a read of `n` (and `i`); `i++`/`i--`-style
        // loop updates are exercised separately by `increment_decrement`.
        assert!(collected.stats.reads >= 1);
    }

    #[test]
    fn range_declared_vars_are_not_instrumented_but_ranged_expr_is_read() {
        let collected = collect_src(
            "package main\nfunc f(xs []int) {\n\tfor k, v := range xs {\n\t}\n}\n",
        );
        // `xs` itself is read once, by the range clause.
        assert_eq!(collected.stats.reads, 1);
        assert_eq!(collected.addrs[0].0, "&xs");
        // Neither `k` nor `v` -- freshly loop-bound, not read -- shows up.
        assert!(collected.addrs.iter().all(|a| a.0 != "&k" && a.0 != "&v"));
    }

    #[test]
    fn range_clause_with_existing_vars_does_not_instrument_left_side() {
        let collected = collect_src(
            "package main\nfunc f(xs []int) {\n\tvar k, v int\n\tfor k, v = range xs {\n\t}\n}\n",
        );
        assert!(collected.addrs.iter().all(|a| a.0 != "&k" && a.0 != "&v"));
    }
}
