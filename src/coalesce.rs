//! Coalescing analyzer — a conservative static reduction of adjacent
//! equivalent barriers derived from the BigFoot algorithm (PLDI 2017).
//!
//! Runs as a single forward pass over the point list the collector produced.
//! `addr` equality here is plain string equality on [`AddressExpr`]; as
//! documented on that type, the way addresses are synthesized makes string
//! equality equivalent to structural equality over the address-forming node
//! classes.

use crate::access::{AccessKind, AddressExpr};
use crate::collector::{is_statement_kind, InstrumentationPoint};
use crate::stats::CoalescingStats;

/// A run of `len >= 2` instrumentation points the rewriter will collapse
/// into a single barrier call before the last member's host statement.
#[derive(Clone, Debug)]
pub struct CoalescingGroup {
    pub kind: AccessKind,
    pub addr: AddressExpr,
    /// Indices into the point/addr slices passed to [`coalesce`], in
    /// ascending statement order.
    pub members: Vec<usize>,
}

pub struct CoalesceResult {
    pub groups: Vec<CoalescingGroup>,
    pub stats: CoalescingStats,
    /// `suppressed[i]` is true iff point `i`'s own barrier must not be
    /// emitted because a later member of its group carries it instead.
    pub suppressed: Vec<bool>,
}

struct Candidate {
    kind: AccessKind,
    addr_idx: usize,
    block_id: usize,
    stmt_idx: usize,
}

enum State {
    Idle,
    InGroup {
        kind: AccessKind,
        addr_idx: usize,
        block_id: usize,
        last_stmt_idx: usize,
        members: Vec<usize>,
    },
}

pub fn coalesce(points: &[InstrumentationPoint<'_>], addrs: &[AddressExpr]) -> CoalesceResult {
    let mut groups = Vec::new();
    let mut stats = CoalescingStats {
        total_operations: points.len(),
        ..CoalescingStats::default()
    };
    let mut suppressed = vec![false; points.len()];
    let mut state = State::Idle;

    for (i, point) in points.iter().enumerate() {
        let Some((block_id, stmt_idx)) = statement_position(point) else {
            // No parent block (shouldn't happen for a statement-anchored
            // point, but the analyzer must never panic): finalize and skip.
            finalize(&mut state, addrs, &mut groups, &mut stats, &mut suppressed);
            continue;
        };
        let candidate = Candidate {
            kind: point.kind,
            addr_idx: i,
            block_id,
            stmt_idx,
        };

        state = match state {
            State::Idle => start_group(candidate),
            State::InGroup {
                kind,
                addr_idx,
                block_id: group_block,
                last_stmt_idx,
                mut members,
            } => {
                let extends = candidate.kind == kind
                    && addrs[candidate.addr_idx] == addrs[addr_idx]
                    && candidate.block_id == group_block
                    && candidate.stmt_idx == last_stmt_idx + 1;
                if extends {
                    members.push(i);
                    State::InGroup {
                        kind,
                        addr_idx,
                        block_id: group_block,
                        last_stmt_idx: candidate.stmt_idx,
                        members,
                    }
                } else {
                    finalize_members(kind, addr_idx, members, addrs, &mut groups, &mut stats, &mut suppressed);
                    start_group(candidate)
                }
            }
        };
    }
    finalize(&mut state, addrs, &mut groups, &mut stats, &mut suppressed);

    CoalesceResult {
        groups,
        stats,
        suppressed,
    }
}

fn start_group(candidate: Candidate) -> State {
    State::InGroup {
        kind: candidate.kind,
        addr_idx: candidate.addr_idx,
        block_id: candidate.block_id,
        last_stmt_idx: candidate.stmt_idx,
        members: vec![candidate.addr_idx],
    }
}

fn finalize(
    state: &mut State,
    addrs: &[AddressExpr],
    groups: &mut Vec<CoalescingGroup>,
    stats: &mut CoalescingStats,
    suppressed: &mut [bool],
) {
    if let State::InGroup {
        kind,
        addr_idx,
        members,
        ..
    } = std::mem::replace(state, State::Idle)
    {
        finalize_members(kind, addr_idx, members, addrs, groups, stats, suppressed);
    }
}

fn finalize_members(
    kind: AccessKind,
    addr_idx: usize,
    members: Vec<usize>,
    addrs: &[AddressExpr],
    groups: &mut Vec<CoalescingGroup>,
    stats: &mut CoalescingStats,
    suppressed: &mut [bool],
) {
    if members.len() < 2 {
        return;
    }
    for &member in &members[..members.len() - 1] {
        suppressed[member] = true;
    }
    stats.coalesced_operations += members.len();
    stats.groups_created += 1;
    stats.barriers_removed += members.len() - 1;
    let addr = addrs[addr_idx].clone();
    groups.push(CoalescingGroup { kind, addr, members });
}

fn statement_position(point: &InstrumentationPoint<'_>) -> Option<(usize, usize)> {
    let parent = point.host.parent()?;
    let mut cursor = parent.walk();
    let idx = parent
        .named_children(&mut cursor)
        .filter(|n| is_statement_kind(n.kind()))
        .position(|n| n.id() == point.host.id())?;
    Some((parent.id(), idx))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bindings::Bindings;
    use crate::collector::collect;
    use crate::parser::parse;

    #[test]
    fn adjacent_writes_to_same_field_coalesce() {
        let src = "package main\ntype T struct{ A, B int }\nfunc f(t *T) {\n\tt.A = 1\n\tt.A = 2\n\tt.A = 3\n}\n";
        let file = parse("f.go", src).unwrap();
        let bindings = Bindings::collect(&file);
        let collected = collect(file.tree.root_node(), file.text, &bindings);
        let result = coalesce(&collected.points, &collected.addrs);
        assert_eq!(result.stats.groups_created, 1);
        assert_eq!(result.stats.barriers_removed, 2);
        assert_eq!(result.suppressed.iter().filter(|&&s| s).count(), 2);
    }

    #[test]
    fn intervening_statement_breaks_group() {
        let src = "package main\nfunc f() {\n\tvar x, y int\n\tx = 1\n\ty = 2\n\tx = 3\n}\n";
        let file = parse("f.go", src).unwrap();
        let bindings = Bindings::collect(&file);
        let collected = collect(file.tree.root_node(), file.text, &bindings);
        let result = coalesce(&collected.points, &collected.addrs);
        assert_eq!(result.stats.groups_created, 0);
        assert!(result.suppressed.iter().all(|&s| !s));
    }
}
