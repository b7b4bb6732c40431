//! Per-file driver tying the pipeline together: Parser → Import injector →
//! Collector → Coalescer → Rewriter → Emitter → text.

use crate::access::{AccessKind, AddressExpr};
use crate::bindings::Bindings;
use crate::coalesce::coalesce;
use crate::collector::collect;
use crate::config::Config;
use crate::error::{EmitError, Error};
use crate::imports;
use crate::parser::parse;
use crate::rewriter::Rewriter;
use crate::span::{Span, ToSpan};
use crate::stats::{CoalescingStats, InstrumentStats};
use std::collections::HashMap;
use tree_sitter::Node;

/// The result of instrumenting one file.
#[derive(Clone, Debug)]
pub struct Instrumented {
    pub source: String,
    pub stats: InstrumentStats,
    pub coalescing: CoalescingStats,
}

pub fn instrument(path: &str, text: &str, config: &Config) -> Result<Instrumented, Error> {
    let file = parse(path, text)?;
    let bindings = Bindings::collect(&file);
    let collected = collect(file.tree.root_node(), text, &bindings);

    let (suppressed, coalescing_stats) = if config.coalescing_enabled {
        let result = coalesce(&collected.points, &collected.addrs);
        (result.suppressed, result.stats)
    } else {
        (
            vec![false; collected.points.len()],
            CoalescingStats {
                total_operations: collected.points.len(),
                ..CoalescingStats::default()
            },
        )
    };

    let resolved = imports::resolve(text).ok_or_else(|| {
        Error::Emit(EmitError {
            file: path.to_owned(),
            line: 1,
            col: 0,
            message: "failed to find a `package` line to anchor import injection".to_owned(),
        })
    })?;

    let mut by_host: HashMap<usize, (Node<'_>, Vec<(AccessKind, AddressExpr)>)> = HashMap::new();
    for (i, point) in collected.points.iter().enumerate() {
        if suppressed[i] {
            continue;
        }
        by_host
            .entry(point.host.id())
            .or_insert_with(|| (point.host, Vec::new()))
            .1
            .push((point.kind, collected.addrs[i].clone()));
    }
    let mut insertions: Vec<(Node<'_>, Vec<(AccessKind, AddressExpr)>)> = by_host.into_values().collect();
    insertions.sort_by_key(|(host, _)| host.start_byte());

    let mut rewriter = Rewriter::new(text);

    if let Some(import_text) = resolved.text_to_prepend {
        let insert_line = resolved.insert_after_line.unwrap() + 1;
        let at = Span::point(path, crate::span::LineColumn { line: insert_line, column: 0 });
        rewriter.splice(&at, &import_text)?;
    }

    for (host, accesses) in insertions {
        let indent = indent_before(text, host);
        let mut prefix = String::new();
        for (kind, addr) in accesses {
            prefix.push_str(&barrier_call(&resolved.barrier_alias, kind, &addr, &indent));
        }
        let span = Span::point(path, host.to_span(path).start);
        rewriter.splice(&span, &prefix)?;
    }

    let mut source = rewriter.finish();
    source.push_str(&format!(
        "\nfunc init() {{\n\t{}.Init()\n}}\n",
        resolved.barrier_alias
    ));

    Ok(Instrumented {
        source,
        stats: collected.stats,
        coalescing: coalescing_stats,
    })
}

/// The whitespace `host` is indented with on its own source line, so an
/// inserted barrier's continuation line lands at the same nesting depth as
/// `host` itself instead of a fixed single tab. Falls back to the empty
/// string if the text immediately preceding `host` on its line is not pure
/// whitespace (host sharing a line with other code), in which case the
/// barrier's continuation simply abuts whatever is there.
fn indent_before(text: &str, host: Node<'_>) -> String {
    let start = host.start_byte();
    let line_start = text[..start].rfind('\n').map_or(0, |i| i + 1);
    let candidate = &text[line_start..start];
    if candidate.bytes().all(|b| b == b' ' || b == b'\t') {
        candidate.to_owned()
    } else {
        String::new()
    }
}

fn barrier_call(alias: &str, kind: AccessKind, addr: &AddressExpr, indent: &str) -> String {
    format!(
        "{alias}.{}(uintptr(unsafe.Pointer({addr})))\n{indent}",
        kind.barrier_fn()
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn instruments_a_simple_write() {
        let src = "package main\n\nfunc main() {\n\tvar x int\n\tx = 1\n}\n";
        let instrumented = instrument("f.go", src, &Config::default()).unwrap();
        assert_eq!(instrumented.stats.writes, 1);
        assert!(instrumented.source.contains("r.RaceWrite(uintptr(unsafe.Pointer(&x)))"));
        assert!(instrumented.source.contains("import ("));
        assert!(instrumented.source.contains("\"racebarrier\""));
        assert!(instrumented.source.contains("func init() {\n\tr.Init()\n}"));
    }

    #[test]
    fn coalesces_adjacent_writes() {
        let src = "package main\ntype T struct{ A int }\nfunc f(t *T) {\n\tt.A = 1\n\tt.A = 2\n}\n";
        let instrumented = instrument("f.go", src, &Config::default()).unwrap();
        assert_eq!(instrumented.coalescing.groups_created, 1);
        let occurrences = instrumented.source.matches("RaceWrite").count();
        assert_eq!(occurrences, 1);
    }

    #[test]
    fn honors_existing_alias() {
        let src = "package main\n\nimport rt \"racebarrier\"\nimport \"unsafe\"\n\nfunc main() {\n\tvar x int\n\tx = 1\n}\n";
        let instrumented = instrument("f.go", src, &Config::default()).unwrap();
        assert!(instrumented.source.contains("rt.RaceWrite"));
        assert!(!instrumented.source.contains("\nimport (\n"));
    }

    #[test]
    fn nested_host_keeps_its_own_indentation() {
        // `x = 2` sits two levels deep (func body, if-body); the barrier's
        // continuation line must land at that same two-tab depth rather
        // than a fixed one-tab indent.
        let src = "package main\n\nimport rt \"racebarrier\"\nimport \"unsafe\"\n\nfunc f(cond bool) {\n\tvar x int\n\tif cond {\n\t\tx = 2\n\t}\n}\n";
        let instrumented = instrument("f.go", src, &Config::default()).unwrap();
        assert!(instrumented.source.contains(
            "\tif cond {\n\t\trt.RaceWrite(uintptr(unsafe.Pointer(&x)))\n\t\tx = 2\n\t}\n"
        ));
    }
}
