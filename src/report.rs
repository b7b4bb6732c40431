//! Human-readable rendering of [`crate::stats::InstrumentStats`] and
//! [`crate::stats::CoalescingStats`] for verbose mode, colored with
//! `ansi_term` + `atty` (bold green for a label, plain text otherwise).

use crate::stats::{CoalescingStats, InstrumentStats};
use ansi_term::{Color::Green, Style};

/// Renders one file's stats as a multi-line report, e.g. for `--verbose`.
#[must_use]
pub fn render_report(path: &str, stats: &InstrumentStats, coalescing: &CoalescingStats) -> String {
    let label = if atty::is(atty::Stream::Stdout) {
        Green.bold()
    } else {
        Style::default()
    };

    let mut out = String::new();
    out.push_str(&format!("{}: {path}\n", label.paint("Instrumented")));
    out.push_str(&format!(
        "  reads={} writes={} barriers={}\n",
        stats.reads,
        stats.writes,
        stats.barriers_emitted()
    ));
    out.push_str(&format!(
        "  skipped: constants={} builtins={} literals={} blanks={} (total {})\n",
        stats.constants_skipped,
        stats.builtins_skipped,
        stats.literals_skipped,
        stats.blanks_skipped,
        stats.skipped()
    ));
    if coalescing.groups_created > 0 {
        out.push_str(&format!(
            "  coalescing: {} groups, {} barriers removed ({:.1}% reduction)\n",
            coalescing.groups_created,
            coalescing.barriers_removed,
            coalescing.reduction_fraction() * 100.0
        ));
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn renders_counts() {
        let stats = InstrumentStats {
            reads: 2,
            writes: 1,
            constants_skipped: 1,
            ..InstrumentStats::default()
        };
        let coalescing = CoalescingStats {
            total_operations: 3,
            coalesced_operations: 2,
            groups_created: 1,
            barriers_removed: 1,
        };
        let report = render_report("f.go", &stats, &coalescing);
        assert!(report.contains("reads=2 writes=1 barriers=3"));
        assert!(report.contains("constants=1"));
        assert!(report.contains("1 groups, 1 barriers removed"));
    }
}
