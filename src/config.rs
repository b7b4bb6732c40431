//! Instrumentation configuration.
//!
//! Plain fields rather than a parsed file format: there is only ever a
//! handful of caller-supplied flags in scope, so there is nothing here that
//! calls for a `.toml` + `serde` configuration layer.

#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Run the coalescing analyzer after collection. Default `true`.
    pub coalescing_enabled: bool,
    /// Whether `_test.go` files are instrumented. Off by default: the race
    /// detector's own test harness already has independent synchronization,
    /// and instrumenting it risks false positives the barrier calls did not
    /// cause.
    pub instrument_test_files: bool,
    /// Print a per-file [`crate::stats::InstrumentStats`]/
    /// [`crate::stats::CoalescingStats`] report.
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            coalescing_enabled: true,
            instrument_test_files: false,
            verbose: false,
        }
    }
}
