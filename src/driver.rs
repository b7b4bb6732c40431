//! Per-file and per-directory orchestration.
//!
//! External code may allocate one collector, one analyzer, and one rewriter
//! per file to parallelize across files; `instrument_dir` itself is a plain
//! sequential `walkdir::WalkDir` loop and does not spawn any threads of its
//! own, leaving parallelism to the caller.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::instrument::{instrument, Instrumented};
use log::debug;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Instruments `text` (attributed to `path` for error messages) in memory,
/// without touching the filesystem. The crate's primary entry point.
pub fn instrument_str(path: &str, text: &str, config: &Config) -> Result<Instrumented> {
    instrument(path, text, config)
}

/// Reads `path` from disk and instruments its contents.
pub fn instrument_file(path: &Path, config: &Config) -> Result<Instrumented> {
    let text = read_to_string(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })?;
    instrument(&path.to_string_lossy(), &text, config)
}

/// One directory's worth of instrumentation results, keyed by the path each
/// was read from, plus totals rolled up across every file.
#[derive(Debug, Default)]
pub struct DirSummary {
    pub files: Vec<(PathBuf, Instrumented)>,
    pub total: crate::stats::InstrumentStats,
    pub total_coalescing: crate::stats::CoalescingStats,
}

/// Walks `root` for `*.go` files and instruments each one, with
/// `config.instrument_test_files` deciding whether `_test.go` files are
/// included (default: excluded). A single file failing to parse or emit is
/// fatal for the whole walk -- no partial corruption of output is possible,
/// but only that file's error is returned; files already processed are
/// discarded along with it, since a caller that wants best-effort partial
/// output should drive `instrument_file` itself.
pub fn instrument_dir(root: &Path, config: &Config) -> Result<DirSummary> {
    let mut summary = DirSummary::default();

    for entry in WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| is_dir_or_go_source(entry.path(), config))
    {
        let entry = entry.map_err(|err| Error::Io {
            path: root.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, err),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        debug!("instrumenting {}", path.display());
        let instrumented = instrument_file(path, config)?;
        summary.total.reads += instrumented.stats.reads;
        summary.total.writes += instrumented.stats.writes;
        summary.total.constants_skipped += instrumented.stats.constants_skipped;
        summary.total.builtins_skipped += instrumented.stats.builtins_skipped;
        summary.total.literals_skipped += instrumented.stats.literals_skipped;
        summary.total.blanks_skipped += instrumented.stats.blanks_skipped;
        summary.total_coalescing.total_operations += instrumented.coalescing.total_operations;
        summary.total_coalescing.coalesced_operations += instrumented.coalescing.coalesced_operations;
        summary.total_coalescing.groups_created += instrumented.coalescing.groups_created;
        summary.total_coalescing.barriers_removed += instrumented.coalescing.barriers_removed;
        summary.files.push((path.to_path_buf(), instrumented));
    }

    Ok(summary)
}

fn is_dir_or_go_source(path: &Path, config: &Config) -> bool {
    if path.is_dir() {
        return true;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if !name.ends_with(".go") {
        return false;
    }
    if name.ends_with("_test.go") {
        return config.instrument_test_files;
    }
    true
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs::{create_dir_all, write};
    use tempfile::tempdir;

    #[test]
    fn instruments_a_directory_and_skips_tests_by_default() {
        let dir = tempdir().unwrap();
        create_dir_all(dir.path().join("pkg")).unwrap();
        write(
            dir.path().join("pkg").join("a.go"),
            "package pkg\n\nfunc F() {\n\tvar x int\n\tx = 1\n}\n",
        )
        .unwrap();
        write(
            dir.path().join("pkg").join("a_test.go"),
            "package pkg\n\nfunc TestF(t *testing.T) {\n\tvar x int\n\tx = 1\n}\n",
        )
        .unwrap();

        let summary = instrument_dir(dir.path(), &Config::default()).unwrap();
        assert_eq!(summary.files.len(), 1);
        assert!(summary.files[0].0.ends_with("a.go"));
        assert_eq!(summary.total.writes, 1);
    }

    #[test]
    fn instrument_test_files_flag_includes_them() {
        let dir = tempdir().unwrap();
        write(
            dir.path().join("a_test.go"),
            "package pkg\n\nfunc TestF(t *testing.T) {\n\tvar x int\n\tx = 1\n}\n",
        )
        .unwrap();

        let config = Config {
            instrument_test_files: true,
            ..Config::default()
        };
        let summary = instrument_dir(dir.path(), &config).unwrap();
        assert_eq!(summary.files.len(), 1);
    }
}
