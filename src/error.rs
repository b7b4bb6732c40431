//! Error taxonomy.
//!
//! `ParseError` and `EmitError` are fatal-for-the-file and always carry a
//! `file:line:col` position — a missing position indicates a bug. Skipped
//! accesses are not modeled as errors at all — they are tallied in
//! [`crate::stats::InstrumentStats`].
//!
//! The public surface is a matchable `thiserror` enum rather than a boxed
//! `anyhow::Error`, since callers (a `build`/`run`/`test` driver) need to
//! branch on *kind* of failure, not just read a message.

use std::fmt;

#[derive(Debug, Clone)]
pub struct ParseError {
    pub file: String,
    pub line: usize,
    pub col: usize,
    pub message: String,
    pub suggestion: Option<String>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}: {}", self.file, self.line, self.col + 1, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n{suggestion}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct EmitError {
    pub file: String,
    pub line: usize,
    pub col: usize,
    pub message: String,
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}: {}", self.file, self.line, self.col + 1, self.message)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Emit(#[from] EmitError),
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
