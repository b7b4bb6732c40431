use std::fmt;

/// A one-based line, zero-based column position in a source file.
///
/// Mirrors `proc_macro2::LineColumn`'s convention.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for LineColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column + 1)
    }
}

/// A half-open `[start, end)` range within one file, used both for
/// reporting positions in errors and as the unit the rewriter splices text
/// around.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Span {
    pub file: String,
    pub start: LineColumn,
    pub end: LineColumn,
}

impl Span {
    #[must_use]
    pub fn point(file: &str, at: LineColumn) -> Self {
        Self {
            file: file.to_owned(),
            start: at,
            end: at,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.start)
    }
}

trait ToLineColumn {
    fn to_line_column(&self) -> LineColumn;
}

// `Point`'s `column` field counts bytes, not chars, in tree-sitter. We keep
// byte columns throughout (never indexing by char position), so no
// byte/char conversion is needed here.
impl ToLineColumn for tree_sitter::Point {
    fn to_line_column(&self) -> LineColumn {
        LineColumn {
            line: self.row + 1,
            column: self.column,
        }
    }
}

pub trait ToSpan {
    fn to_span(&self, file: &str) -> Span;
}

impl ToSpan for tree_sitter::Range {
    fn to_span(&self, file: &str) -> Span {
        Span {
            file: file.to_owned(),
            start: self.start_point.to_line_column(),
            end: self.end_point.to_line_column(),
        }
    }
}

impl ToSpan for tree_sitter::Node<'_> {
    fn to_span(&self, file: &str) -> Span {
        self.range().to_span(file)
    }
}
