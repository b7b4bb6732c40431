//! Forward-only, offset-based text splicer.
//!
//! Rather than rebuilding and re-printing a Go AST (no such printer exists
//! in this crate's dependency stack), mutation is expressed as a sequence
//! of non-overlapping, strictly-increasing-position text replacements
//! applied directly over the original source.

use crate::offset_calculator::OffsetCalculator;
use crate::span::{LineColumn, Span};

#[derive(Debug)]
pub struct Rewriter<'original> {
    original: &'original str,
    rewritten: String,
    cursor: LineColumn,
    offset: usize,
    offset_calculator: OffsetCalculator<'original>,
}

impl<'original> Rewriter<'original> {
    #[must_use]
    pub fn new(original: &'original str) -> Self {
        Self {
            original,
            rewritten: String::new(),
            cursor: LineColumn { line: 1, column: 0 },
            offset: 0,
            offset_calculator: OffsetCalculator::new(original),
        }
    }

    /// Splices `replacement` in place of the text spanned by `span`. `span`
    /// may be zero-width (an insertion point) or cover real text (a
    /// replacement/removal). Spans must be supplied in non-decreasing
    /// position order; violating this is a crate bug (an internal invariant
    /// violation, surfaced as `EmitError`), not a user-triggerable one.
    pub fn splice(&mut self, span: &Span, replacement: &str) -> Result<(), crate::error::EmitError> {
        if self.cursor > span.start {
            return Err(crate::error::EmitError {
                file: span.file.clone(),
                line: span.start.line,
                col: span.start.column,
                message: format!(
                    "rewriter asked to splice at {} but cursor is already past it at {}",
                    span.start, self.cursor
                ),
            });
        }

        let start = self.offset_calculator.offset_from_line_column(span.start);
        let end = self.offset_calculator.offset_from_line_column(span.end);

        self.rewritten += &self.original[self.offset..start];
        self.rewritten += replacement;
        self.offset = end;
        self.cursor = span.end;

        Ok(())
    }

    /// Consumes the rewriter, returning the fully spliced source text.
    #[must_use]
    pub fn finish(mut self) -> String {
        self.rewritten += &self.original[self.offset..];
        self.rewritten
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn lc(line: usize, column: usize) -> LineColumn {
        LineColumn { line, column }
    }

    #[test]
    fn single_insertion() {
        let src = "package main\n\nfunc main() {\n\tx = 1\n}\n";
        let mut rewriter = Rewriter::new(src);
        let span = Span::point("f.go", lc(4, 1));
        rewriter.splice(&span, "BARRIER\n\t").unwrap();
        let out = rewriter.finish();
        assert_eq!(
            out,
            "package main\n\nfunc main() {\n\tBARRIER\n\tx = 1\n}\n"
        );
    }

    #[test]
    fn rejects_out_of_order_splice() {
        let src = "a\nb\nc\n";
        let mut rewriter = Rewriter::new(src);
        rewriter.splice(&Span::point("f.go", lc(3, 0)), "").unwrap();
        assert!(rewriter.splice(&Span::point("f.go", lc(2, 0)), "X").is_err());
    }
}
