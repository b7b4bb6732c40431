//! Converts `LineColumn` positions to byte offsets into the original source.
//!
//! Walks the source line-by-line exactly once; tree-sitter's `Point::column`
//! already counts bytes, so there is no byte/char reconciliation to do here.
//! Positions are required to be requested in non-decreasing order, which is
//! all the rewriter ever needs.

use crate::span::LineColumn;

#[derive(Debug)]
pub struct OffsetCalculator<'original> {
    lines: std::str::Split<'original, char>,
    current_line: Option<&'original str>,
    line_column: LineColumn,
    line_start_offset: usize,
}

impl<'original> OffsetCalculator<'original> {
    #[must_use]
    pub fn new(original: &'original str) -> Self {
        let mut lines = original.split('\n');
        let current_line = lines.next();
        Self {
            lines,
            current_line,
            line_column: LineColumn { line: 1, column: 0 },
            line_start_offset: 0,
        }
    }

    /// Returns the byte offset of `line_column` in the original source.
    pub fn offset_from_line_column(&mut self, line_column: LineColumn) -> usize {
        assert!(
            self.line_column.line <= line_column.line,
            "offsets must be requested in non-decreasing order: have {:?}, asked for {:?}",
            self.line_column,
            line_column
        );

        while self.line_column.line < line_column.line {
            let line = self
                .current_line
                .expect("line_column refers to a line past the end of the file");
            self.line_start_offset += line.len() + 1;
            self.current_line = self.lines.next();
            self.line_column = LineColumn {
                line: self.line_column.line + 1,
                column: 0,
            };
        }

        self.line_start_offset + line_column.column
    }
}
