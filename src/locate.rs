//! Anchor-driven block location by delimiter balance.
//!
//! A block starts at the first line containing the anchor and ends on the
//! line where the running count of opening minus closing delimiters returns
//! to zero. Delimiters are counted as raw characters; string literals and
//! comments are not understood.
//!
//! Edge cases are resolved as follows:
//! - Head lines without any delimiter (a signature split over several lines)
//!   belong to the block; it cannot end before it has opened.
//! - An anchor line that opens and closes its own block (`fn g() {}`) is a
//!   single-line block, `[start, start + 1)`.
//! - A balance that drops below zero at the end of a line, or never returns
//!   to zero, is reported as [`LocateError::UnbalancedBlock`].

use serde::Serialize;
use std::fmt;
use std::ops::Range;
use thiserror::Error;
use tracing::debug;

/// Half-open range of line indices `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span covering every line of a sequence of `len` lines.
    pub fn full(len: usize) -> Self {
        Self { start: 0, end: len }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl fmt::Display for Span {
    /// Renders 1-based inclusive line numbers, e.g. `lines 3-7`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.len() {
            0 => write!(f, "empty span before line {}", self.start + 1),
            1 => write!(f, "line {}", self.start + 1),
            _ => write!(f, "lines {}-{}", self.start + 1, self.end),
        }
    }
}

/// The character pair whose balance delimits a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    pub open: char,
    pub close: char,
}

impl Delimiters {
    pub const BRACES: Delimiters = Delimiters {
        open: '{',
        close: '}',
    };
    pub const PARENS: Delimiters = Delimiters {
        open: '(',
        close: ')',
    };
    pub const BRACKETS: Delimiters = Delimiters {
        open: '[',
        close: ']',
    };

    pub fn new(open: char, close: char) -> Result<Self, LocateError> {
        if open == close {
            return Err(LocateError::IdenticalDelimiters { delimiter: open });
        }
        Ok(Self { open, close })
    }

    /// Count opening and closing delimiters in `line`.
    pub fn count(&self, line: &str) -> (usize, usize) {
        line.chars().fold((0, 0), |(opens, closes), c| {
            if c == self.open {
                (opens + 1, closes)
            } else if c == self.close {
                (opens, closes + 1)
            } else {
                (opens, closes)
            }
        })
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::BRACES
    }
}

/// Why a block's delimiters failed to balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Imbalance {
    /// End of input reached with `depth` blocks still open.
    NeverClosed { depth: usize },
    /// No opening delimiter found between the anchor and end of input.
    NeverOpened,
    /// More closing than opening delimiters by the end of `line`.
    ClosedBeforeOpened { line: usize },
}

impl fmt::Display for Imbalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Imbalance::NeverClosed { depth } => {
                write!(f, "reached end of input with {depth} unclosed delimiter(s)")
            }
            Imbalance::NeverOpened => write!(f, "no opening delimiter before end of input"),
            Imbalance::ClosedBeforeOpened { line } => {
                write!(f, "closing delimiter without a matching opener on line {}", line + 1)
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocateError {
    #[error("anchor must not be empty")]
    EmptyAnchor,

    #[error("anchor {anchor:?} not found at or after line {}", .from_index + 1)]
    AnchorNotFound { anchor: String, from_index: usize },

    #[error("unbalanced block for anchor {anchor:?} starting on line {}: {imbalance}", .start + 1)]
    UnbalancedBlock {
        anchor: String,
        start: usize,
        imbalance: Imbalance,
    },

    #[error("opening and closing delimiters must differ, got {delimiter:?} for both")]
    IdenticalDelimiters { delimiter: char },
}

/// Finds delimiter-balanced blocks by anchor.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockLocator {
    delimiters: Delimiters,
}

impl BlockLocator {
    pub fn new(delimiters: Delimiters) -> Self {
        Self { delimiters }
    }

    pub fn delimiters(&self) -> Delimiters {
        self.delimiters
    }

    /// Index of the first line at or after `from_index` containing `anchor`.
    pub fn find_anchor<S: AsRef<str>>(
        &self,
        lines: &[S],
        anchor: &str,
        from_index: usize,
    ) -> Option<usize> {
        lines
            .iter()
            .enumerate()
            .skip(from_index)
            .find(|(_, line)| line.as_ref().contains(anchor))
            .map(|(idx, _)| idx)
    }

    /// Locate the block introduced by the first `anchor` at or after
    /// `from_index`.
    pub fn locate<S: AsRef<str>>(
        &self,
        lines: &[S],
        anchor: &str,
        from_index: usize,
    ) -> Result<Span, LocateError> {
        if anchor.is_empty() {
            return Err(LocateError::EmptyAnchor);
        }

        let Some(start) = self.find_anchor(lines, anchor, from_index) else {
            debug!(anchor, from_index, "anchor not found");
            return Err(LocateError::AnchorNotFound {
                anchor: anchor.to_string(),
                from_index,
            });
        };

        let end = self
            .block_end(lines, start)
            .map_err(|imbalance| LocateError::UnbalancedBlock {
                anchor: anchor.to_string(),
                start,
                imbalance,
            })?;

        let span = Span::new(start, end);
        debug!(anchor, start, end, "located block");
        Ok(span)
    }

    /// Locate every block introduced by `anchor` at or after `from_index`,
    /// scanning onward from the end of each block found.
    pub fn locate_all<S: AsRef<str>>(
        &self,
        lines: &[S],
        anchor: &str,
        mut from_index: usize,
    ) -> Result<Vec<Span>, LocateError> {
        let mut spans = Vec::new();

        loop {
            match self.locate(lines, anchor, from_index) {
                Ok(span) => {
                    from_index = span.end;
                    spans.push(span);
                }
                Err(LocateError::AnchorNotFound { .. }) => break,
                Err(e) => return Err(e),
            }
        }

        Ok(spans)
    }

    /// Exclusive end index of the block whose first line is `start`.
    pub fn block_end<S: AsRef<str>>(&self, lines: &[S], start: usize) -> Result<usize, Imbalance> {
        let mut balance: usize = 0;
        let mut opened = false;

        for (idx, line) in lines.iter().enumerate().skip(start) {
            let (opens, closes) = self.delimiters.count(line.as_ref());
            opened |= opens > 0;

            balance = (balance + opens)
                .checked_sub(closes)
                .ok_or(Imbalance::ClosedBeforeOpened { line: idx })?;

            if opened && balance == 0 {
                return Ok(idx + 1);
            }
        }

        if opened {
            Err(Imbalance::NeverClosed { depth: balance })
        } else {
            Err(Imbalance::NeverOpened)
        }
    }
}

/// Locate a brace-delimited block with the default [`BlockLocator`].
pub fn locate<S: AsRef<str>>(
    lines: &[S],
    anchor: &str,
    from_index: usize,
) -> Result<Span, LocateError> {
    BlockLocator::default().locate(lines, anchor, from_index)
}
