use crate::lines::LineSequence;
use crate::locate::{BlockLocator, Delimiters, LocateError, Span};
use crate::rewrite::{persist, rewrite, RewriteError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use xxhash_rust::xxh3::xxh3_64;

/// Verification strategy for edit safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (faster for large spans)
    Hash(u64),
}

impl EditVerification {
    /// Check if the provided text matches the verification criteria.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }
}

/// Hex rendering of a block's xxh3 hash, as accepted by [`parse_hash`].
pub fn format_hash(text: &str) -> String {
    format!("{:#018x}", xxh3_64(text.as_bytes()))
}

/// Parse a hex xxh3 hash, with or without a `0x` prefix.
pub fn parse_hash(raw: &str) -> Option<u64> {
    let digits = raw.trim();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);
    u64::from_str_radix(digits, 16).ok()
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("File I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("File is not valid UTF-8: {0}")]
    InvalidUtf8(PathBuf),

    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error("Block verification failed at {file} ({span})")]
    VerificationFailed {
        file: PathBuf,
        span: Span,
        expected: String,
        found: String,
    },
}

impl EditError {
    fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            EditError::FileNotFound(path.to_path_buf())
        } else {
            EditError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// True when the edit found nothing to act on and left the file alone.
    pub fn is_anchor_not_found(&self) -> bool {
        matches!(self, EditError::Locate(LocateError::AnchorNotFound { .. }))
    }
}

/// What splicing a block did to the in-memory lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Block replaced by `inserted` lines
    Replaced { span: Span, inserted: usize },
    /// Block removed
    Removed { span: Span },
    /// Block already equal to the replacement
    Unchanged { span: Span },
}

impl Change {
    pub fn span(&self) -> Span {
        match self {
            Change::Replaced { span, .. } | Change::Removed { span } | Change::Unchanged { span } => {
                *span
            }
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Change::Unchanged { .. })
    }
}

/// Result of applying an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "EditResult should be checked for success/already-applied"]
pub enum EditResult {
    /// Block was replaced
    Replaced {
        file: PathBuf,
        span: Span,
        inserted: usize,
    },
    /// Block was deleted
    Removed { file: PathBuf, span: Span },
    /// Block already matched the replacement; nothing was written
    AlreadyApplied { file: PathBuf, span: Span },
}

impl EditResult {
    fn from_change(file: PathBuf, change: Change) -> Self {
        match change {
            Change::Replaced { span, inserted } => EditResult::Replaced {
                file,
                span,
                inserted,
            },
            Change::Removed { span } => EditResult::Removed { file, span },
            Change::Unchanged { span } => EditResult::AlreadyApplied { file, span },
        }
    }
}

/// A block spliced in memory, not yet written anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub change: Change,
    pub lines: LineSequence,
}

/// Everything an edit would do to a file, without having done it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPreview {
    pub file: PathBuf,
    pub change: Change,
    pub original: String,
    pub modified: String,
}

/// Replace or delete the block introduced by an anchor line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "BlockEdit does nothing until apply() is called"]
pub struct BlockEdit {
    /// File to edit
    pub file: PathBuf,
    /// Substring identifying the block's first line
    pub anchor: String,
    /// First line index searched for the anchor
    pub from_index: usize,
    /// Text substituted for the block; empty deletes it
    pub replacement: String,
    /// Delimiter pair used to find the block's end
    pub delimiters: Delimiters,
    /// Expected current text of the block, checked before rewriting
    pub expected_before: Option<EditVerification>,
}

impl BlockEdit {
    /// Replace the block introduced by `anchor` with `text`.
    pub fn replace(
        file: impl Into<PathBuf>,
        anchor: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            anchor: anchor.into(),
            from_index: 0,
            replacement: text.into(),
            delimiters: Delimiters::default(),
            expected_before: None,
        }
    }

    /// Delete the block introduced by `anchor`.
    pub fn delete(file: impl Into<PathBuf>, anchor: impl Into<String>) -> Self {
        Self::replace(file, anchor, String::new())
    }

    pub fn from_index(mut self, from_index: usize) -> Self {
        self.from_index = from_index;
        self
    }

    pub fn delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    pub fn verify(mut self, verification: EditVerification) -> Self {
        self.expected_before = Some(verification);
        self
    }

    /// Locate, verify and splice against an already loaded file.
    pub fn apply_to(&self, source: &LineSequence) -> Result<Splice, EditError> {
        let locator = BlockLocator::new(self.delimiters);
        let span = locator.locate(source.lines(), &self.anchor, self.from_index)?;

        let replacement = source.conform(&self.replacement, span);
        let current = &source.lines()[span.range()];

        // Check idempotency before verification: a re-run finds the new block
        if !replacement.is_empty() && replacement.as_slice() == current {
            debug!(anchor = %self.anchor, %span, "block already matches replacement");
            return Ok(Splice {
                change: Change::Unchanged { span },
                lines: source.clone(),
            });
        }

        if let Some(expected) = &self.expected_before {
            let found = source.text_of(span);
            if !expected.matches(&found) {
                return Err(EditError::VerificationFailed {
                    file: self.file.clone(),
                    span,
                    expected: format!("{expected:?}"),
                    found,
                });
            }
        }

        let change = if replacement.is_empty() {
            Change::Removed { span }
        } else {
            Change::Replaced {
                span,
                inserted: replacement.len(),
            }
        };

        let lines = rewrite(source.lines(), span, &replacement)?;
        Ok(Splice {
            change,
            lines: LineSequence::from_lines(lines, source.ending()),
        })
    }

    /// Compute the edit against the file on disk without writing.
    pub fn preview(&self) -> Result<EditPreview, EditError> {
        let original = read_source(&self.file)?;
        let splice = self.apply_to(&LineSequence::parse(&original))?;

        Ok(EditPreview {
            file: self.file.clone(),
            change: splice.change,
            modified: splice.lines.to_text(),
            original,
        })
    }

    /// Apply this edit to the file system atomically.
    ///
    /// Nothing is written when the block already matches the replacement or
    /// when any step fails.
    pub fn apply(&self) -> Result<EditResult, EditError> {
        let preview = self.preview()?;

        if !preview.change.is_noop() {
            write_source(&self.file, &preview.modified)?;
            info!(file = %self.file.display(), span = %preview.change.span(), "block rewritten");
        }

        Ok(EditResult::from_change(self.file.clone(), preview.change))
    }
}

/// Read a UTF-8 text file, separating a missing file from other I/O errors.
pub fn read_source(path: &Path) -> Result<String, EditError> {
    let bytes = fs::read(path).map_err(|e| EditError::io(path, e))?;
    String::from_utf8(bytes).map_err(|_| EditError::InvalidUtf8(path.to_path_buf()))
}

/// Persist `content` to `path` atomically, mapping failures to [`EditError`].
pub fn write_source(path: &Path, content: &str) -> Result<(), EditError> {
    persist(path, content).map_err(|e| EditError::io(path, e))
}
