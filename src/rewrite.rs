//! Line splicing and atomic persistence.

use crate::locate::Span;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    #[error("invalid span [{start}, {end}) for a sequence of {len} lines")]
    InvalidSpan { start: usize, end: usize, len: usize },
}

/// Check that `span` is well-formed and lies within `len` lines.
pub fn validate_span(span: Span, len: usize) -> Result<(), RewriteError> {
    if span.start > span.end || span.end > len {
        return Err(RewriteError::InvalidSpan {
            start: span.start,
            end: span.end,
            len,
        });
    }
    Ok(())
}

/// Replace `lines[span]` with `replacement`.
///
/// Lines outside the span are copied verbatim. The replacement is not
/// checked for balance.
pub fn rewrite<S, R>(lines: &[S], span: Span, replacement: &[R]) -> Result<Vec<String>, RewriteError>
where
    S: AsRef<str>,
    R: AsRef<str>,
{
    validate_span(span, lines.len())?;

    let mut out = Vec::with_capacity(lines.len() - span.len() + replacement.len());
    out.extend(lines[..span.start].iter().map(|l| l.as_ref().to_owned()));
    out.extend(replacement.iter().map(|l| l.as_ref().to_owned()));
    out.extend(lines[span.end..].iter().map(|l| l.as_ref().to_owned()));

    Ok(out)
}

/// Atomic file write: tempfile + fsync + rename.
///
/// The temporary file lives next to `path` so the rename stays on one
/// filesystem. Permissions of an existing file are carried over. If any step
/// fails the temporary file is dropped and `path` keeps its old content.
pub fn persist(path: &Path, content: &str) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        Some(_) => Path::new("."),
        None => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "path has no parent directory",
            ))
        }
    };

    let permissions = fs::metadata(path).ok().map(|m| m.permissions());

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;

    if let Some(permissions) = permissions {
        temp.as_file().set_permissions(permissions)?;
    }

    temp.persist(path).map_err(|e| e.error)?;
    debug!(path = %path.display(), bytes = content.len(), "persisted file");

    Ok(())
}
