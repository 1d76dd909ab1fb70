//! Block Patcher: structural block editing for source files
//!
//! Finds a function-like block by an anchor substring on its first line,
//! measures its extent by delimiter balance, and replaces or deletes it while
//! every other line of the file stays byte-identical.
//!
//! # Architecture
//!
//! Editing is a two-phase pipeline of pure functions followed by one write:
//!
//! 1. [`locate`] scans a line sequence and returns a half-open [`Span`] or a
//!    named failure. It never mutates anything.
//! 2. [`rewrite`] splices replacement lines over the span.
//! 3. [`persist`] writes the result atomically (tempfile + fsync + rename).
//!
//! [`BlockEdit`] runs the whole pipeline against a file on disk, and
//! [`config`] applies several explicitly listed edits from a TOML plan with a
//! single write.
//!
//! # Example
//!
//! ```
//! use block_patcher::{locate, rewrite, Span};
//!
//! let lines = ["fn f() {", "  body", "}", "fn g() {}"];
//! let span = locate(&lines, "fn f()", 0).unwrap();
//! assert_eq!(span, Span::new(0, 3));
//!
//! let patched = rewrite(&lines, span, &["fn f() { changed }"]).unwrap();
//! assert_eq!(patched, vec!["fn f() { changed }", "fn g() {}"]);
//! ```

pub mod config;
pub mod edit;
pub mod lines;
pub mod locate;
pub mod logging;
pub mod rewrite;

// Re-exports
pub use config::{apply_plan, load_from_path, load_from_str, preview_plan, EditPlan, PlanError};
pub use edit::{BlockEdit, Change, EditError, EditPreview, EditResult, EditVerification};
pub use lines::{LineEnding, LineSequence};
pub use locate::{locate, BlockLocator, Delimiters, Imbalance, LocateError, Span};
pub use rewrite::{persist, rewrite, RewriteError};
