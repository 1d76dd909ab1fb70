//! Edit plan applicator - applies a plan's edits to one file
//!
//! This module provides whole-plan application that:
//! - Reads the target file once
//! - Applies each edit, in order, to the evolving in-memory lines
//! - Skips optional edits whose anchor is absent
//! - Persists once, atomically, and only when something changed

use crate::config::schema::{EditPlan, ValidationError};
use crate::edit::{read_source, write_source, BlockEdit, Change, EditError};
use crate::lines::LineSequence;
use crate::locate::Span;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Result of a single plan edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanOutcome {
    /// Block replaced by `inserted` lines
    Replaced { span: Span, inserted: usize },
    /// Block deleted
    Removed { span: Span },
    /// Block already matched the replacement
    AlreadyApplied { span: Span },
    /// Optional edit whose anchor was not found
    SkippedMissing,
}

impl From<Change> for PlanOutcome {
    fn from(change: Change) -> Self {
        match change {
            Change::Replaced { span, inserted } => PlanOutcome::Replaced { span, inserted },
            Change::Removed { span } => PlanOutcome::Removed { span },
            Change::Unchanged { span } => PlanOutcome::AlreadyApplied { span },
        }
    }
}

impl fmt::Display for PlanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanOutcome::Replaced { span, inserted } => {
                write!(f, "Replaced {} with {} line(s)", span, inserted)
            }
            PlanOutcome::Removed { span } => write!(f, "Removed {}", span),
            PlanOutcome::AlreadyApplied { span } => write!(f, "Already applied at {}", span),
            PlanOutcome::SkippedMissing => write!(f, "Skipped (anchor not found)"),
        }
    }
}

/// Per-edit outcomes plus the file content before and after the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PlanReport should be checked for changes"]
pub struct PlanReport {
    pub file: PathBuf,
    pub outcomes: Vec<(String, PlanOutcome)>,
    pub original: String,
    pub modified: String,
}

impl PlanReport {
    pub fn changed(&self) -> bool {
        self.original != self.modified
    }

    /// Number of edits that modified the file.
    pub fn applied(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, PlanOutcome::Replaced { .. } | PlanOutcome::Removed { .. }))
            .count()
    }
}

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("invalid edit plan: {0}")]
    Invalid(#[from] ValidationError),

    #[error("edit '{id}' failed: {source}")]
    Edit {
        id: String,
        #[source]
        source: EditError,
    },

    #[error(transparent)]
    File(EditError),
}

/// Run every edit of `plan` against `file` in memory, without writing.
///
/// The first failing non-optional edit aborts the whole plan.
pub fn preview_plan(plan: &EditPlan, file: &Path) -> Result<PlanReport, PlanError> {
    plan.validate()?;

    let original = read_source(file).map_err(PlanError::File)?;
    let mut current = LineSequence::parse(&original);
    let delimiters = plan.delimiters.to_delimiters();
    let mut outcomes = Vec::with_capacity(plan.edits.len());

    for plan_edit in &plan.edits {
        let mut edit = BlockEdit::replace(file, &plan_edit.anchor, plan_edit.replacement())
            .from_index(plan_edit.from_line)
            .delimiters(delimiters);
        if let Some(verify) = &plan_edit.verify {
            edit = edit.verify(verify.to_verification());
        }

        match edit.apply_to(&current) {
            Ok(splice) => {
                debug!(id = %plan_edit.id, change = ?splice.change, "plan edit spliced");
                outcomes.push((plan_edit.id.clone(), splice.change.into()));
                current = splice.lines;
            }
            Err(error) if plan_edit.optional && error.is_anchor_not_found() => {
                info!(id = %plan_edit.id, anchor = %plan_edit.anchor, "optional edit skipped");
                outcomes.push((plan_edit.id.clone(), PlanOutcome::SkippedMissing));
            }
            Err(error) => {
                return Err(PlanError::Edit {
                    id: plan_edit.id.clone(),
                    source: error,
                })
            }
        }
    }

    Ok(PlanReport {
        file: file.to_path_buf(),
        outcomes,
        modified: current.to_text(),
        original,
    })
}

/// Apply `plan` to `file` with a single atomic write.
///
/// Either every non-skipped edit lands or the file is left untouched.
pub fn apply_plan(plan: &EditPlan, file: &Path) -> Result<PlanReport, PlanError> {
    let report = preview_plan(plan, file)?;

    if report.changed() {
        write_source(file, &report.modified).map_err(PlanError::File)?;
        info!(
            file = %file.display(),
            applied = report.applied(),
            "edit plan persisted"
        );
    }

    Ok(report)
}
