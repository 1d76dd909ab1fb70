//! Edit plan loading.
//!
//! Plans are read as UTF-8 TOML (a leading byte-order mark is tolerated),
//! deserialized into [`EditPlan`] and validated before they are returned, so
//! callers never see a plan with unusable edits.

use crate::config::schema::{EditPlan, ValidationError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read edit plan from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse edit plan TOML{}: {source}", origin(.path))]
    Toml {
        path: Option<PathBuf>,
        #[source]
        source: toml_edit::de::Error,
    },

    #[error("invalid edit plan{}: {source}", origin(.path))]
    Validation {
        path: Option<PathBuf>,
        #[source]
        source: ValidationError,
    },
}

fn origin(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" ({})", p.display()))
        .unwrap_or_default()
}

/// Deserialize and validate plan text; `path` only labels errors.
fn parse(input: &str, path: Option<&Path>) -> Result<EditPlan, ConfigError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let path = path.map(Path::to_path_buf);

    let plan: EditPlan = toml_edit::de::from_str(input).map_err(|source| ConfigError::Toml {
        path: path.clone(),
        source,
    })?;
    plan.validate()
        .map_err(|source| ConfigError::Validation { path, source })?;

    debug!(name = %plan.meta.name, edits = plan.edits.len(), "loaded edit plan");
    Ok(plan)
}

pub fn load_from_str(input: &str) -> Result<EditPlan, ConfigError> {
    parse(input, None)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<EditPlan, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents, Some(path))
}
