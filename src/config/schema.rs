use crate::edit::{parse_hash, EditVerification};
use crate::locate::Delimiters;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::fmt;

/// A list of block edits applied in order to a single file.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct EditPlan {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub delimiters: DelimiterSpec,
    #[serde(default)]
    pub edits: Vec<PlanEdit>,
}

impl EditPlan {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.delimiters.open == self.delimiters.close {
            issues.push(ValidationIssue::InvalidCombo {
                edit_id: None,
                message: format!(
                    "opening and closing delimiters must differ, got {:?} for both",
                    self.delimiters.open
                ),
            });
        }

        if self.edits.is_empty() {
            issues.push(ValidationIssue::EmptyEditList);
        }

        let mut seen = HashSet::new();
        for edit in &self.edits {
            if edit.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    edit_id: None,
                    field: "id",
                });
            } else if !seen.insert(edit.id.as_str()) {
                issues.push(ValidationIssue::DuplicateId {
                    edit_id: edit.id.clone(),
                });
            }

            if edit.anchor.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    edit_id: Some(edit.id.clone()),
                    field: "anchor",
                });
            }

            match &edit.operation {
                Operation::Replace { text } => {
                    if text.trim().is_empty() {
                        issues.push(ValidationIssue::InvalidCombo {
                            edit_id: Some(edit.id.clone()),
                            message: "replace with empty text; use a delete operation".to_string(),
                        });
                    }
                }
                Operation::Delete => {}
            }

            if let Some(Verify::ExactMatch { expected_text }) = &edit.verify {
                if expected_text.is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        edit_id: Some(edit.id.clone()),
                        field: "verify.expected_text",
                    });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Delimiter pair as written in a plan; `{` / `}` unless overridden.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct DelimiterSpec {
    pub open: char,
    pub close: char,
}

impl Default for DelimiterSpec {
    fn default() -> Self {
        let Delimiters { open, close } = Delimiters::default();
        Self { open, close }
    }
}

impl DelimiterSpec {
    /// Only meaningful on a validated plan, where the pair is distinct.
    pub fn to_delimiters(self) -> Delimiters {
        Delimiters {
            open: self.open,
            close: self.close,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlanEdit {
    pub id: String,
    pub anchor: String,
    /// 0-based line index at which the anchor search starts
    #[serde(default)]
    pub from_line: usize,
    /// Skip instead of failing when the anchor is absent
    #[serde(default)]
    pub optional: bool,
    pub operation: Operation,
    #[serde(default)]
    pub verify: Option<Verify>,
}

impl PlanEdit {
    pub fn replacement(&self) -> &str {
        match &self.operation {
            Operation::Replace { text } => text,
            Operation::Delete => "",
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Operation {
    Replace { text: String },
    Delete,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Verify {
    ExactMatch {
        expected_text: String,
    },
    /// xxh3 of the block's current text, written in hex
    Hash {
        #[serde(deserialize_with = "deserialize_hash")]
        expected: u64,
    },
}

impl Verify {
    pub fn to_verification(&self) -> EditVerification {
        match self {
            Verify::ExactMatch { expected_text } => {
                EditVerification::ExactMatch(expected_text.clone())
            }
            Verify::Hash { expected } => EditVerification::Hash(*expected),
        }
    }
}

fn deserialize_hash<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_hash(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid xxh3 hash {raw:?}")))
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyEditList,
    MissingField {
        edit_id: Option<String>,
        field: &'static str,
    },
    DuplicateId {
        edit_id: String,
    },
    InvalidCombo {
        edit_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyEditList => write!(f, "edit plan contains no edits"),
            ValidationIssue::MissingField { edit_id, field } => match edit_id {
                Some(id) => write!(f, "edit '{id}' missing required field '{field}'"),
                None => write!(f, "edit missing required field '{field}'"),
            },
            ValidationIssue::DuplicateId { edit_id } => {
                write!(f, "edit id '{edit_id}' is used more than once")
            }
            ValidationIssue::InvalidCombo { edit_id, message } => match edit_id {
                Some(id) => write!(f, "edit '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid edit plan: {message}"),
            },
        }
    }
}
