pub mod applicator;
pub mod loader;
pub mod schema;

pub use applicator::{apply_plan, preview_plan, PlanError, PlanOutcome, PlanReport};
pub use loader::{load_from_path, load_from_str, ConfigError};
pub use schema::{
    DelimiterSpec, EditPlan, Metadata, Operation, PlanEdit, ValidationError, ValidationIssue,
    Verify,
};
