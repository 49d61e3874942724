pub mod applicator;
pub mod loader;
pub mod schema;

pub use applicator::{
    apply_updates, check_updates, plan_updates, ApplicationError, UpdateOutcome, UpdateResult,
};
pub use loader::{load_from_path, load_from_str, ConfigError, PlanOrigin};
pub use schema::{
    Metadata, Target, UpdateConfig, UpdateDefinition, ValidationError, ValidationIssue,
};
