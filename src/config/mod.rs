//! Advice files and their application to a project tree.

pub mod applicator;
pub mod loader;
pub mod schema;

pub use applicator::{
    apply_advice, check_advice, discover_build_scripts, list_scripts, ApplicationError,
    ApplyOptions, CheckOutcome, ScriptListing, ScriptReport, ScriptResult, UnmatchedAdvice,
};
pub use loader::{load_from_path, load_from_str, ConfigError};
pub use schema::{AdviceConfig, AdviceEntry, Metadata, ValidationError, ValidationIssue};
