//! Post-rewrite validation.
//!
//! A rewrite is only syntactic, so the one guarantee worth checking before
//! output replaces a real build script is that the result still parses
//! cleanly. The applicator runs this gate on every rewritten script and
//! refuses to write when it fails.

use crate::parse::{self, Diagnostic};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("rewritten script no longer parses: {}", fmt_diagnostics(.diagnostics))]
    Reparse { diagnostics: Vec<Diagnostic> },
}

fn fmt_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Re-parse rewritten output and fail if any diagnostics are present.
pub fn validate_rewritten(text: &str) -> Result<(), ValidationError> {
    let parsed = parse::parse(text);
    if parsed.has_errors() {
        return Err(ValidationError::Reparse {
            diagnostics: parsed.diagnostics,
        });
    }
    Ok(())
}
