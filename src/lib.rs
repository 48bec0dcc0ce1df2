//! Gradle Patcher: selective dependency rewriting for Gradle build scripts
//!
//! Applies dependency-change advice (add / remove / change) to Groovy and
//! Kotlin DSL build scripts, producing text byte-identical to the original
//! outside the spans the advice touches.
//!
//! # Architecture
//!
//! All rewrite operations compile down to a single primitive:
//! [`SourceEdits`], an accumulator of non-overlapping byte-span edits over an
//! immutable buffer. Intelligence lives in span acquisition (the parse tree
//! walk in [`ScriptRewriter`]), not in the application logic.
//!
//! # Safety
//!
//! - Scripts with parse diagnostics are never rewritten ([`RewriteError::ParseFailure`])
//! - Rewritten output must re-parse cleanly before it lands on disk
//! - Atomic file writes (tempfile + fsync + rename), hash-guarded against
//!   concurrent modification
//! - Project boundary enforcement for every written path
//!
//! # Example
//!
//! ```
//! use gradle_patcher::{Advice, AdviceSet, AdvicePrinter, Coordinates, Dsl, ScriptRewriter};
//!
//! let advice = AdviceSet::new([Advice::Remove {
//!     coordinates: Coordinates::parse("com.acme:unused:1.0"),
//!     from_configuration: "implementation".to_string(),
//! }]);
//! let rewriter = ScriptRewriter::new(advice, AdvicePrinter::new(Dsl::Kotlin));
//!
//! let script = "dependencies {\n    implementation(\"com.acme:unused:1.0\")\n}\n";
//! let rewritten = rewriter.rewrite(script).unwrap();
//! assert_eq!(rewritten, "dependencies {\n}\n");
//! ```

pub mod advice;
pub mod config;
pub mod edit;
pub mod parse;
pub mod printer;
pub mod rewriter;
pub mod safety;
pub mod validate;

// Re-exports
pub use advice::{Advice, AdviceSet, Coordinates};
pub use config::{
    apply_advice, check_advice, load_from_path, load_from_str, ApplicationError, ApplyOptions,
    ConfigError, ScriptResult,
};
pub use edit::SourceEdits;
pub use printer::{AdvicePrinter, Dsl};
pub use rewriter::{
    collect_declarations, governed_declarations, rewrite, BlockKind, DependencyDeclaration,
    RewriteError, ScriptRewriter,
};
pub use safety::{ProjectGuard, SafetyError};
pub use validate::{validate_rewritten, ValidationError};
