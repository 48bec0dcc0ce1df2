//! Advice applicator - applies an advice file across a project's build scripts
//!
//! This module provides the high-level application flow:
//! - Discovers build scripts under the project root
//! - Picks the script dialect per file name
//! - Rewrites each script and re-parses the result before anything lands
//! - Writes atomically, guarded against concurrent modification
//! - Reports detailed results per script

use crate::advice::{Advice, AdviceSet};
use crate::config::schema::AdviceConfig;
use crate::parse;
use crate::printer::{AdvicePrinter, Dsl};
use crate::rewriter::{governed_declarations, DependencyDeclaration, ScriptRewriter};
use crate::safety::{ProjectGuard, SafetyError};
use crate::validate::validate_rewritten;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use xxhash_rust::xxh3::xxh3_64;

/// Result of applying advice to a single build script.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "ScriptResult should be checked for success/failure"]
pub enum ScriptResult {
    /// The script was rewritten (or would be, under dry-run).
    Rewritten { script: PathBuf },
    /// No advice touched this script.
    Unchanged { script: PathBuf },
    /// The script could not be rewritten.
    Failed { script: PathBuf, reason: String },
}

impl ScriptResult {
    pub fn script(&self) -> &Path {
        match self {
            ScriptResult::Rewritten { script }
            | ScriptResult::Unchanged { script }
            | ScriptResult::Failed { script, .. } => script,
        }
    }
}

impl fmt::Display for ScriptResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptResult::Rewritten { script } => {
                write!(f, "Rewrote {}", script.display())
            }
            ScriptResult::Unchanged { script } => {
                write!(f, "Unchanged {}", script.display())
            }
            ScriptResult::Failed { script, reason } => {
                write!(f, "Failed on {}: {}", script.display(), reason)
            }
        }
    }
}

/// Errors that abort the whole application run (per-script problems are
/// reported as `ScriptResult::Failed` instead).
#[derive(Debug)]
pub enum ApplicationError {
    Safety(SafetyError),
    Walk(walkdir::Error),
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationError::Safety(e) => write!(f, "safety error: {}", e),
            ApplicationError::Walk(e) => write!(f, "script discovery failed: {}", e),
        }
    }
}

impl std::error::Error for ApplicationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApplicationError::Safety(e) => Some(e),
            ApplicationError::Walk(e) => Some(e),
        }
    }
}

impl From<SafetyError> for ApplicationError {
    fn from(e: SafetyError) -> Self {
        ApplicationError::Safety(e)
    }
}

impl From<walkdir::Error> for ApplicationError {
    fn from(e: walkdir::Error) -> Self {
        ApplicationError::Walk(e)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    /// Compute and validate everything but write nothing.
    pub dry_run: bool,
}

/// Apply an advice file to every build script under `project_root`.
///
/// Returns one result per discovered script, in path order.
pub fn apply_advice(
    config: &AdviceConfig,
    project_root: &Path,
    options: ApplyOptions,
) -> Result<Vec<ScriptResult>, ApplicationError> {
    let guard = ProjectGuard::new(project_root)?;
    let scripts = discover_build_scripts(guard.project_root())?;
    let advice = config.advice_set();

    Ok(scripts
        .iter()
        .map(|script| apply_to_script(&advice, &guard, script, options))
        .collect())
}

fn apply_to_script(
    advice: &AdviceSet,
    guard: &ProjectGuard,
    script: &Path,
    options: ApplyOptions,
) -> ScriptResult {
    let failed = |reason: String| ScriptResult::Failed {
        script: script.to_path_buf(),
        reason,
    };

    let path = match guard.validate_path(script) {
        Ok(path) => path,
        Err(e) => return failed(e.to_string()),
    };

    let original = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => return failed(format!("read failed: {e}")),
    };
    let original_hash = xxh3_64(original.as_bytes());

    let rewriter = ScriptRewriter::new(advice.clone(), printer_for(&path));
    let rewritten = match rewriter.rewrite(&original) {
        Ok(text) => text,
        Err(e) => return failed(e.to_string()),
    };

    if rewritten == original {
        return ScriptResult::Unchanged {
            script: script.to_path_buf(),
        };
    }

    if let Err(e) = validate_rewritten(&rewritten) {
        return failed(e.to_string());
    }

    if options.dry_run {
        return ScriptResult::Rewritten {
            script: script.to_path_buf(),
        };
    }

    if let Err(reason) = write_script(guard, &path, original_hash, &rewritten) {
        return failed(reason);
    }

    ScriptResult::Rewritten {
        script: script.to_path_buf(),
    }
}

/// Guarded atomic write: re-validate the path, verify the on-disk content is
/// still what the rewrite was computed against, then tempfile + fsync + rename.
fn write_script(
    guard: &ProjectGuard,
    path: &Path,
    expected_hash: u64,
    content: &str,
) -> Result<(), String> {
    guard.revalidate(path).map_err(|e| e.to_string())?;

    let current = fs::read(path).map_err(|e| format!("re-read failed: {e}"))?;
    if xxh3_64(&current) != expected_hash {
        return Err("script changed on disk while the rewrite was computed".to_string());
    }

    atomic_write(path, content.as_bytes()).map_err(|e| format!("write failed: {e}"))
}

/// Atomic file write: tempfile in the same directory, fsync, rename.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent")
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

fn printer_for(path: &Path) -> AdvicePrinter {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    AdvicePrinter::new(Dsl::for_file_name(&name))
}

/// Find `build.gradle` / `build.gradle.kts` files under `root`, skipping
/// generated and hidden directories. Sorted for deterministic results.
pub fn discover_build_scripts(root: &Path) -> Result<Vec<PathBuf>, ApplicationError> {
    let mut scripts = Vec::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name == "build.gradle" || name == "build.gradle.kts" {
            scripts.push(entry.path().to_path_buf());
        }
    }

    scripts.sort();
    Ok(scripts)
}

fn is_skipped_dir(entry: &walkdir::DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name == "build" || name.starts_with('.')
}

/// Read-only evaluation of an advice file against a project.
#[derive(Debug, Clone)]
pub struct ScriptReport {
    pub script: PathBuf,
    pub outcome: CheckOutcome,
}

#[derive(Debug, Clone)]
pub enum CheckOutcome {
    WouldRewrite { unmatched: Vec<UnmatchedAdvice> },
    NoChanges { unmatched: Vec<UnmatchedAdvice> },
    ParseFailure { message: String },
}

/// A Remove/Change advice item that matched no declaration in a script, with
/// the closest declared coordinate when one is plausibly related.
#[derive(Debug, Clone)]
pub struct UnmatchedAdvice {
    pub advice: Advice,
    pub closest: Option<String>,
}

/// Minimum Jaro-Winkler similarity for a "closest declaration" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.7;

/// Evaluate `config` against every build script under `project_root` without
/// touching any file. Mirrors `apply_advice` semantics: `WouldRewrite` means
/// an apply run would change the script.
pub fn check_advice(
    config: &AdviceConfig,
    project_root: &Path,
) -> Result<Vec<ScriptReport>, ApplicationError> {
    let guard = ProjectGuard::new(project_root)?;
    let scripts = discover_build_scripts(guard.project_root())?;
    let advice = config.advice_set();

    let mut reports = Vec::new();
    for script in scripts {
        let outcome = check_script(&advice, &script);
        reports.push(ScriptReport { script, outcome });
    }
    Ok(reports)
}

fn check_script(advice: &AdviceSet, script: &Path) -> CheckOutcome {
    let original = match fs::read_to_string(script) {
        Ok(content) => content,
        Err(e) => {
            return CheckOutcome::ParseFailure {
                message: format!("read failed: {e}"),
            }
        }
    };

    let rewriter = ScriptRewriter::new(advice.clone(), printer_for(script));
    let rewritten = match rewriter.rewrite(&original) {
        Ok(text) => text,
        Err(e) => {
            return CheckOutcome::ParseFailure {
                message: e.to_string(),
            }
        }
    };

    let parsed = parse::parse(&original);
    let declarations = governed_declarations(&parsed, &original);
    let unmatched = unmatched_advice(&rewriter, &declarations);

    if rewritten == original {
        CheckOutcome::NoChanges { unmatched }
    } else {
        CheckOutcome::WouldRewrite { unmatched }
    }
}

/// Remove/Change advice that governs no declaration in this script. Add
/// advice is excluded: it matches nothing by design.
fn unmatched_advice(
    rewriter: &ScriptRewriter,
    declarations: &[DependencyDeclaration],
) -> Vec<UnmatchedAdvice> {
    let matched: HashSet<&Advice> = declarations
        .iter()
        .filter_map(|declaration| rewriter.find_advice(declaration))
        .collect();

    rewriter
        .advice()
        .iter()
        .filter(|advice| advice.from_configuration().is_some() && !matched.contains(advice))
        .map(|advice| UnmatchedAdvice {
            advice: advice.clone(),
            closest: closest_declaration(rewriter, advice, declarations),
        })
        .collect()
}

fn closest_declaration(
    rewriter: &ScriptRewriter,
    advice: &Advice,
    declarations: &[DependencyDeclaration],
) -> Option<String> {
    let wanted = advice.coordinates().gav();
    declarations
        .iter()
        .map(|declaration| {
            let identifier = rewriter.normalize_identifier(&declaration.identifier);
            let score = strsim::jaro_winkler(&wanted, &identifier);
            (identifier, score)
        })
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(identifier, _)| identifier)
}

/// Declarations found per script, for reporting.
#[derive(Debug, Clone)]
pub struct ScriptListing {
    pub script: PathBuf,
    pub declarations: Vec<DependencyDeclaration>,
    pub parse_error: Option<String>,
}

/// List every discovered build script with the declarations in its governed
/// dependencies blocks.
pub fn list_scripts(project_root: &Path) -> Result<Vec<ScriptListing>, ApplicationError> {
    let guard = ProjectGuard::new(project_root)?;
    let scripts = discover_build_scripts(guard.project_root())?;

    let mut listings = Vec::new();
    for script in scripts {
        match fs::read_to_string(&script) {
            Ok(content) => {
                let parsed = parse::parse(&content);
                let parse_error = if parsed.has_errors() {
                    Some(
                        parsed
                            .diagnostics
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join("; "),
                    )
                } else {
                    None
                };
                let declarations = governed_declarations(&parsed, &content);
                listings.push(ScriptListing {
                    script,
                    declarations,
                    parse_error,
                });
            }
            Err(e) => listings.push(ScriptListing {
                script,
                declarations: Vec::new(),
                parse_error: Some(format!("read failed: {e}")),
            }),
        }
    }
    Ok(listings)
}
