use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use gradle_patcher::advice::Advice;
use gradle_patcher::config::{
    apply_advice, check_advice, list_scripts, load_from_path, AdviceConfig, ApplyOptions,
    CheckOutcome, ScriptResult,
};
use gradle_patcher::printer::{AdvicePrinter, Dsl};
use gradle_patcher::rewriter::ScriptRewriter;
use similar::{ChangeTag, TextDiff};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gradle-patcher")]
#[command(about = "Selective dependency rewriting for Gradle build scripts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply an advice file to a project's build scripts
    Apply {
        /// Path to project root (auto-detected if not specified)
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Advice file (JSON) to apply
        #[arg(short, long)]
        advice: PathBuf,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Report what an advice file would do, without touching any file
    Check {
        /// Path to project root (auto-detected if not specified)
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Advice file (JSON) to evaluate
        #[arg(short, long)]
        advice: PathBuf,
    },

    /// List build scripts and the dependency declarations found in each
    List {
        /// Path to project root (auto-detected if not specified)
        #[arg(short, long)]
        project: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            project,
            advice,
            dry_run,
            diff,
        } => cmd_apply(project, advice, dry_run, diff),

        Commands::Check { project, advice } => cmd_check(project, advice),

        Commands::List { project } => cmd_list(project),
    }
}

/// Resolve the project root using multiple detection strategies
///
/// Priority order:
/// 1. Explicit --project flag
/// 2. GRADLE_PATCHER_PROJECT environment variable
/// 3. Auto-detect by walking up from the current directory
fn resolve_project(cli_project: Option<PathBuf>) -> Result<PathBuf> {
    // 1. Explicit flag (highest priority)
    if let Some(path) = cli_project {
        return Ok(path.canonicalize()?);
    }

    // 2. Environment variable
    if let Ok(env_path) = env::var("GRADLE_PATCHER_PROJECT") {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(path.canonicalize()?);
        }
        eprintln!(
            "{}",
            format!(
                "Warning: GRADLE_PATCHER_PROJECT is set but path doesn't exist: {}",
                env_path
            )
            .yellow()
        );
    }

    // 3. Auto-detect from the current directory
    if let Some(path) = auto_detect_project() {
        println!(
            "{}",
            format!("Auto-detected project: {}", path.display()).dimmed()
        );
        return Ok(path);
    }

    // 4. Helpful error with multiple solutions
    anyhow::bail!(
        "{}\n{}\n  {}\n  {}\n  {}",
        "Could not find a Gradle project.".red(),
        "Try one of:".bold(),
        "1. cd into your project: cd /path/to/project && gradle-patcher apply -a advice.json",
        "2. Specify explicitly: gradle-patcher apply --project /path/to/project -a advice.json",
        "3. Set environment variable: export GRADLE_PATCHER_PROJECT=/path/to/project"
    )
}

/// Walk up from the current directory looking for a Gradle settings or build
/// script.
fn auto_detect_project() -> Option<PathBuf> {
    let current = env::current_dir().ok()?;

    for ancestor in current.ancestors() {
        let markers = [
            "settings.gradle",
            "settings.gradle.kts",
            "build.gradle",
            "build.gradle.kts",
        ];
        if markers.iter().any(|m| ancestor.join(m).exists()) {
            return Some(ancestor.to_path_buf());
        }
    }

    None
}

/// Helper: Show unified diff between original and rewritten content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (rewritten)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

/// Human description of one advice item, for reports.
fn describe_advice(advice: &Advice) -> String {
    match advice {
        Advice::Add {
            coordinates,
            to_configuration,
        } => format!("add {coordinates} to {to_configuration}"),
        Advice::Remove {
            coordinates,
            from_configuration,
        } => format!("remove {coordinates} from {from_configuration}"),
        Advice::Change {
            coordinates,
            from_configuration,
            to_configuration,
            to_coordinates,
        } => match to_coordinates {
            Some(new) => {
                format!("change {coordinates} ({from_configuration}) to {new} ({to_configuration})")
            }
            None => format!("change {coordinates} from {from_configuration} to {to_configuration}"),
        },
    }
}

/// Recompute the rewritten text in memory, for diff display under dry-run.
fn rewrite_in_memory(config: &AdviceConfig, script: &Path, original: &str) -> Option<String> {
    let name = script.file_name()?.to_string_lossy();
    let rewriter = ScriptRewriter::new(
        config.advice_set(),
        AdvicePrinter::new(Dsl::for_file_name(&name)),
    );
    rewriter.rewrite(original).ok()
}

fn cmd_apply(
    project: Option<PathBuf>,
    advice_file: PathBuf,
    dry_run: bool,
    show_diff: bool,
) -> Result<()> {
    // 1. Resolve project root and load the advice file
    let project = resolve_project(project)?;
    let config = load_from_path(&advice_file)?;

    println!("Project: {}", project.display());
    println!(
        "Advice: {} ({} items)",
        advice_file.display(),
        config.advice.len()
    );
    if dry_run {
        println!("{}", "[DRY RUN - no files will be modified]".cyan());
    }
    println!();

    // 2. Capture file contents before applying (for diff output)
    let mut contents_before = std::collections::HashMap::new();
    if show_diff {
        for script in gradle_patcher::config::discover_build_scripts(&project)? {
            if let Ok(content) = fs::read_to_string(&script) {
                contents_before.insert(script, content);
            }
        }
    }

    // 3. Apply
    let results = apply_advice(&config, &project, ApplyOptions { dry_run })?;

    if results.is_empty() {
        println!("{}", "No build scripts found".yellow());
        return Ok(());
    }

    // 4. Report results
    let mut total_rewritten = 0;
    let mut total_unchanged = 0;
    let mut total_failed = 0;

    for result in &results {
        match result {
            ScriptResult::Rewritten { script } => {
                if dry_run {
                    println!("{} Would rewrite {}", "✓".green(), script.display());
                } else {
                    println!("{} Rewrote {}", "✓".green(), script.display());
                }
                total_rewritten += 1;

                if show_diff {
                    if let Some(before) = contents_before.get(script) {
                        let after = if dry_run {
                            rewrite_in_memory(&config, script, before)
                        } else {
                            fs::read_to_string(script).ok()
                        };
                        if let Some(after) = after {
                            if before != &after {
                                display_diff(script, before, &after);
                            }
                        }
                    }
                }
            }
            ScriptResult::Unchanged { script } => {
                println!("{} Unchanged {}", "⊙".yellow(), script.display());
                total_unchanged += 1;
            }
            ScriptResult::Failed { script, reason } => {
                eprintln!("{} Failed on {}: {}", "✗".red(), script.display(), reason);
                total_failed += 1;
            }
        }
    }

    // 5. Summary
    println!();
    println!("{}", "Summary:".bold());
    println!("  {} rewritten", format!("{}", total_rewritten).green());
    println!("  {} unchanged", format!("{}", total_unchanged).yellow());
    println!("  {} failed", format!("{}", total_failed).red());

    if total_failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_check(project: Option<PathBuf>, advice_file: PathBuf) -> Result<()> {
    let project = resolve_project(project)?;
    let config = load_from_path(&advice_file)?;

    println!("{}", "Advice Check Report".bold());
    println!("Project: {}", project.display());
    println!("Advice: {}", advice_file.display());
    println!();

    let reports = check_advice(&config, &project)?;

    if reports.is_empty() {
        println!("{}", "No build scripts found".yellow());
        return Ok(());
    }

    let mut any_parse_failure = false;

    for report in &reports {
        match &report.outcome {
            CheckOutcome::WouldRewrite { unmatched } => {
                println!(
                    "{} {}: would be rewritten",
                    "✓".green(),
                    report.script.display()
                );
                print_unmatched(unmatched);
            }
            CheckOutcome::NoChanges { unmatched } => {
                println!("{} {}: no changes", "⊙".yellow(), report.script.display());
                print_unmatched(unmatched);
            }
            CheckOutcome::ParseFailure { message } => {
                eprintln!("{} {}: {}", "✗".red(), report.script.display(), message);
                any_parse_failure = true;
            }
        }
    }

    if any_parse_failure {
        std::process::exit(1);
    }

    Ok(())
}

fn print_unmatched(unmatched: &[gradle_patcher::config::UnmatchedAdvice]) {
    for item in unmatched {
        println!(
            "    {} no declaration matches: {}",
            "?".cyan(),
            describe_advice(&item.advice)
        );
        if let Some(closest) = &item.closest {
            println!("      closest declared coordinate: {}", closest.dimmed());
        }
    }
}

fn cmd_list(project: Option<PathBuf>) -> Result<()> {
    let project = resolve_project(project)?;

    println!("{}", "Build Scripts".bold());
    println!("Project: {}", project.display());
    println!();

    let listings = list_scripts(&project)?;

    if listings.is_empty() {
        println!("{}", "No build scripts found".yellow());
        return Ok(());
    }

    for listing in &listings {
        println!("{}", listing.script.display().to_string().bold());
        if let Some(error) = &listing.parse_error {
            println!("  {} {}", "✗".red(), error);
            continue;
        }
        if listing.declarations.is_empty() {
            println!("  {}", "(no dependency declarations)".dimmed());
            continue;
        }
        for declaration in &listing.declarations {
            println!(
                "  {} {}",
                declaration.configuration.cyan(),
                declaration.identifier
            );
        }
    }

    Ok(())
}
