//! The rewrite walk: block context tracking, declaration collection, advice
//! matching, and synthesis of new declarations.
//!
//! The walk is a synchronous recursive descent over the parsed statement
//! list. Block nesting state is an explicit stack value; every edit the walk
//! decides on is recorded as a byte-span edit and rendered once at the end.
//! A rewriter instance owns no shared mutable state: one instance per script,
//! while the advice set itself may be shared freely.

use crate::advice::{Advice, AdviceSet};
use crate::edit::SourceEdits;
use crate::parse::{self, Block, Diagnostic, Expr, Span, Statement};
use crate::printer::AdvicePrinter;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RewriteError {
    /// The parser reported diagnostics. No rewritten text is produced in this
    /// case: edits computed against a tree built from malformed input cannot
    /// be trusted to preserve unrelated source.
    #[error("refusing to rewrite script with parse errors: {}", fmt_diagnostics(.diagnostics))]
    ParseFailure { diagnostics: Vec<Diagnostic> },
}

fn fmt_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Kind of a named configuration block, as far as the rewriter cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// `buildscript { }` - build-tooling dependencies, never rewritten.
    Buildscript,
    /// `dependencies { }`.
    Dependencies,
    Other,
}

impl BlockKind {
    pub fn classify(name: &str) -> Self {
        match name {
            "buildscript" => BlockKind::Buildscript,
            "dependencies" => BlockKind::Dependencies,
            _ => BlockKind::Other,
        }
    }
}

/// One dependency declaration found as a direct statement of a governed
/// `dependencies` block.
#[derive(Debug, Clone)]
pub struct DependencyDeclaration {
    /// The configuration the dependency is filed under, e.g. `implementation`.
    pub configuration: String,
    /// Raw coordinate text as written in source, quotes included.
    pub identifier: String,
    /// The whole statement, trailing configuration lambda included.
    pub statement_span: Span,
    /// Statement start through the end of the argument list; replacing this
    /// sub-span leaves a trailing lambda untouched.
    pub argument_span: Span,
}

/// Collect the dependency declarations directly inside `block`, in document
/// order. Statements that do not match the declaration shape - a receiver-less
/// `configuration(coordinate)` call with a single string or `project(...)`
/// argument - are not declarations and are skipped.
pub fn collect_declarations(block: &Block, source: &str) -> Vec<DependencyDeclaration> {
    let mut declarations = Vec::new();
    for statement in &block.statements {
        let call = match statement {
            Statement::Call(call) => call,
            _ => continue,
        };
        if call.args.len() != 1 {
            continue;
        }
        let identifier = match &call.args[0] {
            Expr::Str { raw } => raw.text(source),
            Expr::ProjectCall { path, .. } => path.text(source),
            Expr::Other { .. } => continue,
        };
        declarations.push(DependencyDeclaration {
            configuration: call.callee.clone(),
            identifier: identifier.to_string(),
            statement_span: call.span,
            argument_span: call.call_span,
        });
    }
    declarations
}

/// All declarations in governed `dependencies` blocks of a parsed script:
/// everything the rewriter would consider, nothing from under `buildscript`.
pub fn governed_declarations(parsed: &parse::Parse, source: &str) -> Vec<DependencyDeclaration> {
    fn visit(
        statements: &[Statement],
        source: &str,
        inside_bootstrap: bool,
        out: &mut Vec<DependencyDeclaration>,
    ) {
        for statement in statements {
            if let Statement::Block(block) = statement {
                let kind = BlockKind::classify(&block.name);
                if kind == BlockKind::Dependencies && !inside_bootstrap {
                    out.extend(collect_declarations(block, source));
                }
                visit(
                    &block.statements,
                    source,
                    inside_bootstrap || kind == BlockKind::Buildscript,
                    out,
                );
            }
        }
    }

    let mut out = Vec::new();
    visit(&parsed.statements, source, false, &mut out);
    out
}

type ReverseMap = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Applies an advice set to build scripts.
///
/// Holds only read-only state; `rewrite` may be called for any number of
/// scripts. Concurrent rewrites need one call each, not one rewriter - the
/// per-script working state lives on the stack of `rewrite`.
pub struct ScriptRewriter {
    advice: AdviceSet,
    printer: AdvicePrinter,
    reverse_map: ReverseMap,
}

impl ScriptRewriter {
    pub fn new(advice: AdviceSet, printer: AdvicePrinter) -> Self {
        Self {
            advice,
            printer,
            reverse_map: Box::new(|identifier| identifier.to_string()),
        }
    }

    /// Install a reverse identifier mapping: from a project-local shorthand as
    /// it literally appears in source back to the standard coordinate form.
    /// Identity when not set.
    pub fn with_reverse_map(
        mut self,
        reverse_map: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.reverse_map = Box::new(reverse_map);
        self
    }

    pub fn advice(&self) -> &AdviceSet {
        &self.advice
    }

    /// Rewrite one script. Returns the full rewritten text, byte-identical to
    /// the input outside the spans advice touches, or `ParseFailure` when the
    /// parser reported any diagnostic.
    pub fn rewrite(&self, script: &str) -> Result<String, RewriteError> {
        let parsed = parse::parse(script);
        if parsed.has_errors() {
            return Err(RewriteError::ParseFailure {
                diagnostics: parsed.diagnostics,
            });
        }

        let mut walk = Walk {
            source: script,
            rewriter: self,
            edits: SourceEdits::new(script),
            stack: Vec::new(),
            found_dependencies_block: false,
        };
        walk.visit_statements(&parsed.statements);

        // Script exit: nothing to append into, so synthesize a whole block.
        if !walk.found_dependencies_block {
            let adds = self.advice.adds_in_order();
            if !adds.is_empty() {
                let mut text = String::new();
                if !script.is_empty() && !script.ends_with('\n') {
                    text.push('\n');
                }
                text.push_str("dependencies {\n");
                for advice in adds {
                    text.push_str(&self.printer.to_declaration(advice));
                    text.push('\n');
                }
                text.push_str("}\n");
                walk.edits.insert_before(parsed.end_pos, text);
            }
        }

        Ok(walk.edits.render())
    }

    /// Find the advice item governing `declaration`: first item, in the
    /// set's iteration order, whose coordinates match the normalized
    /// identifier and whose from-configuration equals the declaration's.
    /// Add advice has no from-configuration and never matches.
    pub fn find_advice(&self, declaration: &DependencyDeclaration) -> Option<&Advice> {
        let normalized = self.normalize_identifier(&declaration.identifier);
        self.advice.iter().find(|advice| {
            advice.from_configuration() == Some(declaration.configuration.as_str())
                && advice.coordinates().matches(&normalized)
        })
    }

    /// Strip surrounding quotes and apply the reverse identifier mapping.
    pub fn normalize_identifier(&self, raw: &str) -> String {
        let stripped = raw.trim_matches(|c| c == '"' || c == '\'');
        (self.reverse_map)(stripped)
    }
}

/// One-shot form of [`ScriptRewriter::rewrite`] for callers that do not need
/// to keep the rewriter around.
pub fn rewrite(
    script: &str,
    advice: AdviceSet,
    printer: AdvicePrinter,
    reverse_map: impl Fn(&str) -> String + Send + Sync + 'static,
) -> Result<String, RewriteError> {
    ScriptRewriter::new(advice, printer)
        .with_reverse_map(reverse_map)
        .rewrite(script)
}

/// Per-script walk state. Dropped when `rewrite` returns.
struct Walk<'a> {
    source: &'a str,
    rewriter: &'a ScriptRewriter,
    edits: SourceEdits,
    stack: Vec<BlockKind>,
    found_dependencies_block: bool,
}

impl Walk<'_> {
    fn visit_statements(&mut self, statements: &[Statement]) {
        for statement in statements {
            if let Statement::Block(block) = statement {
                self.visit_block(block);
            }
        }
    }

    fn visit_block(&mut self, block: &Block) {
        let kind = BlockKind::classify(&block.name);
        self.stack.push(kind);

        let governed = kind == BlockKind::Dependencies && !self.inside_bootstrap();
        if governed {
            self.apply_advice_to_declarations(block);
        }

        self.visit_statements(&block.statements);

        // Exit-time processing runs before the frame is popped, so a
        // bootstrap block still counts as bootstrap during its own exit.
        if governed {
            self.found_dependencies_block = true;
            self.append_adds(block);
        }

        self.stack.pop();
    }

    fn inside_bootstrap(&self) -> bool {
        self.stack.contains(&BlockKind::Buildscript)
    }

    fn apply_advice_to_declarations(&mut self, block: &Block) {
        for declaration in collect_declarations(block, self.source) {
            match self.rewriter.find_advice(&declaration) {
                None | Some(Advice::Add { .. }) => {}
                Some(Advice::Remove { .. }) => {
                    self.edits
                        .delete(declaration.statement_span.start, declaration.statement_span.end);
                }
                Some(change @ Advice::Change { .. }) => {
                    self.edits.replace(
                        declaration.argument_span.start,
                        declaration.argument_span.end,
                        self.rewriter.printer.to_declaration(change),
                    );
                }
            }
        }
    }

    /// Block exit: append add advice immediately before the closing brace.
    /// The unordered add view is intentional here; the ordered view is only
    /// for whole-block synthesis.
    fn append_adds(&mut self, block: &Block) {
        let adds = self.rewriter.advice.adds();
        if adds.is_empty() {
            return;
        }
        let mut text = String::new();
        for advice in adds {
            text.push_str(&self.rewriter.printer.to_declaration(advice));
            text.push('\n');
        }
        self.edits.insert_before(block.close_brace, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::Coordinates;
    use crate::printer::Dsl;

    fn remove(coordinates: &str, from: &str) -> Advice {
        Advice::Remove {
            coordinates: Coordinates::parse(coordinates),
            from_configuration: from.into(),
        }
    }

    fn change(coordinates: &str, from: &str, to: &str) -> Advice {
        Advice::Change {
            coordinates: Coordinates::parse(coordinates),
            from_configuration: from.into(),
            to_configuration: to.into(),
            to_coordinates: None,
        }
    }

    fn add(coordinates: &str, to: &str) -> Advice {
        Advice::Add {
            coordinates: Coordinates::parse(coordinates),
            to_configuration: to.into(),
        }
    }

    fn kotlin(advice: Vec<Advice>) -> ScriptRewriter {
        ScriptRewriter::new(AdviceSet::new(advice), AdvicePrinter::new(Dsl::Kotlin))
    }

    #[test]
    fn collects_declarations_in_document_order() {
        let src = "dependencies {\n    api(project(\":b\"))\n    implementation 'a:a:1'\n    someCall(1, 2)\n}\n";
        let parsed = parse::parse(src);
        let declarations = governed_declarations(&parsed, src);

        assert_eq!(declarations.len(), 2);
        assert_eq!(declarations[0].configuration, "api");
        assert_eq!(declarations[0].identifier, "\":b\"");
        assert_eq!(declarations[1].configuration, "implementation");
        assert_eq!(declarations[1].identifier, "'a:a:1'");
    }

    #[test]
    fn buildscript_declarations_are_not_governed() {
        let src = "buildscript {\n    dependencies {\n        classpath 'g:plugin:1'\n    }\n}\ndependencies {\n    api 'a:a:1'\n}\n";
        let parsed = parse::parse(src);
        let declarations = governed_declarations(&parsed, src);

        assert_eq!(declarations.len(), 1);
        assert_eq!(declarations[0].identifier, "'a:a:1'");
    }

    #[test]
    fn matcher_strips_quotes_and_respects_configuration() {
        let rewriter = kotlin(vec![remove("a:a:1", "implementation")]);
        let hit = DependencyDeclaration {
            configuration: "implementation".into(),
            identifier: "\"a:a:1\"".into(),
            statement_span: Span::new(0, 0),
            argument_span: Span::new(0, 0),
        };
        assert!(rewriter.find_advice(&hit).is_some());

        let wrong_configuration = DependencyDeclaration {
            configuration: "api".into(),
            ..hit.clone()
        };
        assert!(rewriter.find_advice(&wrong_configuration).is_none());
    }

    #[test]
    fn matcher_applies_reverse_mapping() {
        let rewriter = kotlin(vec![remove("com.acme:widget", "api")]).with_reverse_map(|raw| {
            if raw == "libs.widget" {
                "com.acme:widget".to_string()
            } else {
                raw.to_string()
            }
        });
        let declaration = DependencyDeclaration {
            configuration: "api".into(),
            identifier: "libs.widget".into(),
            statement_span: Span::new(0, 0),
            argument_span: Span::new(0, 0),
        };
        assert!(rewriter.find_advice(&declaration).is_some());
    }

    #[test]
    fn matcher_first_match_wins() {
        let rewriter = kotlin(vec![
            change(":b", "api", "compileOnly"),
            change(":b", "api", "runtimeOnly"),
        ]);
        let declaration = DependencyDeclaration {
            configuration: "api".into(),
            identifier: "\":b\"".into(),
            statement_span: Span::new(0, 0),
            argument_span: Span::new(0, 0),
        };
        match rewriter.find_advice(&declaration) {
            Some(Advice::Change {
                to_configuration, ..
            }) => assert_eq!(to_configuration, "compileOnly"),
            other => panic!("expected change advice, got {other:?}"),
        }
    }

    #[test]
    fn add_advice_never_matches_existing_declarations() {
        let rewriter = kotlin(vec![add("a:a:1", "implementation")]);
        let declaration = DependencyDeclaration {
            configuration: "implementation".into(),
            identifier: "\"a:a:1\"".into(),
            statement_span: Span::new(0, 0),
            argument_span: Span::new(0, 0),
        };
        assert!(rewriter.find_advice(&declaration).is_none());
    }

    #[test]
    fn empty_advice_is_identity() {
        let src = "plugins { id(\"java\") }\n\ndependencies {\n    api(project(\":b\")) // keep\n}\n";
        let rewriter = kotlin(vec![]);
        assert_eq!(rewriter.rewrite(src).unwrap(), src);
    }

    #[test]
    fn remove_deletes_whole_statement_with_lambda() {
        let src = "dependencies {\n    api(\"a:a:1\")\n    testImplementation(\"c:c:2\") { because(\"x\") }\n}\n";
        let rewriter = kotlin(vec![remove("c:c:2", "testImplementation")]);
        let out = rewriter.rewrite(src).unwrap();
        assert_eq!(out, "dependencies {\n    api(\"a:a:1\")\n}\n");
    }

    #[test]
    fn change_preserves_trailing_lambda() {
        let src = "dependencies {\n    testImplementation(\"c:c:2\") { because(\"x\") }\n}\n";
        let rewriter = kotlin(vec![change("c:c:2", "testImplementation", "implementation")]);
        let out = rewriter.rewrite(src).unwrap();
        assert_eq!(
            out,
            "dependencies {\n    implementation(\"c:c:2\") { because(\"x\") }\n}\n"
        );
    }

    #[test]
    fn add_appends_before_closing_brace() {
        let src = "dependencies {\n    api(\"a:a:1\")\n}\n";
        let rewriter = kotlin(vec![add(":d", "runtimeOnly")]);
        let out = rewriter.rewrite(src).unwrap();
        assert_eq!(
            out,
            "dependencies {\n    api(\"a:a:1\")\nruntimeOnly(project(\":d\"))\n}\n"
        );
    }

    #[test]
    fn bootstrap_block_is_never_rewritten() {
        let src = "buildscript {\n    dependencies {\n        classpath(\"g:plugin:1\")\n    }\n}\n";
        let rewriter = kotlin(vec![remove("g:plugin:1", "classpath")]);
        assert_eq!(rewriter.rewrite(src).unwrap(), src);
    }

    #[test]
    fn adds_are_not_appended_into_bootstrap_dependencies() {
        let src = "buildscript {\n    dependencies {\n        classpath(\"g:plugin:1\")\n    }\n}\n";
        let rewriter = kotlin(vec![add(":d", "runtimeOnly")]);
        let out = rewriter.rewrite(src).unwrap();
        // No governed block exists, so the block is synthesized at the end.
        assert_eq!(
            out,
            "buildscript {\n    dependencies {\n        classpath(\"g:plugin:1\")\n    }\n}\ndependencies {\nruntimeOnly(project(\":d\"))\n}\n"
        );
    }

    #[test]
    fn synthesizes_block_when_none_exists() {
        let src = "plugins { id(\"java\") }\n";
        let rewriter = kotlin(vec![add(":d", "runtimeOnly"), add("e:e:3", "implementation")]);
        let out = rewriter.rewrite(src).unwrap();
        assert_eq!(
            out,
            "plugins { id(\"java\") }\ndependencies {\nruntimeOnly(project(\":d\"))\nimplementation(\"e:e:3\")\n}\n"
        );
    }

    #[test]
    fn synthesized_block_starts_on_fresh_line() {
        let src = "plugins { id(\"java\") }";
        let rewriter = kotlin(vec![add(":d", "api")]);
        let out = rewriter.rewrite(src).unwrap();
        assert_eq!(
            out,
            "plugins { id(\"java\") }\ndependencies {\napi(project(\":d\"))\n}\n"
        );
    }

    #[test]
    fn parse_failure_refuses_to_rewrite() {
        let rewriter = kotlin(vec![]);
        let err = rewriter.rewrite("dependencies {\n").unwrap_err();
        let RewriteError::ParseFailure { diagnostics } = err;
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn unmatched_advice_is_a_noop() {
        let src = "dependencies {\n    api(\"a:a:1\")\n}\n";
        let rewriter = kotlin(vec![remove("zzz:zzz:9", "api")]);
        assert_eq!(rewriter.rewrite(src).unwrap(), src);
    }
}
