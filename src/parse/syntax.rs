//! Concrete syntax types for parsed build scripts.
//!
//! The tree is deliberately shallow: the rewriter only needs block structure,
//! call statements of the dependency-declaration shape, and byte spans. Every
//! other construct is carried as an opaque span so the original text survives
//! rendering untouched.

use std::fmt;

/// A pair of byte offsets delimiting a contiguous region of source text.
/// `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// One statement of the script.
#[derive(Debug, Clone)]
pub enum Statement {
    /// `name { ... }` - a configuration block with parsed contents.
    Block(Block),
    /// `name(args)` / `name args`, optionally with a trailing lambda.
    Call(CallStatement),
    /// Anything else, consumed blindly with balanced delimiters.
    Opaque(Span),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Block(b) => b.span,
            Statement::Call(c) => c.span,
            Statement::Opaque(span) => *span,
        }
    }
}

/// `name { statements }`. The braces are recorded separately so the rewriter
/// can insert immediately before the closing delimiter.
#[derive(Debug, Clone)]
pub struct Block {
    pub name: String,
    pub name_span: Span,
    /// Byte position of the opening `{`.
    pub open_brace: usize,
    /// Byte position of the closing `}`. Points at end of input when the
    /// closing brace is missing (a diagnostic is recorded in that case).
    pub close_brace: usize,
    pub statements: Vec<Statement>,
    pub span: Span,
}

/// A call-shaped statement: `callee(args)` or the Groovy paren-less form
/// `callee arg`.
#[derive(Debug, Clone)]
pub struct CallStatement {
    pub callee: String,
    pub callee_span: Span,
    pub args: Vec<Expr>,
    /// Statement start through the end of the argument list (closing paren,
    /// or the last argument token in the paren-less form). Excludes any
    /// trailing lambda.
    pub call_span: Span,
    /// Full statement span, trailing lambda included.
    pub span: Span,
    pub has_lambda: bool,
}

/// A shallowly-parsed call argument.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A quoted string literal; the span includes the quotes.
    Str { raw: Span },
    /// `project("...")` / `project('...')`; `path` is the quoted string span.
    ProjectCall { raw: Span, path: Span },
    /// Any other expression, consumed with balanced delimiters.
    Other { span: Span },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Str { raw } => *raw,
            Expr::ProjectCall { raw, .. } => *raw,
            Expr::Other { span } => *span,
        }
    }
}

/// A non-fatal parse problem. The parser keeps going; the rewriter refuses to
/// render while any of these exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    /// 1-based.
    pub line: usize,
    /// 1-based.
    pub column: usize,
}

impl Diagnostic {
    pub fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_col(source, offset);
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

/// 1-based line and column for a byte offset.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source[..offset];
    let line = before.bytes().filter(|b| *b == b'\n').count() + 1;
    let column = before
        .rfind('\n')
        .map(|pos| offset - pos)
        .unwrap_or(offset + 1);
    (line, column)
}

/// Result of parsing one script: the statement list, everything the parser
/// could not make sense of, and the end-of-script position used for
/// whole-script synthesis.
#[derive(Debug, Clone)]
pub struct Parse {
    pub statements: Vec<Statement>,
    pub diagnostics: Vec<Diagnostic>,
    pub end_pos: usize,
}

impl Parse {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}
