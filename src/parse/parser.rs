//! Lenient recursive-descent parser for build scripts.
//!
//! The grammar recognized here is the statement/block/call skeleton shared by
//! the Groovy and Kotlin build DSLs. Constructs outside that skeleton are
//! consumed as opaque statements with balanced delimiters. Structural problems
//! (missing `}` or `)`, stray `}`) become diagnostics; parsing always runs to
//! the end of input.

use crate::parse::lexer::{tokenize, Token, TokenKind};
use crate::parse::syntax::{Block, CallStatement, Diagnostic, Expr, Parse, Span, Statement};

/// Parse `source` into a statement list plus non-fatal diagnostics.
pub fn parse(source: &str) -> Parse {
    let mut diagnostics = Vec::new();
    let tokens = tokenize(source, &mut diagnostics);
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        diagnostics,
    };

    let statements = parser.parse_statements(false);
    Parse {
        statements,
        diagnostics: parser.diagnostics,
        end_pos: source.len(),
    }
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Token {
        self.tokens[self.pos]
    }

    fn peek_at(&self, offset: usize) -> Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        self.tokens[idx]
    }

    fn bump(&mut self) -> Token {
        let tok = self.tokens[self.pos];
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek().kind, TokenKind::Newline | TokenKind::Semi) {
            self.bump();
        }
    }

    fn skip_newlines(&mut self) {
        while self.peek().kind == TokenKind::Newline {
            self.bump();
        }
    }

    fn diagnose(&mut self, offset: usize, message: &str) {
        self.diagnostics
            .push(Diagnostic::at(self.source, offset, message));
    }

    /// Parse statements until end of input, or until a closing `}` when
    /// `inside_block` is set (the brace is left for the caller).
    fn parse_statements(&mut self, inside_block: bool) -> Vec<Statement> {
        let mut statements = Vec::new();
        loop {
            self.skip_separators();
            match self.peek().kind {
                TokenKind::Eof => {
                    break;
                }
                TokenKind::RBrace if inside_block => break,
                TokenKind::RBrace => {
                    let tok = self.bump();
                    self.diagnose(tok.span.start, "unexpected '}'");
                }
                _ => statements.push(self.parse_statement()),
            }
        }
        statements
    }

    fn parse_statement(&mut self) -> Statement {
        let first = self.peek();
        if first.kind == TokenKind::Ident {
            match self.peek_at(1).kind {
                TokenKind::LBrace => return Statement::Block(self.parse_block()),
                TokenKind::LParen => return Statement::Call(self.parse_paren_call()),
                TokenKind::Str => return Statement::Call(self.parse_parenless_call()),
                TokenKind::Ident if self.peek_at(2).kind == TokenKind::LParen => {
                    return Statement::Call(self.parse_parenless_call());
                }
                _ => {}
            }
        }
        Statement::Opaque(self.parse_opaque())
    }

    fn parse_block(&mut self) -> Block {
        let name_tok = self.bump();
        let name = name_tok.text(self.source).to_string();
        let open_tok = self.bump();
        debug_assert_eq!(open_tok.kind, TokenKind::LBrace);

        let statements = self.parse_statements(true);

        let (close_brace, end) = if self.peek().kind == TokenKind::RBrace {
            let close_tok = self.bump();
            (close_tok.span.start, close_tok.span.end)
        } else {
            self.diagnose(open_tok.span.start, "missing '}'");
            (self.source.len(), self.source.len())
        };

        Block {
            name,
            name_span: name_tok.span,
            open_brace: open_tok.span.start,
            close_brace,
            statements,
            span: Span::new(name_tok.span.start, end),
        }
    }

    /// `callee(args...)` with an optional trailing lambda.
    fn parse_paren_call(&mut self) -> CallStatement {
        let callee_tok = self.bump();
        let lparen = self.bump();
        debug_assert_eq!(lparen.kind, TokenKind::LParen);

        let mut args = Vec::new();
        let mut call_end = lparen.span.end;
        loop {
            self.skip_newlines();
            match self.peek().kind {
                TokenKind::RParen => {
                    call_end = self.bump().span.end;
                    break;
                }
                TokenKind::Eof => {
                    self.diagnose(lparen.span.start, "missing ')'");
                    break;
                }
                TokenKind::RBrace | TokenKind::RBracket => {
                    self.diagnose(lparen.span.start, "missing ')'");
                    break;
                }
                TokenKind::Comma | TokenKind::Semi => {
                    self.bump();
                }
                _ => args.push(self.parse_arg_expr()),
            }
        }

        let mut end = call_end;
        let mut has_lambda = false;
        if self.peek().kind == TokenKind::LBrace {
            end = self.consume_balanced_braces();
            has_lambda = true;
        }

        CallStatement {
            callee: callee_tok.text(self.source).to_string(),
            callee_span: callee_tok.span,
            args,
            call_span: Span::new(callee_tok.span.start, call_end),
            span: Span::new(callee_tok.span.start, end),
            has_lambda,
        }
    }

    /// Groovy paren-less form: `callee 'coordinate'` or `callee project(':p')`,
    /// with an optional trailing lambda.
    fn parse_parenless_call(&mut self) -> CallStatement {
        let callee_tok = self.bump();

        let mut args = Vec::new();
        let mut args_end = callee_tok.span.end;
        loop {
            match self.peek().kind {
                TokenKind::Newline
                | TokenKind::Semi
                | TokenKind::RBrace
                | TokenKind::LBrace
                | TokenKind::Eof => break,
                // Stray closers are swallowed, as in opaque statements.
                TokenKind::Comma | TokenKind::RParen | TokenKind::RBracket => {
                    self.bump();
                }
                _ => {
                    let expr = self.parse_arg_expr();
                    args_end = expr.span().end;
                    args.push(expr);
                }
            }
        }

        let mut end = args_end;
        let mut has_lambda = false;
        if self.peek().kind == TokenKind::LBrace {
            end = self.consume_balanced_braces();
            has_lambda = true;
        }

        CallStatement {
            callee: callee_tok.text(self.source).to_string(),
            callee_span: callee_tok.span,
            args,
            call_span: Span::new(callee_tok.span.start, args_end),
            span: Span::new(callee_tok.span.start, end),
            has_lambda,
        }
    }

    /// One call argument, shallowly classified. Only the shapes the rewriter
    /// cares about are distinguished; everything else is an `Expr::Other`.
    fn parse_arg_expr(&mut self) -> Expr {
        let save = self.pos;

        if self.peek().kind == TokenKind::Str {
            let tok = self.bump();
            if self.at_expr_end() {
                return Expr::Str { raw: tok.span };
            }
            self.pos = save;
        }

        if self.peek().kind == TokenKind::Ident
            && self.peek().text(self.source) == "project"
            && self.peek_at(1).kind == TokenKind::LParen
        {
            if let Some(expr) = self.try_project_expr() {
                return expr;
            }
            self.pos = save;
        }

        self.parse_other_expr()
    }

    /// `project("...")` with exactly one string argument.
    fn try_project_expr(&mut self) -> Option<Expr> {
        let ident = self.bump();
        self.bump(); // '('
        self.skip_newlines();
        if self.peek().kind != TokenKind::Str {
            return None;
        }
        let path = self.bump();
        self.skip_newlines();
        if self.peek().kind != TokenKind::RParen {
            return None;
        }
        let rparen = self.bump();
        if !self.at_expr_end() {
            return None;
        }
        Some(Expr::ProjectCall {
            raw: Span::new(ident.span.start, rparen.span.end),
            path: path.span,
        })
    }

    /// True when the cursor sits where an argument may legitimately end:
    /// an argument separator, any closing context, or end of line/input.
    fn at_expr_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Comma
                | TokenKind::RParen
                | TokenKind::RBrace
                | TokenKind::Newline
                | TokenKind::Semi
                | TokenKind::LBrace
                | TokenKind::Eof
        )
    }

    /// Consume an unrecognized expression with balanced delimiters, stopping
    /// at an argument boundary.
    fn parse_other_expr(&mut self) -> Expr {
        let start = self.peek().span.start;
        let mut end = start;
        let mut depth = 0usize;
        loop {
            let tok = self.peek();
            match tok.kind {
                TokenKind::Eof => break,
                TokenKind::Comma | TokenKind::Newline | TokenKind::Semi if depth == 0 => break,
                TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket if depth == 0 => break,
                TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => {
                    depth += 1;
                    end = self.bump().span.end;
                }
                TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket => {
                    depth -= 1;
                    end = self.bump().span.end;
                }
                _ => end = self.bump().span.end,
            }
        }
        Expr::Other {
            span: Span::new(start, end),
        }
    }

    /// Trailing configuration lambda. Contents are not modeled; the span is
    /// consumed with balanced braces. Returns the end position.
    fn consume_balanced_braces(&mut self) -> usize {
        let open = self.bump();
        debug_assert_eq!(open.kind, TokenKind::LBrace);
        let mut depth = 1usize;
        let mut end = open.span.end;
        loop {
            let tok = self.peek();
            match tok.kind {
                TokenKind::Eof => {
                    self.diagnose(open.span.start, "missing '}'");
                    break;
                }
                TokenKind::LBrace => {
                    depth += 1;
                    end = self.bump().span.end;
                }
                TokenKind::RBrace => {
                    depth -= 1;
                    end = self.bump().span.end;
                    if depth == 0 {
                        break;
                    }
                }
                _ => end = self.bump().span.end,
            }
        }
        end
    }

    /// Anything that is not a block or a recognizable call: consume to the
    /// end of the statement with balanced delimiters. Stray closers at depth
    /// zero are swallowed so the parser always makes progress.
    fn parse_opaque(&mut self) -> Span {
        let start = self.peek().span.start;
        let mut end = start;
        let mut depth = 0usize;
        loop {
            let tok = self.peek();
            match tok.kind {
                TokenKind::Eof => break,
                TokenKind::Newline | TokenKind::Semi if depth == 0 => break,
                TokenKind::RBrace if depth == 0 => break,
                TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => {
                    depth += 1;
                    end = self.bump().span.end;
                }
                TokenKind::RBrace | TokenKind::RBracket if depth > 0 => {
                    depth -= 1;
                    end = self.bump().span.end;
                }
                TokenKind::RParen if depth > 0 => {
                    depth -= 1;
                    end = self.bump().span.end;
                }
                _ => end = self.bump().span.end,
            }
        }
        Span::new(start, end)
    }
}
