//! Build-script parsing: lexer, lenient recursive-descent parser, and the
//! shallow concrete syntax tree the rewriter walks.

pub mod lexer;
pub mod parser;
pub mod syntax;

pub use parser::parse;
pub use syntax::{Block, CallStatement, Diagnostic, Expr, Parse, Span, Statement};
