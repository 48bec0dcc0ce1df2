//! Tokenizer for Groovy and Kotlin DSL build scripts.
//!
//! Comments and horizontal whitespace are skipped; newlines are significant
//! (they terminate statements) and are emitted as tokens. Anything the lexer
//! does not classify becomes a single-character `Other` token - the parser
//! treats runs of those as opaque source.

use crate::parse::syntax::{Diagnostic, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    /// Quoted string literal, quotes included in the span. Single, double,
    /// and triple-quoted forms.
    Str,
    Number,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Semi,
    Newline,
    Other,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }
}

/// Tokenize `source`. Lexical problems (unterminated strings or block
/// comments) are recorded as diagnostics rather than aborting; the offending
/// run is consumed to end of input so the token stream stays well-formed.
pub fn tokenize(source: &str, diagnostics: &mut Vec<Diagnostic>) -> Vec<Token> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let start = pos;
        let b = bytes[pos];

        match b {
            b' ' | b'\t' => {
                pos += 1;
            }
            b'\r' | b'\n' => {
                if b == b'\r' && bytes.get(pos + 1) == Some(&b'\n') {
                    pos += 2;
                } else {
                    pos += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Newline,
                    span: Span::new(start, pos),
                });
            }
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                while pos < bytes.len() && bytes[pos] != b'\n' {
                    pos += 1;
                }
            }
            b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                match find_subslice(bytes, pos + 2, b"*/") {
                    Some(close) => pos = close + 2,
                    None => {
                        diagnostics.push(Diagnostic::at(source, start, "unterminated comment"));
                        pos = bytes.len();
                    }
                }
            }
            b'\'' | b'"' => {
                pos = lex_string(source, pos, diagnostics);
                tokens.push(Token {
                    kind: TokenKind::Str,
                    span: Span::new(start, pos),
                });
            }
            b'{' | b'}' | b'(' | b')' | b'[' | b']' | b',' | b'.' | b';' => {
                pos += 1;
                let kind = match b {
                    b'{' => TokenKind::LBrace,
                    b'}' => TokenKind::RBrace,
                    b'(' => TokenKind::LParen,
                    b')' => TokenKind::RParen,
                    b'[' => TokenKind::LBracket,
                    b']' => TokenKind::RBracket,
                    b',' => TokenKind::Comma,
                    b'.' => TokenKind::Dot,
                    _ => TokenKind::Semi,
                };
                tokens.push(Token {
                    kind,
                    span: Span::new(start, pos),
                });
            }
            b'0'..=b'9' => {
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    pos += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Number,
                    span: Span::new(start, pos),
                });
            }
            _ if is_ident_start(b) => {
                while pos < bytes.len() && is_ident_continue(bytes[pos]) {
                    pos += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Ident,
                    span: Span::new(start, pos),
                });
            }
            _ => {
                // Advance one whole UTF-8 scalar, not one byte.
                let ch_len = source[pos..].chars().next().map(char::len_utf8).unwrap_or(1);
                pos += ch_len;
                tokens.push(Token {
                    kind: TokenKind::Other,
                    span: Span::new(start, pos),
                });
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(bytes.len(), bytes.len()),
    });
    tokens
}

/// Consume a string literal starting at `pos` (which sits on the opening
/// quote). Returns the position just past the closing quote. Handles `'`,
/// `"`, and the triple-quoted forms; backslash escapes the next character.
fn lex_string(source: &str, pos: usize, diagnostics: &mut Vec<Diagnostic>) -> usize {
    let bytes = source.as_bytes();
    let quote = bytes[pos];
    let triple = bytes.get(pos + 1) == Some(&quote) && bytes.get(pos + 2) == Some(&quote);

    if triple {
        let delim = [quote, quote, quote];
        match find_subslice(bytes, pos + 3, &delim) {
            Some(close) => return close + 3,
            None => {
                diagnostics.push(Diagnostic::at(source, pos, "unterminated string"));
                return bytes.len();
            }
        }
    }

    let mut cursor = pos + 1;
    while cursor < bytes.len() {
        match bytes[cursor] {
            b'\\' => cursor += 2,
            b'\n' => break,
            b if b == quote => return cursor + 1,
            _ => cursor += 1,
        }
    }

    diagnostics.push(Diagnostic::at(source, pos, "unterminated string"));
    cursor.min(bytes.len())
}

fn find_subslice(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| from + i)
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut diags = Vec::new();
        tokenize(source, &mut diags)
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_call_with_string() {
        assert_eq!(
            kinds("implementation(\"a:a:1\")"),
            vec![
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Str,
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_span_includes_quotes() {
        let src = "x 'a:b:1'";
        let mut diags = Vec::new();
        let tokens = tokenize(src, &mut diags);
        assert_eq!(tokens[1].kind, TokenKind::Str);
        assert_eq!(tokens[1].text(src), "'a:b:1'");
        assert!(diags.is_empty());
    }

    #[test]
    fn newlines_are_tokens_comments_are_not() {
        assert_eq!(
            kinds("a // trailing\nb /* inline */ c"),
            vec![
                TokenKind::Ident,
                TokenKind::Newline,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn crlf_is_one_newline_token() {
        let src = "a\r\nb";
        let mut diags = Vec::new();
        let tokens = tokenize(src, &mut diags);
        assert_eq!(tokens[1].kind, TokenKind::Newline);
        assert_eq!(tokens[1].span, Span::new(1, 3));
    }

    #[test]
    fn escaped_quote_stays_inside_string() {
        let src = r#"x "a\"b""#;
        let mut diags = Vec::new();
        let tokens = tokenize(src, &mut diags);
        assert_eq!(tokens[1].text(src), r#""a\"b""#);
        assert!(diags.is_empty());
    }

    #[test]
    fn triple_quoted_string() {
        let src = "x \"\"\"multi\nline\"\"\" y";
        let mut diags = Vec::new();
        let tokens = tokenize(src, &mut diags);
        assert_eq!(tokens[1].kind, TokenKind::Str);
        assert_eq!(tokens[1].text(src), "\"\"\"multi\nline\"\"\"");
        assert_eq!(tokens[2].kind, TokenKind::Ident);
        assert!(diags.is_empty());
    }

    #[test]
    fn unterminated_string_is_diagnosed() {
        let mut diags = Vec::new();
        tokenize("x 'oops", &mut diags);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("unterminated string"));
    }

    #[test]
    fn unterminated_comment_is_diagnosed() {
        let mut diags = Vec::new();
        tokenize("a /* never closed", &mut diags);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("unterminated comment"));
    }

    #[test]
    fn multibyte_other_token_advances_whole_char() {
        let mut diags = Vec::new();
        let tokens = tokenize("a → b", &mut diags);
        assert_eq!(tokens.len(), 4); // ident, other, ident, eof
        assert!(diags.is_empty());
    }
}
