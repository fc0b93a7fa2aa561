// token.rs — Token type shared by every pass
//
// A token's `kind` may change across passes (e.g. an identifier retyped as
// punctuation when elided to `;`); `text` is owned and freely mutable; empty
// text means "elided" rather than "never existed" — elided tokens still
// occupy a tree position so earlier passes' span arithmetic stays valid.
//
// Preconditions: none (data-only module).
// Postconditions: none.
// Failure modes: none.
// Side effects: none.

use std::fmt;

/// Lexical category of a token, per the CZar language spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Number,
    String,
    InterpolatedString,
    Operator,
    Punctuation,
    Whitespace,
    Comment,
    Preprocessor,
    Eof,
}

/// Payload for an interpolated string literal: `"x={x}, y={y}"`.
///
/// `parts` holds the literal text segments (one more than `exprs`);
/// `exprs` holds the raw source text of each `{...}` slot in order.
/// Consumed only by the format-subsystem lowering in the runtime writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpPayload {
    pub parts: Vec<String>,
    pub exprs: Vec<String>,
}

/// A single lexeme with its exact source text and 1-based position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
    pub interp: Option<InterpPayload>,
    /// True for a token a pass generated rather than one the lexer produced
    /// from source bytes. Some passes write tokens whose text coincides
    /// with a CZar keyword a *later* pass would otherwise flag as
    /// user-written (P9's `const` receiver is the motivating case for
    /// P16's `reject_user_const`) — this bit lets that later pass tell the
    /// two apart without tracking per-pass provenance more heavily.
    pub synthetic: bool,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            column,
            interp: None,
            synthetic: false,
        }
    }

    /// Mark this token as pass-generated rather than lexed from source.
    pub fn mark_synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    /// True once this token's text has been blanked out by a pass.
    pub fn is_elided(&self) -> bool {
        self.text.is_empty()
    }

    /// Blank this token's text in place; used by passes that remove syntax
    /// without shifting every later token's logical position.
    pub fn elide(&mut self) {
        self.text.clear();
    }

    /// Synthesize an Eof marker token at the given position.
    pub fn eof(line: usize, column: usize) -> Self {
        Self::new(TokenKind::Eof, "", line, column)
    }

    pub fn is_ident(&self, name: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == name
    }

    pub fn is_keyword(&self, name: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == name
    }

    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punctuation && self.text == text
    }

    pub fn is_op(&self, text: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == text
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elide_clears_text_but_keeps_position() {
        let mut t = Token::new(TokenKind::Keyword, "const", 4, 2);
        t.elide();
        assert!(t.is_elided());
        assert_eq!(t.line, 4);
        assert_eq!(t.column, 2);
    }

    #[test]
    fn predicate_helpers() {
        let t = Token::new(TokenKind::Keyword, "mut", 1, 1);
        assert!(t.is_keyword("mut"));
        assert!(!t.is_ident("mut"));
    }
}
