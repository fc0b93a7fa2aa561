// lexer.rs — Tokenizer for CZar `.cz` source files
//
// External collaborator per the language spec §1/§6 (named-interface-only):
// consumes a UTF-8 byte buffer, produces the token stream in §3's shape.
// Kept deliberately thin relative to the 21-pass core. Uses `logos` for
// DFA-based lexing, the same crate the rest of this codebase's toolchain
// reaches for.
//
// Preconditions: `source` is valid UTF-8.
// Postconditions: returns every token (including whitespace/comments, so
//   passes that care about original formatting can see them) plus a final
//   Eof token, and any lex errors (non-fatal, lexing continues past them).
// Failure modes: unrecognized characters produce `LexError`; never panics.
// Side effects: none.

use logos::Logos;

use crate::token::{InterpPayload, Token, TokenKind};

/// A lexer error with its 1-based location.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Result of lexing: tokens plus any errors (non-fatal).
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

const KEYWORDS: &[&str] = &[
    "mut", "const", "struct", "fn", "enum", "switch", "case", "default", "break", "continue",
    "return", "goto", "if", "else", "for", "true", "false", "void", "cast", "i8", "i16", "i32",
    "i64", "u8", "u16", "u32", "u64", "f32", "f64", "bool", "usize", "isize",
];

fn is_keyword(text: &str) -> bool {
    KEYWORDS.contains(&text)
}

// Raw lexical categories. Identifier/keyword disambiguation and
// interpolated-string detection happen in `lex()`, after the DFA match,
// since both depend on the matched text rather than the pattern alone.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum Lexeme {
    #[regex(r"//[^\n]*")]
    LineComment,
    #[regex(r"/\*([^*]|\*[^/])*\*/")]
    BlockComment,

    /// `#identifier` — preprocessor-like directive (§6): `#defer`, `#import`,
    /// `#alloc`, `#init`, `#assert`, `#log`, `#TODO`, `#FIXME`, `#FILE`,
    /// `#FUNCTION`, `#DEBUG`, `#line`, `#deprecated`, `#cast`, `#pragma`.
    #[regex(r"#[A-Za-z_][A-Za-z0-9_]*")]
    Preprocessor,

    #[regex(r#""([^"\\]|\\.)*""#)]
    StringLit,

    // Numeric literal. The second alternative (leading dot) exists so that
    // a range's second bound, `.9` in `0..9`, lexes as one Number token
    // rather than a dot followed by a malformed number — the quirk the
    // core's foreach pass (P18) depends on.
    #[regex(r"(?:[0-9]+(?:\.[0-9]+)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?")]
    Number,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Word,

    // ── Multi-char operators (must precede single-char alternatives so
    // logos' longest-match rule picks them) ──
    #[token("->")]
    Arrow,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("::")]
    ColonColon,
    #[token("??")]
    QQ,
    #[token("!!")]
    BangBang,

    // ── Single-char operators ──
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("!")]
    Bang,
    #[token("&")]
    Amp,
    #[token(".")]
    Dot,
    #[token("?")]
    Question,

    // ── Punctuation ──
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
}

fn classify(lexeme: &Lexeme, text: &str) -> (TokenKind, Option<InterpPayload>) {
    use Lexeme::*;
    match lexeme {
        LineComment | BlockComment => (TokenKind::Comment, None),
        Preprocessor => (TokenKind::Preprocessor, None),
        StringLit => {
            if let Some(payload) = parse_interpolation(text) {
                (TokenKind::InterpolatedString, Some(payload))
            } else {
                (TokenKind::String, None)
            }
        }
        Number => (TokenKind::Number, None),
        Word => {
            if is_keyword(text) {
                (TokenKind::Keyword, None)
            } else {
                (TokenKind::Identifier, None)
            }
        }
        Arrow | EqEq | NotEq | LtEq | GtEq | AndAnd | OrOr | ColonColon | QQ | BangBang | Plus
        | Minus | Star | Slash | Percent | Eq | Lt | Gt | Bang | Amp | Dot | Question => {
            (TokenKind::Operator, None)
        }
        LParen | RParen | LBrace | RBrace | LBracket | RBracket | Comma | Semi | Colon => {
            (TokenKind::Punctuation, None)
        }
    }
}

/// If `text` (a full string literal including quotes) contains `{expr}`
/// interpolation slots, split it into literal parts and expressions.
/// Returns `None` for a plain string with no `{`.
fn parse_interpolation(text: &str) -> Option<InterpPayload> {
    let inner = &text[1..text.len() - 1];
    if !inner.contains('{') {
        return None;
    }
    let mut parts = Vec::new();
    let mut exprs = Vec::new();
    let mut current = String::new();
    let mut chars = inner.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if c == '{' {
            parts.push(std::mem::take(&mut current));
            let mut expr = String::new();
            for (_, c2) in chars.by_ref() {
                if c2 == '}' {
                    break;
                }
                expr.push(c2);
            }
            exprs.push(expr);
        } else if c == '\\' {
            if let Some((_, esc)) = chars.next() {
                current.push(esc);
            }
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    Some(InterpPayload { parts, exprs })
}

/// Lex a CZar source string into tokens, terminated by an Eof marker.
pub fn lex(source: &str) -> LexResult {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    // Precompute byte-offset -> (line, column) via newline positions, so
    // every token carries a 1-based position per §3 even though logos
    // itself only tracks byte ranges.
    let line_starts = compute_line_starts(source);

    let lexer = Lexeme::lexer(source);
    for (result, range) in lexer.spanned() {
        let (line, column) = line_col(&line_starts, range.start);
        match result {
            Ok(lexeme) => {
                let text = &source[range.clone()];
                let (kind, interp) = classify(&lexeme, text);
                let mut token = Token::new(kind, text, line, column);
                token.interp = interp;
                tokens.push(token);
            }
            Err(()) => {
                errors.push(LexError {
                    line,
                    column,
                    message: format!("unexpected character: {:?}", &source[range]),
                });
            }
        }
    }

    let (eof_line, eof_col) = line_col(&line_starts, source.len());
    tokens.push(Token::eof(eof_line, eof_col));

    LexResult { tokens, errors }
}

fn compute_line_starts(source: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, b) in source.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

fn line_col(line_starts: &[usize], offset: usize) -> (usize, usize) {
    match line_starts.binary_search(&offset) {
        Ok(idx) => (idx + 1, 1),
        Err(idx) => {
            let line = idx;
            let col = offset - line_starts[line - 1] + 1;
            (line, col)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).tokens.into_iter().map(|t| t.kind).collect()
    }

    fn texts(source: &str) -> Vec<String> {
        lex(source).tokens.into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn keyword_vs_identifier() {
        let ks = kinds("mut i32 Vec2");
        assert_eq!(
            ks,
            vec![
                TokenKind::Keyword,
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn range_dot_splitting_on_digits() {
        let ts = texts("0..9");
        assert_eq!(ts, vec!["0", ".", ".9", ""]);
    }

    #[test]
    fn range_two_consecutive_dots_on_idents() {
        let ts = texts("start..end");
        assert_eq!(ts, vec!["start", ".", ".", "end", ""]);
    }

    #[test]
    fn interpolated_string_payload() {
        let result = lex(r#""x={x}, y={y}""#);
        let tok = &result.tokens[0];
        assert_eq!(tok.kind, TokenKind::InterpolatedString);
        let payload = tok.interp.as_ref().unwrap();
        assert_eq!(payload.parts, vec!["x=", ", y=", ""]);
        assert_eq!(payload.exprs, vec!["x", "y"]);
    }

    #[test]
    fn plain_string_has_no_payload() {
        let result = lex(r#""hello""#);
        assert_eq!(result.tokens[0].kind, TokenKind::String);
        assert!(result.tokens[0].interp.is_none());
    }

    #[test]
    fn preprocessor_directive() {
        let ts = texts("#defer { x(); }");
        assert_eq!(ts[0], "#defer");
    }

    #[test]
    fn error_recovery_on_bad_char() {
        let result = lex("a ~ b");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].message, "unexpected character: \"~\"");
    }

    #[test]
    fn multiline_block_comment_position() {
        let result = lex("a /* line1\nline2 */ b");
        // `b` should be on line 2.
        let b_tok = result
            .tokens
            .iter()
            .find(|t| t.text == "b")
            .expect("b token");
        assert_eq!(b_tok.line, 2);
    }

    #[test]
    fn trailing_eof_token() {
        let result = lex("x");
        assert_eq!(result.tokens.last().unwrap().kind, TokenKind::Eof);
    }
}
