// parser.rs — Token stream to translation-unit tree
//
// External collaborator per the language spec §1/§6. Because the tree is
// flat by design (§3), "parsing" here is the degenerate case of wrapping
// the lexer's output into a `Tree` — there is no grammar and no recursive
// descent. The one real responsibility kept here: catching gross
// structural errors (unbalanced delimiters) before the pass pipeline runs,
// since every later pass assumes a well-nested stream when it scans for a
// matching close-delimiter.
//
// Preconditions: `tokens` ends with an Eof token (as `lexer::lex` produces).
// Postconditions: on success, returns a `Tree` with the same tokens in the
//   same order (non-code kinds retained, so later passes can see original
//   formatting if they need to).
// Failure modes: unbalanced `(`/`)`, `{`/`}`, `[`/`]` produce a `ParseError`.
// Side effects: none.

use crate::token::{Token, TokenKind};
use crate::tree::Tree;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delim {
    Paren,
    Brace,
    Bracket,
}

impl Delim {
    fn closing_text(self) -> &'static str {
        match self {
            Delim::Paren => ")",
            Delim::Brace => "}",
            Delim::Bracket => "]",
        }
    }

    fn opening_text(self) -> &'static str {
        match self {
            Delim::Paren => "(",
            Delim::Brace => "{",
            Delim::Bracket => "[",
        }
    }
}

/// Build a `Tree` from a token stream, verifying delimiter nesting.
pub fn parse(tokens: Vec<Token>) -> Result<Tree, ParseError> {
    let mut stack: Vec<(Delim, &Token)> = Vec::new();
    for token in &tokens {
        if token.kind != TokenKind::Punctuation {
            continue;
        }
        match token.text.as_str() {
            "(" => stack.push((Delim::Paren, token)),
            "{" => stack.push((Delim::Brace, token)),
            "[" => stack.push((Delim::Bracket, token)),
            ")" | "}" | "]" => {
                let expected = match token.text.as_str() {
                    ")" => Delim::Paren,
                    "}" => Delim::Brace,
                    _ => Delim::Bracket,
                };
                match stack.pop() {
                    Some((open, _)) if open == expected => {}
                    Some((open, open_tok)) => {
                        return Err(ParseError {
                            line: open_tok.line,
                            column: open_tok.column,
                            message: format!(
                                "'{}' opened here is never closed before '{}' at {}:{}",
                                open.opening_text(),
                                token.text,
                                token.line,
                                token.column
                            ),
                        });
                    }
                    None => {
                        return Err(ParseError {
                            line: token.line,
                            column: token.column,
                            message: format!("unmatched closing '{}'", token.text),
                        });
                    }
                }
            }
            _ => {}
        }
    }
    if let Some((open, open_tok)) = stack.last() {
        return Err(ParseError {
            line: open_tok.line,
            column: open_tok.column,
            message: format!(
                "unclosed '{}', expected matching '{}'",
                open.opening_text(),
                open.closing_text()
            ),
        });
    }
    Ok(Tree::new(tokens))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    #[test]
    fn balanced_delimiters_parse() {
        let tokens = lex("fn f() -> void { if (a) { b(); } }").tokens;
        assert!(parse(tokens).is_ok());
    }

    #[test]
    fn unclosed_brace_errors() {
        let tokens = lex("fn f() -> void { if (a) { b();").tokens;
        let err = parse(tokens).unwrap_err();
        assert!(err.message.contains("unclosed"));
    }

    #[test]
    fn mismatched_delimiters_error() {
        let tokens = lex("fn f(a: i32] -> void {}").tokens;
        let err = parse(tokens).unwrap_err();
        assert!(err.message.contains("never closed") || err.message.contains("unclosed"));
    }

    #[test]
    fn unmatched_close_errors() {
        let tokens = lex("fn f() -> void { } }").tokens;
        let err = parse(tokens).unwrap_err();
        assert!(err.message.contains("unmatched closing"));
    }
}
