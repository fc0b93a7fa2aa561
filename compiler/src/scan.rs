// scan.rs — Shared token-scanning helpers for passes
//
// Every pass scans the same flat token vector; these helpers factor out the
// bookkeeping that would otherwise be duplicated in all 21 of them:
// skipping insignificant tokens (whitespace/comments), finding a matching
// delimiter, and locating the enclosing function name for a diagnostic.
//
// Preconditions: `tokens` is well-nested (guaranteed by `parser::parse`).
// Postconditions: none beyond what each function documents.
// Failure modes: `matching_close` returns `None` on malformed input rather
//   than panicking — passes run after `parser::parse` has already verified
//   nesting, so `None` here would indicate an internal inconsistency.
// Side effects: none.

use crate::token::{Token, TokenKind};

/// True for token kinds a pass should skip when looking for the "next
/// meaningful" token (whitespace doesn't exist as emitted text here since
/// the lexer doesn't retain it, but comments do).
pub fn is_insignificant(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Comment | TokenKind::Whitespace)
}

/// Index of the next significant token at or after `from`, or `None` past
/// the end.
pub fn next_significant(tokens: &[Token], from: usize) -> Option<usize> {
    (from..tokens.len()).find(|&i| !is_insignificant(tokens[i].kind) && !tokens[i].is_elided())
}

/// Index of the previous significant token at or before `from`, or `None`
/// at the start.
pub fn prev_significant(tokens: &[Token], from: usize) -> Option<usize> {
    (0..=from)
        .rev()
        .find(|&i| !is_insignificant(tokens[i].kind) && !tokens[i].is_elided())
}

/// Given the index of an opening delimiter (`(`, `{`, `[`), return the
/// index of its matching closing delimiter.
pub fn matching_close(tokens: &[Token], open_idx: usize) -> Option<usize> {
    let open_text = tokens[open_idx].text.as_str();
    let close_text = match open_text {
        "(" => ")",
        "{" => "}",
        "[" => "]",
        _ => return None,
    };
    let mut depth = 0i32;
    for (i, tok) in tokens.iter().enumerate().skip(open_idx) {
        if tok.kind != TokenKind::Punctuation {
            continue;
        }
        if tok.text == open_text {
            depth += 1;
        } else if tok.text == close_text {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Walk backward from `idx` to find the name of the innermost enclosing
/// `fn <name>(...)` declaration, for diagnostics' `WARNING in <func>()`
/// format. Best-effort: returns `None` at top level.
pub fn enclosing_function(tokens: &[Token], idx: usize) -> Option<String> {
    let mut depth = 0i32;
    let mut i = idx;
    loop {
        if i == 0 {
            return None;
        }
        i -= 1;
        let tok = &tokens[i];
        if tok.kind == TokenKind::Punctuation {
            match tok.text.as_str() {
                "}" => depth += 1,
                "{" => {
                    if depth == 0 {
                        // This `{` might open the function body we're inside.
                        if let Some(name) = fn_name_before_brace(tokens, i) {
                            return Some(name);
                        }
                    } else {
                        depth -= 1;
                    }
                }
                _ => {}
            }
        }
    }
}

fn fn_name_before_brace(tokens: &[Token], brace_idx: usize) -> Option<String> {
    // Walk back over `-> RetType` and `(params)` to the `fn` keyword,
    // then the identifier right after it is the function name.
    let close_paren = (0..brace_idx).rev().find(|&i| tokens[i].is_punct(")"))?;
    let open_paren = (0..close_paren)
        .rev()
        .find(|&i| tokens[i].is_punct("(") && matching_close(tokens, i) == Some(close_paren))?;
    let name_idx = prev_significant(tokens, open_paren.saturating_sub(1))?;
    if tokens[name_idx].kind != TokenKind::Identifier {
        return None;
    }
    let fn_idx = prev_significant(tokens, name_idx.saturating_sub(1))?;
    if tokens[fn_idx].is_keyword("fn") {
        Some(tokens[name_idx].text.clone())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    #[test]
    fn matching_close_finds_nested_braces() {
        let tokens = lex("{ a { b } c }").tokens;
        let open = tokens.iter().position(|t| t.is_punct("{")).unwrap();
        let close = matching_close(&tokens, open).unwrap();
        assert_eq!(tokens[close].text, "}");
        // The outer brace's close should be the *last* brace, not the inner one.
        assert!(close > tokens.iter().position(|t| t.text == "b").unwrap());
    }

    #[test]
    fn enclosing_function_finds_name() {
        let tokens = lex("fn add(i32 a, i32 b) -> i32 { return a + b; }").tokens;
        let return_idx = tokens.iter().position(|t| t.is_keyword("return")).unwrap();
        assert_eq!(
            enclosing_function(&tokens, return_idx),
            Some("add".to_string())
        );
    }

    #[test]
    fn enclosing_function_none_at_top_level() {
        let tokens = lex("struct Vec2 { i32 x; }").tokens;
        assert_eq!(enclosing_function(&tokens, 1), None);
    }
}
