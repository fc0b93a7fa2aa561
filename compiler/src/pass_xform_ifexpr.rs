// pass_xform_ifexpr.rs — P19: if-expression transform
//
// `if (c) a else b` in expression position — the token right after `)` is
// not `{` — rewrites to `(c) ? a : b` (language spec §4.3.11). A
// statement-form `if (c) { ... } else { ... }` is left untouched.
//
// Preconditions: P18 has run.
// Postconditions: no `if`/`else` pair in expression position remains; it
//   reads as a C ternary.
// Failure modes: none (a malformed expression-if with no matching `else`
//   before its enclosing boundary is left untouched).
// Side effects: mutates the tree.

use crate::scan::{matching_close, next_significant};
use crate::token::{Token, TokenKind};
use crate::tree::{apply_descending, Edit, Tree};

pub fn run(tree: &mut Tree) {
    let mut edits = Vec::new();
    {
        let tokens = &tree.tokens;
        let mut i = 0;
        while i < tokens.len() {
            if tokens[i].is_keyword("if") {
                if let Some((end, edit)) = try_rewrite(tokens, i) {
                    edits.push(edit);
                    i = end;
                    continue;
                }
            }
            i += 1;
        }
    }
    apply_descending(&mut tree.tokens, edits);
}

fn try_rewrite(tokens: &[Token], if_idx: usize) -> Option<(usize, Edit)> {
    let cond_open = next_significant(tokens, if_idx + 1).filter(|&p| tokens[p].is_punct("("))?;
    let cond_close = matching_close(tokens, cond_open)?;
    let a_start = next_significant(tokens, cond_close + 1)?;
    if tokens[a_start].is_punct("{") {
        return None; // statement-form if
    }

    let else_idx = find_boundary(tokens, a_start, &["else"])?;
    let b_start = next_significant(tokens, else_idx + 1)?;
    let b_end = find_boundary(tokens, b_start, &[";", ",", ")"])?;

    let line = tokens[if_idx].line;
    let col = tokens[if_idx].column;
    let mut out: Vec<Token> = (cond_open..=cond_close)
        .filter(|&i| !tokens[i].is_elided())
        .map(|i| tokens[i].clone())
        .collect();
    out.push(Token::new(TokenKind::Operator, "?", line, col));
    out.extend(
        (a_start..else_idx)
            .filter(|&i| !tokens[i].is_elided() && tokens[i].kind != TokenKind::Comment)
            .map(|i| tokens[i].clone()),
    );
    out.push(Token::new(TokenKind::Punctuation, ":", line, col));
    out.extend(
        (b_start..b_end)
            .filter(|&i| !tokens[i].is_elided() && tokens[i].kind != TokenKind::Comment)
            .map(|i| tokens[i].clone()),
    );

    Some((b_end, Edit::replace(if_idx, b_end - if_idx, out)))
}

/// Scan forward from `start` at bracket depth 0 for the first token whose
/// (kind, text) is `Keyword`-or-`Punctuation` matching one of `markers`.
/// Returns its index, or `None` if the span closes (a depth-0 `)`/`;`/`,`
/// not itself in `markers`) before any marker is found.
fn find_boundary(tokens: &[Token], start: usize, markers: &[&str]) -> Option<usize> {
    let mut depth = 0i32;
    let mut i = start;
    while i < tokens.len() {
        let t = &tokens[i];
        if t.is_elided() {
            i += 1;
            continue;
        }
        if t.kind == TokenKind::Punctuation {
            match t.text.as_str() {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => depth -= 1,
                _ => {}
            }
        }
        if depth == 0 && markers.contains(&t.text.as_str()) {
            return Some(i);
        }
        if depth < 0 {
            return None;
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn transpiled(src: &str) -> String {
        let mut tree = Tree::new(lex(src).tokens);
        run(&mut tree);
        tree.tokens
            .iter()
            .filter(|t| !t.is_elided() && t.kind != TokenKind::Eof)
            .map(|t| t.text.clone())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn expression_if_becomes_ternary() {
        let out = transpiled("fn f(bool c) -> i32 { i32 x = if (c) 1 else 2; return x; }");
        assert!(out.contains("x = ( c ) ? 1 : 2 ;"), "{out}");
        assert!(!out.contains("if"));
        assert!(!out.contains("else"));
    }

    #[test]
    fn statement_if_is_untouched() {
        let out = transpiled("fn f(bool c) -> void { if (c) { g(); } else { h(); } }");
        assert!(out.contains("if ( c ) { g ( ) ; } else { h ( ) ; }"), "{out}");
    }

    #[test]
    fn nested_in_call_argument_stops_at_enclosing_paren() {
        let out = transpiled("fn f(bool c) -> void { g(if (c) 1 else 2, 3); }");
        assert!(out.contains("g ( ( c ) ? 1 : 2 , 3 ) ;"), "{out}");
    }
}
