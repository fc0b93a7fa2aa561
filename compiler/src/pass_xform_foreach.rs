// pass_xform_foreach.rs — P18: foreach-range transform
//
// `for (T v : start..end) { ... }` lowers to the classic
// `for (mut T v = start; v <= end; v++) { ... }` (language spec §4.3.10);
// the loop variable must be mutable, so the generated header hand-writes
// `mut` directly rather than going through P16 (which already ran and
// never touches this header — see its own test documenting that).
//
// Because of a lexer quirk, `0..9` after a numeric `start` arrives as
// three tokens (`0`, `.`, `.9`): the middle `.` is a lone operator and the
// trailing `.9` is itself a number token carrying the leading dot. When
// `start` is not numeric (a variable), both dots lex as separate operator
// tokens and `end` is its own token.
//
// Preconditions: P17 has run.
// Postconditions: no `T v : start..end` foreach header remains; every
//   loop this pass rewrites is an ordinary C three-clause `for`.
// Failure modes: none (malformed headers are left untouched — P2-era
//   validation would have already caught a genuinely broken foreach).
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
            if tokens[i].is_keyword("for") {
                if let Some(edit) = try_rewrite(tokens, i) {
                    edits.push(edit);
                }
            }
            i += 1;
        }
    }
    apply_descending(&mut tree.tokens, edits);
}

fn try_rewrite(tokens: &[Token], for_idx: usize) -> Option<Edit> {
    let open = next_significant(tokens, for_idx + 1).filter(|&p| tokens[p].is_punct("("))?;
    let close = matching_close(tokens, open)?;
    if has_top_level(tokens, open + 1, close, ";") {
        return None; // classic C-shaped for loop
    }
    let colon = find_top_level(tokens, open + 1, close, ":")?;

    let type_idx = next_significant(tokens, open + 1)?;
    let name_idx = next_significant(tokens, type_idx + 1)?;
    if tokens[name_idx].kind != TokenKind::Identifier {
        return None;
    }
    let after_name = next_significant(tokens, name_idx + 1)?;
    if after_name != colon {
        return None;
    }

    let (start, end) = parse_range(tokens, colon + 1, close)?;

    let line = tokens[for_idx].line;
    let col = tokens[for_idx].column;
    let tok = |kind: TokenKind, text: &str| Token::new(kind, text, line, col);
    let name = tokens[name_idx].clone();
    let ty = tokens[type_idx].clone();

    let mut out = vec![tok(TokenKind::Keyword, "mut"), ty, name.clone(), tok(TokenKind::Operator, "=")];
    out.extend(start);
    out.push(tok(TokenKind::Punctuation, ";"));
    out.push(name.clone());
    out.push(tok(TokenKind::Operator, "<="));
    out.extend(end);
    out.push(tok(TokenKind::Punctuation, ";"));
    out.push(name);
    out.push(tok(TokenKind::Operator, "++"));

    Some(Edit::replace(open + 1, close - (open + 1), out))
}

fn has_top_level(tokens: &[Token], start: usize, end: usize, text: &str) -> bool {
    find_top_level(tokens, start, end, text).is_some()
}

fn find_top_level(tokens: &[Token], start: usize, end: usize, text: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut i = start;
    while i < end {
        let t = &tokens[i];
        if !t.is_elided() {
            match t.text.as_str() {
                "(" | "[" if t.kind == TokenKind::Punctuation => depth += 1,
                ")" | "]" if t.kind == TokenKind::Punctuation => depth -= 1,
                _ => {}
            }
            if depth == 0 && t.text == text && (t.kind == TokenKind::Punctuation) {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// Parse the range tokens after `:` up to (excluding) `close`, returning
/// the cloned token sequences for `start` and `end`.
fn parse_range(tokens: &[Token], start: usize, close: usize) -> Option<(Vec<Token>, Vec<Token>)> {
    let start_idx = next_significant(tokens, start).filter(|&p| p < close)?;
    let dot1 = next_significant(tokens, start_idx + 1).filter(|&p| p < close)?;
    if !tokens[dot1].is_op(".") {
        return None;
    }
    let after_dot1 = next_significant(tokens, dot1 + 1).filter(|&p| p < close)?;
    if tokens[after_dot1].is_op(".") {
        // Two separate dot tokens: start ".." end
        let end_idx = next_significant(tokens, after_dot1 + 1).filter(|&p| p < close)?;
        Some((vec![tokens[start_idx].clone()], vec![tokens[end_idx].clone()]))
    } else if tokens[after_dot1].kind == TokenKind::Number && tokens[after_dot1].text.starts_with('.') {
        // Quirk: end arrived fused with its own leading dot.
        let end_text = tokens[after_dot1].text.trim_start_matches('.').to_string();
        let mut end_tok = tokens[after_dot1].clone();
        end_tok.text = end_text;
        Some((vec![tokens[start_idx].clone()], vec![end_tok]))
    } else {
        None
    }
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
    fn numeric_range_quirk_encoding_lowers() {
        let out = transpiled("fn f() -> void { for (u8 i : 0..3) { g(i); } }");
        assert!(out.contains("for ( mut u8 i = 0 ; i <= 3 ; i ++ )"), "{out}");
        assert!(!out.contains(".."));
    }

    #[test]
    fn identifier_range_two_dot_encoding_lowers() {
        let out = transpiled("fn f(u8 n, u8 m) -> void { for (u8 i : n..m) { g(i); } }");
        assert!(out.contains("for ( mut u8 i = n ; i <= m ; i ++ )"), "{out}");
    }

    #[test]
    fn classic_for_loop_is_untouched() {
        let src = "fn f() -> void { for (i32 i = 0; i < 3; i = i + 1) { g(i); } }";
        let out = transpiled(src);
        assert!(out.contains("for ( i32 i = 0 ; i < 3 ; i = i + 1 )"), "{out}");
    }
}
