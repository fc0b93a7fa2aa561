// pass_xform_cast.rs — P21: cast lowering
//
// `cast<T>(v)` lowers to `((T)(v))`. `cast<T>(v, fb)` lowers to a
// round-trip-checked cast: `((T)(v) == (v) ? (T)(v) : (fb))` — cast `v` to
// `T`, cast back implicitly via the comparison, and fall back to `fb` if
// the round trip isn't exact (the open question the language spec leaves
// as *TBD*; resolved here rather than losing the fallback like the source
// does). `v` is cloned into the expression twice, so this form should only
// be used with a side-effect-free `v`.
//
// Preconditions: P20 has run (T is already a C/stdint type name).
// Postconditions: no `cast<...>(...)` call remains.
// Failure modes: none (P3 already rejected every other cast spelling).
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
            if tokens[i].is_keyword("cast") {
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

fn try_rewrite(tokens: &[Token], cast_idx: usize) -> Option<(usize, Edit)> {
    let lt = next_significant(tokens, cast_idx + 1).filter(|&p| tokens[p].is_op("<"))?;
    let gt = find_angle_close(tokens, lt + 1)?;
    let open = next_significant(tokens, gt + 1).filter(|&p| tokens[p].is_punct("("))?;
    let close = matching_close(tokens, open)?;

    let type_tokens: Vec<Token> = (lt + 1..gt)
        .filter(|&i| !tokens[i].is_elided() && tokens[i].kind != TokenKind::Comment)
        .map(|i| tokens[i].clone())
        .collect();
    if type_tokens.is_empty() {
        return None;
    }

    let comma = find_top_level_comma(tokens, open + 1, close);
    let (value_end, fallback_start) = match comma {
        Some(c) => (c, Some(next_significant(tokens, c + 1)?)),
        None => (close, None),
    };
    let value_tokens: Vec<Token> = (open + 1..value_end)
        .filter(|&i| !tokens[i].is_elided() && tokens[i].kind != TokenKind::Comment)
        .map(|i| tokens[i].clone())
        .collect();
    if value_tokens.is_empty() {
        return None;
    }

    let line = tokens[cast_idx].line;
    let col = tokens[cast_idx].column;
    let tok = |kind: TokenKind, text: &str| Token::new(kind, text, line, col);
    let paren_type = || {
        let mut v = vec![tok(TokenKind::Punctuation, "(")];
        v.extend(type_tokens.iter().cloned());
        v.push(tok(TokenKind::Punctuation, ")"));
        v
    };
    let paren_value = || {
        let mut v = vec![tok(TokenKind::Punctuation, "(")];
        v.extend(value_tokens.iter().cloned());
        v.push(tok(TokenKind::Punctuation, ")"));
        v
    };

    let mut out = vec![tok(TokenKind::Punctuation, "(")];
    out.extend(paren_type());
    out.extend(paren_value());

    if let Some(fb_start) = fallback_start {
        let fallback_tokens: Vec<Token> = (fb_start..close)
            .filter(|&i| !tokens[i].is_elided() && tokens[i].kind != TokenKind::Comment)
            .map(|i| tokens[i].clone())
            .collect();
        if fallback_tokens.is_empty() {
            return None;
        }
        out.push(tok(TokenKind::Operator, "=="));
        out.extend(paren_value());
        out.push(tok(TokenKind::Operator, "?"));
        out.extend(paren_type());
        out.extend(paren_value());
        out.push(tok(TokenKind::Operator, ":"));
        out.push(tok(TokenKind::Punctuation, "("));
        out.extend(fallback_tokens);
        out.push(tok(TokenKind::Punctuation, ")"));
        out.push(tok(TokenKind::Punctuation, ")"));
    } else {
        out.push(tok(TokenKind::Punctuation, ")"));
    }

    Some((close + 1, Edit::replace(cast_idx, close + 1 - cast_idx, out)))
}

/// `cast<` opens with a single `<`; the matching `>` is the first
/// top-level `>` before the argument list's `(` — CZar's grammar never
/// nests a generic type parameter, so no angle-depth tracking is needed
/// beyond watching for an intervening `(` which would mean malformed input.
fn find_angle_close(tokens: &[Token], start: usize) -> Option<usize> {
    let mut i = start;
    while i < tokens.len() {
        if tokens[i].is_elided() {
            i += 1;
            continue;
        }
        if tokens[i].is_op(">") {
            return Some(i);
        }
        if tokens[i].is_punct("(") {
            return None;
        }
        i += 1;
    }
    None
}

fn find_top_level_comma(tokens: &[Token], start: usize, end: usize) -> Option<usize> {
    let mut depth = 0i32;
    let mut i = start;
    while i < end {
        let t = &tokens[i];
        if !t.is_elided() {
            if t.is_punct("(") || t.is_punct("[") {
                depth += 1;
            } else if t.is_punct(")") || t.is_punct("]") {
                depth -= 1;
            } else if depth == 0 && t.is_punct(",") {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}
