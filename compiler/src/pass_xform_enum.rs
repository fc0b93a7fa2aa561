// pass_xform_enum.rs — P12: enum transform
//
// Strips scoped case labels (`case Color.RED` -> `case RED`), rewrites a
// fallthrough `continue` (the last statement of a case body, validated by
// P4 to mean "fall through" rather than "loop continue") into
// `__attribute__((fallthrough));`, and inserts a `default: /* unreachable
// */` into any switch P4 validated as exhaustive-without-default (language
// spec §4.3.5).
//
// Preconditions: P11 has run; every switch reaching this pass is either
//   exhaustive or already has a default (P4 halted the pipeline otherwise).
// Postconditions: no `EnumName.` prefix remains before a case label; a
//   fallthrough `continue` is now a GNU fallthrough attribute; every
//   switch has a `default:` arm.
// Failure modes: none.
// Side effects: mutates the tree.

use crate::scan::{matching_close, next_significant};
use crate::token::{Token, TokenKind};
use crate::tree::{apply_descending, Edit, Tree};

const TERMINATORS: &[&str] = &["break", "continue", "return", "goto"];

pub fn run(tree: &mut Tree) {
    let mut edits = Vec::new();
    {
        let tokens = &tree.tokens;
        let mut i = 0;
        while i < tokens.len() {
            if tokens[i].is_keyword("switch") {
                if let Some(body_open) = switch_body_open(tokens, i) {
                    if let Some(body_close) = matching_close(tokens, body_open) {
                        transform_switch(tokens, body_open, body_close, &mut edits);
                        i = body_close + 1;
                        continue;
                    }
                }
            }
            i += 1;
        }
    }
    apply_descending(&mut tree.tokens, edits);
}

fn switch_body_open(tokens: &[Token], switch_idx: usize) -> Option<usize> {
    let mut i = next_significant(tokens, switch_idx + 1)?;
    if tokens[i].is_punct("(") {
        let close = matching_close(tokens, i)?;
        i = next_significant(tokens, close + 1)?;
    } else {
        while i < tokens.len() && !tokens[i].is_punct("{") {
            i = next_significant(tokens, i + 1)?;
        }
    }
    tokens[i].is_punct("{").then_some(i)
}

struct CaseLabel {
    /// Indices to elide: the `EnumName` identifier and the `.` separator,
    /// when the label is scoped. `None` for an already-bare label.
    scope_prefix: Option<(usize, usize)>,
    colon_idx: usize,
}

fn scan_case_labels(tokens: &[Token], body_open: usize, body_close: usize) -> Vec<CaseLabel> {
    let mut labels = Vec::new();
    let mut i = body_open + 1;
    while i < body_close {
        if tokens[i].is_keyword("case") {
            if let Some(label) = parse_case_label(tokens, i) {
                labels.push(label);
            }
        }
        i += 1;
    }
    labels
}

fn parse_case_label(tokens: &[Token], case_idx: usize) -> Option<CaseLabel> {
    let first = next_significant(tokens, case_idx + 1)?;
    if tokens[first].kind != TokenKind::Identifier {
        return None;
    }
    let after_first = next_significant(tokens, first + 1)?;
    if tokens[after_first].is_op(".") {
        let member_idx = next_significant(tokens, after_first + 1)?;
        let colon_idx = next_significant(tokens, member_idx + 1)?;
        if !tokens[colon_idx].is_punct(":") {
            return None;
        }
        Some(CaseLabel {
            scope_prefix: Some((first, after_first)),
            colon_idx,
        })
    } else if tokens[after_first].is_punct(":") {
        Some(CaseLabel {
            scope_prefix: None,
            colon_idx: after_first,
        })
    } else {
        None
    }
}

fn has_default_label(tokens: &[Token], body_open: usize, body_close: usize) -> bool {
    (body_open + 1..body_close).any(|i| tokens[i].is_keyword("default"))
}

fn transform_switch(tokens: &[Token], body_open: usize, body_close: usize, edits: &mut Vec<Edit>) {
    let labels = scan_case_labels(tokens, body_open, body_close);

    for label in &labels {
        if let Some((enum_idx, dot_idx)) = label.scope_prefix {
            edits.push(Edit::remove(enum_idx, dot_idx - enum_idx + 1));
        }
    }

    let mut boundaries: Vec<usize> = labels.iter().map(|l| l.colon_idx).collect();
    boundaries.push(body_close);
    boundaries.sort_unstable();
    boundaries.dedup();
    for w in boundaries.windows(2) {
        let (start, end) = (w[0], w[1]);
        if let Some(continue_idx) = fallthrough_continue(tokens, start + 1, end) {
            let semi_idx = next_significant(tokens, continue_idx + 1)
                .filter(|&i| tokens[i].is_punct(";"))
                .unwrap_or(continue_idx);
            let line = tokens[continue_idx].line;
            let col = tokens[continue_idx].column;
            edits.push(Edit::replace(
                continue_idx,
                semi_idx - continue_idx + 1,
                vec![
                    Token::new(
                        TokenKind::Identifier,
                        "__attribute__((fallthrough))",
                        line,
                        col,
                    ),
                    Token::new(TokenKind::Punctuation, ";", line, col),
                ],
            ));
        }
    }

    if !has_default_label(tokens, body_open, body_close) {
        let line = tokens[body_close].line;
        let col = tokens[body_close].column;
        edits.push(Edit::insert(
            body_close,
            vec![
                Token::new(TokenKind::Keyword, "default", line, col),
                Token::new(TokenKind::Punctuation, ":", line, col),
                Token::new(TokenKind::Comment, "/* unreachable */", line, col),
            ],
        ));
    }
}

/// Find the index of a `continue` that is the last top-level statement of
/// a case body — the shape P4 validated as meaning "fall through", not a
/// loop continue (a loop-continue would be nested inside `{ }` at depth >
/// 0 relative to the case body, which this only scans at depth 0).
fn fallthrough_continue(tokens: &[Token], start: usize, end: usize) -> Option<usize> {
    let mut depth = 0i32;
    let mut stmt_start: Option<usize> = None;
    let mut last_complete_stmt_start: Option<usize> = None;
    let mut i = start;
    while i < end {
        let tok = &tokens[i];
        if tok.is_elided() {
            i += 1;
            continue;
        }
        if stmt_start.is_none() && depth == 0 {
            stmt_start = Some(i);
        }
        match tok.text.as_str() {
            "{" if tok.kind == TokenKind::Punctuation => depth += 1,
            "}" if tok.kind == TokenKind::Punctuation => depth -= 1,
            ";" if tok.kind == TokenKind::Punctuation && depth == 0 => {
                last_complete_stmt_start = stmt_start;
                stmt_start = None;
            }
            _ => {}
        }
        i += 1;
    }
    let s = last_complete_stmt_start?;
    if tokens[s].is_keyword("continue") {
        Some(s)
    } else {
        None
    }
}

#[allow(dead_code)]
fn is_terminator(tok: &Token) -> bool {
    TERMINATORS.iter().any(|t| tok.is_keyword(t))
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
    fn scoped_case_label_becomes_bare() {
        let out = transpiled(
            "fn f(Color c) -> i32 { switch (c) { case Color.RED: return 1; default: return 0; } }",
        );
        assert!(out.contains("case RED : return 1 ;"), "{out}");
        assert!(!out.contains("Color ."));
    }

    #[test]
    fn fallthrough_continue_becomes_attribute() {
        let out = transpiled(
            "fn f(Color c) -> i32 { switch (c) { case Color.RED: continue; case Color.GREEN: return 2; default: return 0; } }",
        );
        assert!(out.contains("__attribute__((fallthrough)) ;"), "{out}");
        assert!(!out.contains("continue"));
    }

    #[test]
    fn missing_default_is_inserted() {
        let out = transpiled(
            "fn f(Color c) -> i32 { switch (c) { case Color.RED: return 1; case Color.GREEN: return 2; case Color.BLUE: return 3; } }",
        );
        assert!(out.contains("default : /* unreachable */"), "{out}");
    }

    #[test]
    fn existing_default_is_not_duplicated() {
        let out = transpiled(
            "fn f(Color c) -> i32 { switch (c) { case Color.RED: return 1; default: return 0; } }",
        );
        assert_eq!(out.matches("default").count(), 1);
    }

    #[test]
    fn loop_continue_inside_case_is_left_alone() {
        let out = transpiled(
            "fn f(Color c) -> i32 { switch (c) { case Color.RED: for (i32 i : 0..3) { continue; } return 1; default: return 0; } }",
        );
        assert!(out.contains("continue ;"));
        assert!(!out.contains("fallthrough"));
    }
}
