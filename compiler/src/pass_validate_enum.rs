// pass_validate_enum.rs — P4: enum / switch validation
//
// Records every `enum Name { MEMBER_A, MEMBER_B, ... };` into the enum table,
// then checks every `switch` whose selector is enum-typed (recognized by a
// `case EnumName.MEMBER:` label) for exhaustiveness and case-terminator
// discipline (language spec §4.2.3).
//
// Preconditions: P3 has run.
// Postconditions: `symbols.enum_table` holds every declared enum's members.
// Failure modes: `ERR_ENUM_SWITCH_MISSING_CASE` (one per absent member),
//   `ERR_ENUM_SWITCH_MISSING_DEFAULT`, `ERR_SWITCH_CASE_NO_TERMINATOR`,
//   `WARN_ENUM_MEMBER_NOT_UPPERCASE`.
// Side effects: none on the tree — this pass only populates tables and
//   emits diagnostics; the tree rewrite happens later, in P12.

use crate::diag::{codes, Diagnostic, Span};
use crate::scan::{enclosing_function, matching_close, next_significant};
use crate::symbols::SymbolTables;
use crate::token::{Token, TokenKind};
use crate::tree::Tree;

const TERMINATORS: &[&str] = &["break", "continue", "return", "goto"];

pub fn run(tree: &Tree, symbols: &mut SymbolTables) -> Vec<Diagnostic> {
    let tokens = &tree.tokens;
    let mut diags = Vec::new();

    record_enums(tokens, symbols, &mut diags);
    check_switches(tokens, symbols, &mut diags);

    diags
}

fn record_enums(tokens: &[Token], symbols: &mut SymbolTables, diags: &mut Vec<Diagnostic>) {
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].is_keyword("enum") {
            if let Some((name_idx, open, close)) = enum_header(tokens, i) {
                let name = tokens[name_idx].text.clone();
                let members = member_list(tokens, open, close);
                for m in &members {
                    if !is_all_uppercase(&m.text) {
                        diags.push(Diagnostic::warning(
                            codes::WARN_ENUM_MEMBER_NOT_UPPERCASE,
                            Span::new(m.line, m.column),
                            format!("enum member '{}' should be ALL_UPPERCASE", m.text),
                        ));
                    }
                }
                symbols.enum_table.insert(
                    name,
                    members.into_iter().map(|t| t.text).collect(),
                    tokens[i].line,
                );
                i = close + 1;
                continue;
            }
        }
        i += 1;
    }
}

/// `enum Name { ... }` — returns (name index, open-brace index, close-brace index).
fn enum_header(tokens: &[Token], enum_idx: usize) -> Option<(usize, usize, usize)> {
    let name_idx = next_significant(tokens, enum_idx + 1)?;
    if tokens[name_idx].kind != TokenKind::Identifier {
        return None;
    }
    let open = next_significant(tokens, name_idx + 1)?;
    if !tokens[open].is_punct("{") {
        return None;
    }
    let close = matching_close(tokens, open)?;
    Some((name_idx, open, close))
}

fn member_list(tokens: &[Token], open: usize, close: usize) -> Vec<Token> {
    let mut members = Vec::new();
    let mut i = open + 1;
    while i < close {
        if tokens[i].kind == TokenKind::Identifier && !tokens[i].is_elided() {
            members.push(tokens[i].clone());
        }
        i += 1;
    }
    members
}

fn is_all_uppercase(name: &str) -> bool {
    name.chars()
        .all(|c| !c.is_alphabetic() || c.is_uppercase())
}

fn check_switches(tokens: &[Token], symbols: &SymbolTables, diags: &mut Vec<Diagnostic>) {
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].is_keyword("switch") {
            if let Some(body_open) = switch_body_open(tokens, i) {
                if let Some(body_close) = matching_close(tokens, body_open) {
                    check_one_switch(tokens, symbols, i, body_open, body_close, diags);
                    i = body_close + 1;
                    continue;
                }
            }
        }
        i += 1;
    }
}

/// CZar's `switch` selector is unparenthesized (`switch c { ... }`), but a
/// parenthesized selector is tolerated too.
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
    enum_name: Option<String>,
    member: String,
    colon_idx: usize,
}

fn check_one_switch(
    tokens: &[Token],
    symbols: &SymbolTables,
    switch_idx: usize,
    body_open: usize,
    body_close: usize,
    diags: &mut Vec<Diagnostic>,
) {
    let labels = scan_case_labels(tokens, body_open, body_close);
    let scoped_name = labels.iter().find_map(|l| l.enum_name.clone());
    let bare_owner = labels
        .iter()
        .find(|l| l.enum_name.is_none())
        .and_then(|l| symbols.enum_table.owner_of(&l.member))
        .map(str::to_string);
    let Some(enum_name) = scoped_name.or(bare_owner) else {
        // Not an enum-typed switch (plain integer/string switch, or a
        // selector whose members aren't recognized) — out of scope for
        // this pass's exhaustiveness/terminator rules.
        return;
    };
    let Some(enum_info) = symbols.enum_table.get(&enum_name) else {
        return;
    };

    let has_default = has_default_label(tokens, body_open, body_close);
    let present: Vec<&str> = labels.iter().map(|l| l.member.as_str()).collect();
    for member in &enum_info.members {
        if !present.contains(&member.as_str()) {
            diags.push(
                Diagnostic::error(
                    codes::ERR_ENUM_SWITCH_MISSING_CASE,
                    Span::new(tokens[switch_idx].line, tokens[switch_idx].column),
                    format!(
                        "switch over '{enum_name}' does not handle member '{member}'"
                    ),
                )
                .with_function_opt(enclosing_function(tokens, switch_idx)),
            );
        }
    }
    if !has_default {
        diags.push(
            Diagnostic::error(
                codes::ERR_ENUM_SWITCH_MISSING_DEFAULT,
                Span::new(tokens[switch_idx].line, tokens[switch_idx].column),
                format!("switch over '{enum_name}' has no default case"),
            )
            .with_function_opt(enclosing_function(tokens, switch_idx)),
        );
    }

    // Case-terminator discipline: every case body (the span from one case's
    // `:` to the next case/default/closing brace at depth 0) must end with
    // break/continue/return/goto as its last top-level statement.
    let mut boundaries: Vec<usize> = labels.iter().map(|l| l.colon_idx).collect();
    boundaries.push(body_close);
    boundaries.sort_unstable();
    boundaries.dedup();
    for w in boundaries.windows(2) {
        let (start, end) = (w[0], w[1]);
        if !ends_with_terminator(tokens, start + 1, end) {
            diags.push(
                Diagnostic::error(
                    codes::ERR_SWITCH_CASE_NO_TERMINATOR,
                    Span::new(tokens[start].line, tokens[start].column),
                    "case body does not end with break/continue/return/goto".to_string(),
                )
                .with_function_opt(enclosing_function(tokens, start)),
            );
        }
    }
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

/// `case MEMBER :` or `case EnumName.MEMBER :`.
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
            enum_name: Some(tokens[first].text.clone()),
            member: tokens[member_idx].text.clone(),
            colon_idx,
        })
    } else if tokens[after_first].is_punct(":") {
        Some(CaseLabel {
            enum_name: None,
            member: tokens[first].text.clone(),
            colon_idx: after_first,
        })
    } else {
        None
    }
}

fn has_default_label(tokens: &[Token], body_open: usize, body_close: usize) -> bool {
    (body_open + 1..body_close).any(|i| tokens[i].is_keyword("default"))
}

/// True if the last top-level statement in `tokens[start..end)` begins with
/// a terminator keyword. Tracks brace depth so nested `if`/`for` blocks
/// don't confuse statement boundaries.
fn ends_with_terminator(tokens: &[Token], start: usize, end: usize) -> bool {
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
    match last_complete_stmt_start {
        Some(s) => TERMINATORS.iter().any(|t| tokens[s].is_keyword(t)),
        None => false,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn run_on(src: &str) -> (Vec<Diagnostic>, SymbolTables) {
        let tree = Tree::new(lex(src).tokens);
        let mut symbols = SymbolTables::default();
        let diags = run(&tree, &mut symbols);
        (diags, symbols)
    }

    const COLOR_ENUM: &str = "enum Color { RED, GREEN, BLUE };\n";

    #[test]
    fn enum_members_recorded() {
        let (_diags, symbols) = run_on(COLOR_ENUM);
        let info = symbols.enum_table.get("Color").unwrap();
        assert_eq!(info.members, vec!["RED", "GREEN", "BLUE"]);
    }

    #[test]
    fn lowercase_member_warns() {
        let (diags, _) = run_on("enum Color { Red, GREEN, BLUE };\n");
        assert!(diags
            .iter()
            .any(|d| d.code == codes::WARN_ENUM_MEMBER_NOT_UPPERCASE));
    }

    #[test]
    fn exhaustive_switch_with_terminators_is_clean() {
        let src = format!(
            "{COLOR_ENUM}fn f(Color c) -> i32 {{ switch (c) {{ case Color.RED: return 1; case Color.GREEN: return 2; case Color.BLUE: return 3; default: return 0; }} }}"
        );
        let (diags, _) = run_on(&src);
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn missing_member_errors() {
        let src = format!(
            "{COLOR_ENUM}fn f(Color c) -> i32 {{ switch (c) {{ case Color.RED: return 1; default: return 0; }} }}"
        );
        let (diags, _) = run_on(&src);
        assert!(diags
            .iter()
            .any(|d| d.code == codes::ERR_ENUM_SWITCH_MISSING_CASE));
    }

    #[test]
    fn missing_default_errors() {
        let src = format!(
            "{COLOR_ENUM}fn f(Color c) -> i32 {{ switch (c) {{ case Color.RED: return 1; case Color.GREEN: return 2; case Color.BLUE: return 3; }} }}"
        );
        let (diags, _) = run_on(&src);
        assert!(diags
            .iter()
            .any(|d| d.code == codes::ERR_ENUM_SWITCH_MISSING_DEFAULT));
    }

    #[test]
    fn missing_terminator_errors() {
        let src = format!(
            "{COLOR_ENUM}fn f(Color c) -> i32 {{ switch (c) {{ case Color.RED: foo(); case Color.GREEN: return 2; case Color.BLUE: return 3; default: return 0; }} }}"
        );
        let (diags, _) = run_on(&src);
        assert!(diags
            .iter()
            .any(|d| d.code == codes::ERR_SWITCH_CASE_NO_TERMINATOR));
    }

    #[test]
    fn continue_counts_as_fallthrough_terminator() {
        let src = format!(
            "{COLOR_ENUM}fn f(Color c) -> i32 {{ switch (c) {{ case Color.RED: continue; case Color.GREEN: return 2; case Color.BLUE: return 3; default: return 0; }} }}"
        );
        let (diags, _) = run_on(&src);
        assert!(!diags
            .iter()
            .any(|d| d.code == codes::ERR_SWITCH_CASE_NO_TERMINATOR));
    }

    #[test]
    fn non_enum_switch_is_not_checked() {
        let diags = run_on("fn f(i32 x) -> i32 { switch (x) { case 1: foo(); case 2: return 2; } }").0;
        assert!(diags.is_empty());
    }

    #[test]
    fn parenless_bare_case_switch_reports_missing_member() {
        // Scenario 3 from the language spec: unparenthesized switch selector,
        // bare (unscoped) case labels, no enum declaration terminator.
        let src = "enum Color { RED, GREEN, BLUE }\nfn show(Color c) -> void { switch c { case RED: break; case GREEN: break; } }";
        let (diags, _) = run_on(src);
        assert!(diags
            .iter()
            .any(|d| d.code == codes::ERR_ENUM_SWITCH_MISSING_CASE
                && d.message.contains("BLUE")));
    }
}
