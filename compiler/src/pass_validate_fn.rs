// pass_validate_fn.rs — P5: function validation
//
// Rejects empty `()` parameter lists (CZar requires the explicit `void` C
// itself requires), rejects a non-integer `main` return type, and warns
// when two adjacent parameters share a type with no way to tell them apart
// at an unlabelled call site (language spec §4.2.4).
//
// Preconditions: P4 has run.
// Postconditions: none on the tree — diagnostics only.
// Failure modes: `ERR_EMPTY_PARAM_LIST`, `ERR_MAIN_RETURN_TYPE`,
//   `WARN_AMBIGUOUS_ADJACENT_PARAMS`.
// Side effects: none.

use crate::diag::{codes, Diagnostic, Span};
use crate::scan::{matching_close, next_significant};
use crate::token::{Token, TokenKind};
use crate::tree::Tree;
use crate::typetab::is_primitive_type;

const INTEGER_TYPES: &[&str] = &[
    "i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "usize", "isize",
];

pub fn run(tree: &Tree) -> Vec<Diagnostic> {
    let tokens = &tree.tokens;
    let mut diags = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].is_keyword("fn") {
            if let Some(header) = fn_header(tokens, i) {
                check_header(tokens, &header, &mut diags);
                i = header.close_paren + 1;
                continue;
            }
        }
        i += 1;
    }
    diags
}

struct FnHeader {
    name: Option<String>,
    name_idx: Option<usize>,
    open_paren: usize,
    close_paren: usize,
}

fn fn_header(tokens: &[Token], fn_idx: usize) -> Option<FnHeader> {
    let open_paren = find_open_paren(tokens, fn_idx + 1)?;
    let close_paren = matching_close(tokens, open_paren)?;
    let name_idx = (0..open_paren)
        .rev()
        .find(|&i| !tokens[i].is_elided() && tokens[i].kind != TokenKind::Comment);
    let name = name_idx.filter(|&i| tokens[i].kind == TokenKind::Identifier).map(|i| tokens[i].text.clone());
    Some(FnHeader {
        name,
        name_idx,
        open_paren,
        close_paren,
    })
}

fn find_open_paren(tokens: &[Token], start: usize) -> Option<usize> {
    let mut i = start;
    while i < tokens.len() {
        if tokens[i].is_punct("(") {
            return Some(i);
        }
        if tokens[i].is_punct(";") || tokens[i].is_punct("{") {
            return None;
        }
        i += 1;
    }
    None
}

fn check_header(tokens: &[Token], header: &FnHeader, diags: &mut Vec<Diagnostic>) {
    let is_empty = next_significant(tokens, header.open_paren + 1)
        .map(|i| i >= header.close_paren)
        .unwrap_or(true);
    let fn_tok = &tokens[header.name_idx.unwrap_or(header.open_paren)];

    if header.name.as_deref() == Some("main") {
        check_main_return_type(tokens, header, diags);
    } else if is_empty {
        diags.push(Diagnostic::error(
            codes::ERR_EMPTY_PARAM_LIST,
            Span::new(fn_tok.line, fn_tok.column),
            format!(
                "'{}' has an empty parameter list; write '(void)' explicitly",
                header.name.as_deref().unwrap_or("<fn>")
            ),
        ));
    }

    if !is_empty {
        check_adjacent_ambiguity(tokens, header, diags);
    }
}

fn check_main_return_type(tokens: &[Token], header: &FnHeader, diags: &mut Vec<Diagnostic>) {
    let Some(arrow_idx) = next_significant(tokens, header.close_paren + 1) else {
        return;
    };
    if !tokens[arrow_idx].is_op("->") {
        return;
    }
    let Some(ret_idx) = next_significant(tokens, arrow_idx + 1) else {
        return;
    };
    let ret = &tokens[ret_idx];
    let is_integer = ret.kind == TokenKind::Keyword && INTEGER_TYPES.contains(&ret.text.as_str());
    if !is_integer {
        diags.push(Diagnostic::error(
            codes::ERR_MAIN_RETURN_TYPE,
            Span::new(ret.line, ret.column),
            format!("'main' must return an integer type, found '{}'", ret.text),
        ));
    }
}

struct Param {
    type_text: String,
    first_idx: usize,
}

fn check_adjacent_ambiguity(tokens: &[Token], header: &FnHeader, diags: &mut Vec<Diagnostic>) {
    let params = parse_params(tokens, header.open_paren, header.close_paren);
    for pair in params.windows(2) {
        if pair[0].type_text == pair[1].type_text {
            let t = &tokens[pair[1].first_idx];
            diags.push(Diagnostic::warning(
                codes::WARN_AMBIGUOUS_ADJACENT_PARAMS,
                Span::new(t.line, t.column),
                format!(
                    "adjacent parameters of type '{}' are easy to swap by accident; consider labelling call-site arguments",
                    pair[0].type_text
                ),
            ));
        }
    }
}

/// Split the parameter list on top-level commas, returning the leading type
/// token's text for each (skipping a leading `mut`).
fn parse_params(tokens: &[Token], open: usize, close: usize) -> Vec<Param> {
    let mut params = Vec::new();
    let mut i = open + 1;
    let mut depth = 0i32;
    let mut seg_start = i;
    while i < close {
        let tok = &tokens[i];
        if tok.is_punct("(") || tok.is_punct("[") {
            depth += 1;
        } else if tok.is_punct(")") || tok.is_punct("]") {
            depth -= 1;
        } else if tok.is_punct(",") && depth == 0 {
            if let Some(p) = param_type(tokens, seg_start, i) {
                params.push(p);
            }
            seg_start = i + 1;
        }
        i += 1;
    }
    if let Some(p) = param_type(tokens, seg_start, close) {
        params.push(p);
    }
    params
}

fn param_type(tokens: &[Token], start: usize, end: usize) -> Option<Param> {
    let mut j = next_significant(tokens, start).filter(|&i| i < end)?;
    if tokens[j].is_keyword("mut") {
        j = next_significant(tokens, j + 1).filter(|&i| i < end)?;
    }
    if !is_primitive_type(&tokens[j].text) && tokens[j].kind != TokenKind::Identifier {
        return None;
    }
    Some(Param {
        type_text: tokens[j].text.clone(),
        first_idx: j,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn diags(src: &str) -> Vec<Diagnostic> {
        let tree = Tree::new(lex(src).tokens);
        run(&tree)
    }

    #[test]
    fn empty_params_on_regular_function_errors() {
        let ds = diags("fn f() -> i32 { return 0; }");
        assert_eq!(ds.len(), 1);
        assert_eq!(ds[0].code, codes::ERR_EMPTY_PARAM_LIST);
    }

    #[test]
    fn explicit_void_is_accepted() {
        let ds = diags("fn f(void) -> i32 { return 0; }");
        assert!(ds.is_empty());
    }

    #[test]
    fn main_with_empty_parens_is_exempt() {
        let ds = diags("fn main() -> i32 { return 0; }");
        assert!(ds.is_empty());
    }

    #[test]
    fn main_with_non_integer_return_errors() {
        let ds = diags("fn main() -> f64 { return 0.0; }");
        assert_eq!(ds.len(), 1);
        assert_eq!(ds[0].code, codes::ERR_MAIN_RETURN_TYPE);
    }

    #[test]
    fn adjacent_same_type_params_warn() {
        let ds = diags("fn add(i32 a, i32 b) -> i32 { return a + b; }");
        assert_eq!(ds.len(), 1);
        assert_eq!(ds[0].code, codes::WARN_AMBIGUOUS_ADJACENT_PARAMS);
    }

    #[test]
    fn adjacent_different_type_params_are_fine() {
        let ds = diags("fn scale(f64 factor, i32 count) -> f64 { return factor; }");
        assert!(ds.is_empty());
    }
}
