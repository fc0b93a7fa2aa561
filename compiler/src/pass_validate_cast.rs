// pass_validate_cast.rs — P3: cast validation
//
// C-style casts `(Type)expr` are forbidden; only `cast<Type>(value)` and
// `cast<Type>(value, fallback)` are accepted (language spec §4.2.2). This
// pass only rejects the forbidden form — lowering the accepted form happens
// later, in P21, once type/constant identifiers have their final names.
//
// Preconditions: P2 has run.
// Postconditions: none on the tree — diagnostics only.
// Failure modes: `ERR_CAST_SYNTAX` for every `(Type)` immediately followed
//   by an expression-starting token in a position that isn't a call.
// Side effects: none.

use crate::diag::{codes, Diagnostic, Span};
use crate::scan::{enclosing_function, next_significant, prev_significant};
use crate::token::TokenKind;
use crate::tree::Tree;
use crate::typetab::looks_like_type;

pub fn run(tree: &Tree) -> Vec<Diagnostic> {
    let tokens = &tree.tokens;
    let mut diags = Vec::new();

    for i in 0..tokens.len() {
        let tok = &tokens[i];
        if tok.is_elided() || !tok.is_punct("(") {
            continue;
        }
        if is_c_style_cast(tokens, i) {
            let close = i + 2; // "(" type ")" — exactly three tokens wide
            let offending = format!("({})", tokens[i + 1].text);
            diags.push(
                Diagnostic::error(
                    codes::ERR_CAST_SYNTAX,
                    Span::new(tok.line, tok.column),
                    format!(
                        "'{}' is not a valid cast; use cast<{}>(value) instead",
                        offending, tokens[i + 1].text
                    ),
                )
                .with_function_opt(enclosing_function(tokens, close))
                .with_hint(format!("cast<{}>(value)", tokens[i + 1].text)),
            );
        }
    }

    diags
}

/// Recognize `( Type )` immediately followed by an expression-starting
/// token, where `Type` is the *only* token between the parens, and the
/// parens are not preceded by an identifier/`)`/`]` (which would make this
/// a call or index rather than a cast).
fn is_c_style_cast(tokens: &[crate::token::Token], open_idx: usize) -> bool {
    let Some(type_idx) = next_significant(tokens, open_idx + 1) else {
        return false;
    };
    if !looks_like_type(tokens[type_idx].kind, &tokens[type_idx].text) {
        return false;
    }
    let Some(close_idx) = next_significant(tokens, type_idx + 1) else {
        return false;
    };
    if !tokens[close_idx].is_punct(")") {
        return false;
    }

    if let Some(before) = prev_significant(tokens, open_idx.saturating_sub(1)) {
        if open_idx > 0 {
            let b = &tokens[before];
            let is_call_or_index = b.kind == TokenKind::Identifier
                || b.is_punct(")")
                || b.is_punct("]");
            if is_call_or_index {
                return false;
            }
        }
    }

    match next_significant(tokens, close_idx + 1) {
        Some(after) => {
            let a = &tokens[after];
            matches!(
                a.kind,
                TokenKind::Identifier | TokenKind::Number | TokenKind::String | TokenKind::InterpolatedString
            ) || a.is_punct("(")
                || a.is_op("-")
                || a.is_op("!")
                || a.is_op("*")
                || a.is_op("&")
        }
        None => false,
    }
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
    fn c_style_cast_to_primitive_errors() {
        let ds = diags("fn f() -> void { i32 x = (i32)y; }");
        assert_eq!(ds.len(), 1);
        assert_eq!(ds[0].code, codes::ERR_CAST_SYNTAX);
    }

    #[test]
    fn c_style_cast_to_struct_type_errors() {
        let ds = diags("fn f() -> void { Vec2 v = (Vec2)raw; }");
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn cast_keyword_form_is_accepted() {
        let ds = diags("fn f() -> void { i32 x = cast<i32>(y); }");
        assert!(ds.is_empty());
    }

    #[test]
    fn function_call_with_type_like_argument_is_not_flagged() {
        let ds = diags("fn f() -> void { sizeof_of(i32); }");
        assert!(ds.is_empty());
    }

    #[test]
    fn parenthesized_grouping_is_not_flagged() {
        let ds = diags("fn f() -> void { i32 x = (a); }");
        assert!(ds.is_empty());
    }
}
