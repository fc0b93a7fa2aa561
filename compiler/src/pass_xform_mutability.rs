// pass_xform_mutability.rs — P16: mutability transform
//
// CZar's model: everything is immutable by default, `mut` opts in (language
// spec §4.3.8). Every C `const` keyword written by the user is rejected
// outright; every declared type token not preceded by `mut` gains a
// `const`; a non-mut pointer declaration gains `const` twice (pointee and
// pointer); `mut` on a non-pointer function parameter is rejected (CZar
// requires a pointer receiver for externally observable mutation).
//
// Preconditions: P15 has run.
// Postconditions: no `mut` keyword survives; every declared type mention
//   is const-correct per the rules above.
// Failure modes: `ERR_CONST_FORBIDDEN` for any user-written `const`;
//   `ERR_MUT_ON_VALUE_PARAM` for `mut` on a non-pointer parameter.
// Side effects: mutates the tree.

use crate::diag::{codes, Diagnostic, Span};
use crate::scan::{enclosing_function, next_significant, prev_significant};
use crate::token::{Token, TokenKind};
use crate::tree::{apply_descending, Edit, Tree};
use crate::typetab::looks_like_type;

pub fn run(tree: &mut Tree) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    reject_user_const(&tree.tokens, &mut diags);

    let mut edits = Vec::new();
    {
        let tokens = &tree.tokens;
        let mut paren_depth = 0i32;
        let mut i = 0;
        while i < tokens.len() {
            if tokens[i].is_elided() {
                i += 1;
                continue;
            }
            if tokens[i].kind == TokenKind::Punctuation {
                match tokens[i].text.as_str() {
                    "(" => paren_depth += 1,
                    ")" => paren_depth -= 1,
                    _ => {}
                }
            }
            if let Some(decl) = try_match_decl(tokens, i) {
                let is_param = paren_depth > 0;
                if decl.is_mut {
                    edits.push(Edit::remove(decl.mut_idx.unwrap(), 1));
                    if is_param && !decl.is_pointer {
                        diags.push(
                            Diagnostic::error(
                                codes::ERR_MUT_ON_VALUE_PARAM,
                                Span::new(tokens[decl.type_idx].line, tokens[decl.type_idx].column),
                                format!(
                                    "parameter '{}' is `mut` but not a pointer; CZar requires a pointer receiver for externally observable mutation",
                                    tokens[decl.name_idx].text
                                ),
                            )
                            .with_function_opt(enclosing_function(tokens, decl.name_idx)),
                        );
                    }
                } else {
                    let line = tokens[decl.type_idx].line;
                    let col = tokens[decl.type_idx].column;
                    edits.push(Edit::insert(
                        decl.type_idx,
                        vec![Token::new(TokenKind::Keyword, "const", line, col)],
                    ));
                    if decl.is_pointer {
                        edits.push(Edit::insert(
                            decl.last_star_idx.unwrap() + 1,
                            vec![Token::new(TokenKind::Keyword, "const", line, col)],
                        ));
                    }
                }
                i = decl.name_idx + 1;
                continue;
            }
            i += 1;
        }
    }
    apply_descending(&mut tree.tokens, edits);
    diags
}

fn reject_user_const(tokens: &[Token], diags: &mut Vec<Diagnostic>) {
    for (i, tok) in tokens.iter().enumerate() {
        if tok.is_elided() || !tok.is_keyword("const") || tok.synthetic {
            continue;
        }
        diags.push(
            Diagnostic::error(
                codes::ERR_CONST_FORBIDDEN,
                Span::new(tok.line, tok.column),
                "everything is const by default, use `mut` for mutable".to_string(),
            )
            .with_function_opt(enclosing_function(tokens, i)),
        );
    }
}

struct Decl {
    mut_idx: Option<usize>,
    is_mut: bool,
    type_idx: usize,
    last_star_idx: Option<usize>,
    is_pointer: bool,
    name_idx: usize,
}

/// Recognize `[mut] <type> [*...] <identifier>` immediately followed by
/// one of `;`, `,`, `)`, `=` — the declaration shape shared by locals,
/// struct fields, and function parameters. Deliberately excludes the
/// foreach header shape `T v : range`, whose colon makes P18's later
/// hand-inserted `mut` the last word on that variable's mutability.
fn try_match_decl(tokens: &[Token], start: usize) -> Option<Decl> {
    let mut_idx = if tokens[start].is_keyword("mut") {
        Some(start)
    } else {
        None
    };
    let type_idx = match mut_idx {
        Some(m) => next_significant(tokens, m + 1)?,
        None => start,
    };
    if mut_idx.is_none() {
        // Only enter this match at the position of the type token itself,
        // not at every token — avoids re-matching the same declaration
        // from the identifier or a later position.
        if prev_significant(tokens, start.saturating_sub(1))
            .filter(|&p| start > 0)
            .is_some_and(|p| tokens[p].is_keyword("mut"))
        {
            return None; // handled via the `mut` branch above
        }
        // A synthetic `const` (P9's read-only method receiver) already
        // carries its final, intentional const-qualification — leave it
        // alone rather than constifying it a second time.
        if prev_significant(tokens, start.saturating_sub(1))
            .filter(|&p| start > 0)
            .is_some_and(|p| tokens[p].is_keyword("const") && tokens[p].synthetic)
        {
            return None;
        }
    }
    if !looks_like_type(tokens[type_idx].kind, &tokens[type_idx].text)
        || tokens[type_idx].is_keyword("void")
    {
        return None;
    }
    let mut j = next_significant(tokens, type_idx + 1)?;
    let mut last_star_idx = None;
    while tokens[j].is_op("*") {
        last_star_idx = Some(j);
        j = next_significant(tokens, j + 1)?;
    }
    if tokens[j].kind != TokenKind::Identifier {
        return None;
    }
    let name_idx = j;
    let after = next_significant(tokens, name_idx + 1)?;
    if !(tokens[after].is_punct(";") || tokens[after].is_punct(",") || tokens[after].is_punct(")")
        || tokens[after].is_op("="))
    {
        return None;
    }
    Some(Decl {
        mut_idx,
        is_mut: mut_idx.is_some(),
        type_idx,
        last_star_idx,
        is_pointer: last_star_idx.is_some(),
        name_idx,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn transpiled(src: &str) -> (String, Vec<Diagnostic>) {
        let mut tree = Tree::new(lex(src).tokens);
        let diags = run(&mut tree);
        let text = tree
            .tokens
            .iter()
            .filter(|t| !t.is_elided() && t.kind != TokenKind::Eof)
            .map(|t| t.text.clone())
            .collect::<Vec<_>>()
            .join(" ");
        (text, diags)
    }

    #[test]
    fn plain_param_becomes_const() {
        let (out, diags) = transpiled("fn add ( i32 a , i32 b ) -> i32 { return a ; }");
        assert!(diags.is_empty(), "{diags:?}");
        assert!(out.contains("const i32 a"), "{out}");
        assert!(out.contains("const i32 b"), "{out}");
    }

    #[test]
    fn mut_local_elides_mut_and_skips_const() {
        let (out, diags) = transpiled("fn f ( ) -> void { mut i32 x = 1 ; x = 2 ; }");
        assert!(diags.is_empty(), "{diags:?}");
        assert!(out.contains("i32 x = 1"), "{out}");
        assert!(!out.contains("mut"));
        assert!(!out.contains("const i32 x"));
    }

    #[test]
    fn non_mut_pointer_gets_const_twice() {
        let (out, _diags) = transpiled("fn f ( i32 * p ) -> void { }");
        assert!(out.contains("const i32 * const p"), "{out}");
    }

    #[test]
    fn mut_pointer_param_is_allowed_and_unconsted() {
        let (out, diags) = transpiled("fn f ( mut i32 * p ) -> void { }");
        assert!(diags.is_empty(), "{diags:?}");
        assert!(out.contains("i32 * p"), "{out}");
        assert!(!out.contains("const"));
    }

    #[test]
    fn mut_on_value_param_errors() {
        let (_out, diags) = transpiled("fn f ( mut i32 a ) -> void { }");
        assert!(diags.iter().any(|d| d.code == codes::ERR_MUT_ON_VALUE_PARAM));
    }

    #[test]
    fn user_const_keyword_errors() {
        let (_out, diags) = transpiled("fn f ( ) -> void { const i32 x = 1 ; }");
        assert!(diags.iter().any(|d| d.code == codes::ERR_CONST_FORBIDDEN));
    }

    #[test]
    fn synthetic_const_receiver_is_left_untouched() {
        // Mirrors what P9 (method transform) hands P16 for a read-only
        // (`.`) method receiver: a pre-inserted `const` marked synthetic.
        // It must not be flagged as user-written `const`, nor constified
        // a second time into `const const ... * const`.
        let mut tree = Tree::new(lex("i32 Vec2_len ( Vec2_t * v ) -> i32 { return v -> x ; }").tokens);
        let const_idx = tree
            .tokens
            .iter()
            .position(|t| t.is_ident("Vec2_t"))
            .unwrap();
        // Insert a synthetic `const` immediately before the receiver type.
        tree.tokens.insert(
            const_idx,
            Token::new(TokenKind::Keyword, "const", 1, 1).mark_synthetic(),
        );
        let diags = run(&mut tree);
        assert!(diags.is_empty(), "{diags:?}");
        let text = tree
            .tokens
            .iter()
            .filter(|t| !t.is_elided() && t.kind != TokenKind::Eof)
            .map(|t| t.text.clone())
            .collect::<Vec<_>>()
            .join(" ");
        assert!(text.contains("const Vec2_t * v"), "{text}");
        assert!(!text.contains("const const"), "{text}");
        assert!(!text.contains("* const v"), "{text}");
    }

    #[test]
    fn foreach_header_is_untouched_here() {
        let (out, diags) = transpiled("fn f ( ) -> void { for ( u8 i : 0 . .3 ) { } }");
        assert!(diags.is_empty(), "{diags:?}");
        assert!(out.contains("u8 i"), "{out}");
        assert!(!out.contains("const u8"));
    }
}
