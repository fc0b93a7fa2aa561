// pass_xform_typeconst.rs — P20: type & constant identifier mapping
//
// Replaces every CZar primitive type keyword and named numeric-limit
// constant with its C/stdint equivalent (language spec §4.3.12, tables in
// `typetab.rs`), and replaces every remaining `_` placeholder declaration
// with a freshly generated `_cz_unused_<n>` name, annotated
// `__attribute__((unused))`.
//
// Preconditions: P19 has run.
// Postconditions: no CZar primitive type name or `CZ_*` constant survives
//   in the tree; no declared `_` identifier survives unrenamed.
// Failure modes: none.
// Side effects: mutates the tree and `symbols.unused_counter`.

use crate::scan::{next_significant, prev_significant};
use crate::symbols::SymbolTables;
use crate::token::{Token, TokenKind};
use crate::tree::{apply_descending, Edit, Tree};
use crate::typetab::{c_equivalent, const_equivalent, is_primitive_type, looks_like_type};

pub fn run(tree: &mut Tree, symbols: &mut SymbolTables) {
    let decls = find_unused_decls(&tree.tokens);

    for &(_, name_idx) in &decls {
        let n = symbols.unused_counter.next();
        tree.tokens[name_idx].text = format!("_cz_unused_{n}");
    }

    let mut edits = Vec::new();
    for &(left_edge, _) in &decls {
        let line = tree.tokens[left_edge].line;
        let col = tree.tokens[left_edge].column;
        edits.push(Edit::insert(
            left_edge,
            vec![Token::new(
                TokenKind::Identifier,
                "__attribute__((unused))",
                line,
                col,
            )],
        ));
    }
    apply_descending(&mut tree.tokens, edits);

    for tok in tree.tokens.iter_mut() {
        if tok.is_elided() {
            continue;
        }
        if tok.kind == TokenKind::Keyword && is_primitive_type(&tok.text) {
            if let Some(c) = c_equivalent(&tok.text) {
                tok.text = c.to_string();
            }
        } else if tok.kind == TokenKind::Identifier {
            if let Some(c) = const_equivalent(&tok.text) {
                tok.text = c.to_string();
            }
        }
    }
}

/// Find every `[const] Type [* [const]]* _` declaration shape — a local,
/// parameter, or field whose name is the placeholder `_` — returning
/// `(left_edge, name_idx)` where `left_edge` is the position of the
/// leftmost `const` P16 already attached (or the type token itself if
/// none).
fn find_unused_decls(tokens: &[Token]) -> Vec<(usize, usize)> {
    let mut decls = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].is_elided() {
            i += 1;
            continue;
        }
        if looks_like_type(tokens[i].kind, &tokens[i].text) {
            if let Some(name_idx) = match_to_name(tokens, i) {
                if tokens[name_idx].text == "_" {
                    let left_edge = leftmost_const(tokens, i);
                    decls.push((left_edge, name_idx));
                }
                i = name_idx + 1;
                continue;
            }
        }
        i += 1;
    }
    decls
}

fn leftmost_const(tokens: &[Token], type_idx: usize) -> usize {
    let mut edge = type_idx;
    while edge > 0 {
        match prev_significant(tokens, edge - 1) {
            Some(p) if tokens[p].is_keyword("const") => edge = p,
            _ => break,
        }
    }
    edge
}

fn match_to_name(tokens: &[Token], type_idx: usize) -> Option<usize> {
    let mut j = next_significant(tokens, type_idx + 1)?;
    while tokens[j].is_op("*") || tokens[j].is_keyword("const") {
        j = next_significant(tokens, j + 1)?;
    }
    if tokens[j].kind != TokenKind::Identifier {
        return None;
    }
    let after = next_significant(tokens, j + 1)?;
    if tokens[after].is_punct(";") || tokens[after].is_punct(",") || tokens[after].is_punct(")")
        || tokens[after].is_op("=")
    {
        Some(j)
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
        let mut symbols = SymbolTables::default();
        run(&mut tree, &mut symbols);
        tree.tokens
            .iter()
            .filter(|t| !t.is_elided() && t.kind != TokenKind::Eof)
            .map(|t| t.text.clone())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn primitive_types_are_mapped() {
        let out = transpiled("fn f(i32 a) -> u8 { f64 x = 0; return 0; }");
        assert!(out.contains("int32_t a"), "{out}");
        assert!(out.contains("uint8_t"), "{out}");
        assert!(out.contains("double x"), "{out}");
    }

    #[test]
    fn named_constant_is_mapped() {
        let out = transpiled("fn f() -> i32 { i32 x = CZ_I32_MAX; return x; }");
        assert!(out.contains("= INT32_MAX ;"), "{out}");
    }

    #[test]
    fn underscore_param_is_renamed_and_annotated() {
        let out = transpiled("fn f(i32 _) -> void { }");
        assert!(out.contains("__attribute__((unused)) int32_t _cz_unused_0"), "{out}");
        assert!(!out.contains("i32 _"));
    }

    #[test]
    fn underscore_after_const_keeps_attribute_leftmost() {
        let out = transpiled("fn f(const i32 _) -> void { }");
        assert!(out.contains("__attribute__((unused)) const int32_t _cz_unused_0"), "{out}");
    }

    #[test]
    fn counter_is_unique_per_unit() {
        let out = transpiled("fn f(i32 _, i32 _) -> void { }");
        assert!(out.contains("_cz_unused_0"));
        assert!(out.contains("_cz_unused_1"));
    }
}
