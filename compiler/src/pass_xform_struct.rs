// pass_xform_struct.rs — P7: struct transform, P8: struct-literal transform
//
// P7 turns every top-level `struct Name { ... };` into a named C typedef
// pair (`typedef struct Name_s { ... } Name_t;`) and records `Name ->
// Name_t` in the struct map. P8 normalizes the three struct-literal
// initializer shapes down to one (language spec §4.3.2).
//
// Preconditions: P6 has run.
// Postconditions: `symbols.struct_map` holds every top-level struct's
//   typedef name; every struct-literal initializer reads `{ ... }` (no
//   leading type-name token, empty bodies carry a `0`).
// Failure modes: none.
// Side effects: mutates the tree and `symbols.struct_map`.

use crate::scan::{matching_close, next_significant};
use crate::symbols::SymbolTables;
use crate::token::{Token, TokenKind};
use crate::tree::{apply_descending, Edit, Tree};
use crate::typetab::looks_like_type;

pub fn run_structs(tree: &mut Tree, symbols: &mut SymbolTables) {
    let mut edits = Vec::new();
    let mut i = 0;
    {
        let tokens = &mut tree.tokens;
        while i < tokens.len() {
            if tokens[i].is_keyword("struct") {
                if let Some(decl) = struct_decl(tokens, i) {
                    tokens[decl.name_idx].text = format!("{}_s", tokens[decl.name_idx].text);
                    let line = tokens[decl.name_idx].line;
                    let col = tokens[decl.name_idx].column;
                    symbols.struct_map.insert(decl.base_name.clone(), format!("{}_t", decl.base_name));
                    edits.push(Edit::insert(
                        i,
                        vec![Token::new(TokenKind::Keyword, "typedef", line, col)],
                    ));
                    edits.push(Edit::insert(
                        decl.semi_idx,
                        vec![Token::new(
                            TokenKind::Identifier,
                            format!("{}_t", decl.base_name),
                            line,
                            col,
                        )],
                    ));
                    i = decl.semi_idx + 1;
                    continue;
                }
            }
            i += 1;
        }
    }
    apply_descending(&mut tree.tokens, edits);
}

struct StructDecl {
    name_idx: usize,
    base_name: String,
    semi_idx: usize,
}

/// `struct Name { ... } ;` at any scope — top-level is the common case, but
/// the pattern itself is scope-agnostic.
fn struct_decl(tokens: &[Token], struct_idx: usize) -> Option<StructDecl> {
    let name_idx = next_significant(tokens, struct_idx + 1)?;
    if tokens[name_idx].kind != TokenKind::Identifier {
        return None;
    }
    let base_name = tokens[name_idx].text.clone();
    let open = next_significant(tokens, name_idx + 1)?;
    if !tokens[open].is_punct("{") {
        return None;
    }
    let close = matching_close(tokens, open)?;
    let semi_idx = next_significant(tokens, close + 1)?;
    if !tokens[semi_idx].is_punct(";") {
        return None;
    }
    Some(StructDecl {
        name_idx,
        base_name,
        semi_idx,
    })
}

pub fn run_struct_lits(tree: &mut Tree) {
    let mut edits = Vec::new();
    let tokens = &mut tree.tokens;
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].is_op("=") {
            if let Some(lit) = struct_literal(tokens, i) {
                if let Some(type_idx) = lit.type_idx {
                    tokens[type_idx].elide();
                }
                if lit.is_empty {
                    edits.push(Edit::insert(
                        lit.open + 1,
                        vec![Token::new(
                            TokenKind::Number,
                            "0",
                            tokens[lit.open].line,
                            tokens[lit.open].column,
                        )],
                    ));
                }
                i = lit.close + 1;
                continue;
            }
        }
        i += 1;
    }
    apply_descending(&mut tree.tokens, edits);
}

struct StructLiteral {
    type_idx: Option<usize>,
    open: usize,
    close: usize,
    is_empty: bool,
}

/// `= {}`, `= Type {}`, or `= Type { ... }` right after an `=`.
fn struct_literal(tokens: &[Token], eq_idx: usize) -> Option<StructLiteral> {
    let next = next_significant(tokens, eq_idx + 1)?;
    let (type_idx, open) = if tokens[next].is_punct("{") {
        (None, next)
    } else if looks_like_type(tokens[next].kind, &tokens[next].text) {
        let open = next_significant(tokens, next + 1)?;
        if !tokens[open].is_punct("{") {
            return None;
        }
        (Some(next), open)
    } else {
        return None;
    };
    let close = matching_close(tokens, open)?;
    let is_empty = next_significant(tokens, open + 1).map(|i| i >= close).unwrap_or(true);
    Some(StructLiteral {
        type_idx,
        open,
        close,
        is_empty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn transpiled(src: &str) -> (String, SymbolTables) {
        let mut tree = Tree::new(lex(src).tokens);
        let mut symbols = SymbolTables::default();
        run_structs(&mut tree, &mut symbols);
        run_struct_lits(&mut tree);
        let text = tree
            .tokens
            .iter()
            .filter(|t| !t.is_elided() && t.kind != TokenKind::Eof)
            .map(|t| t.text.clone())
            .collect::<Vec<_>>()
            .join(" ");
        (text, symbols)
    }

    #[test]
    fn struct_becomes_typedef_pair() {
        let (out, symbols) = transpiled("struct Vec2 { i32 x; i32 y; };");
        assert_eq!(out, "typedef struct Vec2_s { i32 x ; i32 y ; } Vec2_t ;");
        assert_eq!(symbols.struct_map.typedef_name("Vec2"), Some("Vec2_t"));
    }

    #[test]
    fn empty_struct_literal_becomes_zero() {
        let (out, _) = transpiled("fn f() -> void { Vec2 v = {}; }");
        assert!(out.contains("Vec2 v = { 0 } ;"), "{out}");
    }

    #[test]
    fn typed_empty_struct_literal_elides_type_and_zeros() {
        let (out, _) = transpiled("fn f() -> void { Vec2 v = Vec2 {}; }");
        assert!(out.contains("Vec2 v = { 0 } ;"), "{out}");
    }

    #[test]
    fn typed_nonempty_struct_literal_elides_type_only() {
        let (out, _) = transpiled("fn f() -> void { Vec2 v = Vec2 { 1, 2 }; }");
        assert!(out.contains("Vec2 v = { 1 , 2 } ;"), "{out}");
    }
}
