// pass_xform_names.rs — P10: struct-name replacement, P11: auto-dereference
//
// P10 rewrites every identifier *use* of a recorded struct base name
// (`Vec2`) to its typedef name (`Vec2_t`), except immediately after
// `struct`/`typedef struct` where the tag name must stay bare (language
// spec §4.3.4, §9 open question: P9 runs first so a method's generated
// symbol keeps its base name — only the *type* positions get rewritten
// here). P11 then rewrites `.` to `->` wherever the left operand is a
// known pointer — a declared `Type *name`/parameter, or `self` inside any
// method (every method's receiver is a pointer per P9's lowering).
//
// Preconditions: P9 has run.
// Postconditions: no bare struct base name remains in a type position;
//   every `.` on a pointer-typed left operand is `->`.
// Failure modes: none — best-effort textual recognition, consistent with
//   the flat-token design's lack of full type inference.
// Side effects: mutates the tree.

use std::collections::HashSet;

use crate::scan::{next_significant, prev_significant};
use crate::symbols::SymbolTables;
use crate::token::TokenKind;
use crate::tree::Tree;

pub fn run_rewrite_struct_names(tree: &mut Tree, symbols: &SymbolTables) {
    let tokens = &mut tree.tokens;
    for i in 0..tokens.len() {
        if tokens[i].is_elided() || tokens[i].kind != TokenKind::Identifier {
            continue;
        }
        let Some(typedef_name) = symbols.struct_map.typedef_name(&tokens[i].text) else {
            continue;
        };
        if preceded_by_struct_keyword(tokens, i) {
            continue;
        }
        tokens[i].text = typedef_name.to_string();
    }
}

/// True if the token immediately before `idx` is `struct`, or `struct` is
/// preceded by `typedef` (the tag-name position P7 writes, which must keep
/// the bare `Name_s`-suffixed form it already has — not `Name_t`).
fn preceded_by_struct_keyword(tokens: &[crate::token::Token], idx: usize) -> bool {
    match prev_significant(tokens, idx.saturating_sub(1)) {
        Some(p) if idx > 0 => tokens[p].is_keyword("struct"),
        _ => false,
    }
}

pub fn run_auto_deref(tree: &mut Tree) {
    let pointer_names = collect_pointer_names(&tree.tokens);
    let tokens = &mut tree.tokens;
    for i in 0..tokens.len() {
        if tokens[i].is_elided() || !tokens[i].is_op(".") {
            continue;
        }
        let Some(left) = prev_significant(tokens, i.saturating_sub(1)).filter(|&p| p < i) else {
            continue;
        };
        let is_pointer_operand = tokens[left].kind == TokenKind::Identifier
            && (tokens[left].text == "self" || pointer_names.contains(&tokens[left].text));
        if is_pointer_operand {
            tokens[i].text = "->".to_string();
        }
    }
}

/// Scan every declaration/parameter of the form `Type * name` (CZar pointer
/// syntax) and collect the declared variable names. Best-effort textual
/// recognition — sufficient because P9 already normalized every method
/// receiver to `self`, and ordinary pointer locals/params are the only
/// other source of a pointer-typed left operand.
fn collect_pointer_names(tokens: &[crate::token::Token]) -> HashSet<String> {
    let mut names = HashSet::new();
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].is_op("*") && !tokens[i].is_elided() {
            if let Some(name_idx) = next_significant(tokens, i + 1) {
                if tokens[name_idx].kind == TokenKind::Identifier {
                    names.insert(tokens[name_idx].text.clone());
                }
            }
        }
        i += 1;
    }
    names
}
