// pass_xform_fn.rs — P6: function transform
//
// CZar writes a function's return type *after* its parameter list
// (`fn name(params) -> Ret { ... }`); C wants it before the name. This pass
// performs that reordering for every plain (non-method) function
// declaration, rewrites `main()`/validated-empty `()` to `(void)`, and
// attaches `warn_unused_result`/`pure` attributes (language spec §4.3.1).
// Method declarations (`fn Type.name`/`fn Type:name`) are left untouched —
// P9 owns their reordering together with the receiver-parameter rewrite.
//
// Preconditions: P5 has run; every surviving `fn` declaration is valid.
// Postconditions: every non-method function declaration reads
//   `[attrs] RetType Name(params) { ... }` in C order.
// Failure modes: none — P5 already rejected anything this pass can't
//   handle; malformed input here would indicate an internal inconsistency.
// Side effects: mutates the tree.

use crate::scan::next_significant;
use crate::token::{Token, TokenKind};
use crate::tree::{apply_descending, Edit, Tree};

pub fn run(tree: &mut Tree) {
    let tokens = &tree.tokens;
    let mut edits = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].is_keyword("fn") {
            if let Some(decl) = plain_fn_decl(tokens, i) {
                edits.push(rewrite_decl(tokens, &decl));
                i = decl.body_open;
                continue;
            }
        }
        i += 1;
    }
    apply_descending(&mut tree.tokens, edits);
}

struct FnDecl {
    fn_idx: usize,
    name_idx: usize,
    open_paren: usize,
    close_paren: usize,
    ret_start: usize,
    body_open: usize,
}

/// Match `fn Name ( params ) -> RetType {`, skipping any declaration whose
/// name is qualified with `.`/`:` (a method, handled by P9).
fn plain_fn_decl(tokens: &[Token], fn_idx: usize) -> Option<FnDecl> {
    let name_idx = next_significant(tokens, fn_idx + 1)?;
    if tokens[name_idx].kind != TokenKind::Identifier {
        return None;
    }
    let open_paren = next_significant(tokens, name_idx + 1)?;
    if !tokens[open_paren].is_punct("(") {
        return None; // qualified name (`.`/`:`) — a method, not ours.
    }
    let close_paren = crate::scan::matching_close(tokens, open_paren)?;
    let arrow_idx = next_significant(tokens, close_paren + 1)?;
    if !tokens[arrow_idx].is_op("->") {
        return None;
    }
    let ret_start = next_significant(tokens, arrow_idx + 1)?;
    let body_open = (ret_start..tokens.len()).find(|&i| tokens[i].is_punct("{"))?;
    Some(FnDecl {
        fn_idx,
        name_idx,
        open_paren,
        close_paren,
        ret_start,
        body_open,
    })
}

fn is_void_only(tokens: &[Token], open: usize, close: usize) -> bool {
    next_significant(tokens, open + 1).map(|i| i >= close).unwrap_or(true)
}

fn all_params_read_only(tokens: &[Token], open: usize, close: usize) -> bool {
    !(open + 1..close).any(|i| tokens[i].is_keyword("mut"))
}

fn rewrite_decl(tokens: &[Token], decl: &FnDecl) -> Edit {
    let name = tokens[decl.name_idx].clone();
    let is_main = name.text == "main";
    let ret_span: Vec<Token> = significant_range(tokens, decl.ret_start, decl.body_open);
    let params_empty = is_void_only(tokens, decl.open_paren, decl.close_paren);
    let is_void_ret = ret_span.len() == 1 && ret_span[0].is_keyword("void");
    let is_pure = !is_main && all_params_read_only(tokens, decl.open_paren, decl.close_paren);

    let mut out = Vec::new();
    if !is_main {
        if !is_void_ret {
            out.extend(attribute_tokens("warn_unused_result", name.line, name.column));
        }
        if is_pure {
            out.extend(attribute_tokens("pure", name.line, name.column));
        }
    }

    if is_main {
        out.push(Token::new(TokenKind::Keyword, "int", name.line, name.column));
    } else {
        out.extend(ret_span);
    }
    out.push(name.clone());
    out.push(Token::new(TokenKind::Punctuation, "(", name.line, name.column));
    if params_empty {
        out.push(Token::new(TokenKind::Keyword, "void", name.line, name.column));
    } else {
        out.extend(significant_range(tokens, decl.open_paren + 1, decl.close_paren));
    }
    out.push(Token::new(TokenKind::Punctuation, ")", name.line, name.column));

    Edit::replace(decl.fn_idx, decl.body_open - decl.fn_idx, out)
}

fn significant_range(tokens: &[Token], start: usize, end: usize) -> Vec<Token> {
    (start..end)
        .filter(|&i| !tokens[i].is_elided() && tokens[i].kind != TokenKind::Comment)
        .map(|i| tokens[i].clone())
        .collect()
}

fn attribute_tokens(name: &str, line: usize, column: usize) -> Vec<Token> {
    let text = format!("__attribute__(({}))", name);
    vec![Token::new(TokenKind::Identifier, text, line, column)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn transpiled_text(src: &str) -> String {
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
    fn main_becomes_int_main_void() {
        let out = transpiled_text("fn main() -> i32 { return 0; }");
        assert!(out.starts_with("int main ( void )"), "{out}");
    }

    #[test]
    fn plain_function_return_type_moves_to_front() {
        let out = transpiled_text("fn add(i32 a, i32 b) -> i32 { return a + b; }");
        assert!(out.contains("i32 add ( i32 a , i32 b )"), "{out}");
        assert!(!out.contains("->"));
        assert!(!out.trim_start().starts_with("fn"));
    }

    #[test]
    fn non_void_function_gets_warn_unused_result() {
        let out = transpiled_text("fn add(i32 a, i32 b) -> i32 { return a + b; }");
        assert!(out.contains("__attribute__((warn_unused_result))"));
    }

    #[test]
    fn all_readonly_params_get_pure() {
        let out = transpiled_text("fn add(i32 a, i32 b) -> i32 { return a + b; }");
        assert!(out.contains("__attribute__((pure))"));
    }

    #[test]
    fn mut_param_suppresses_pure() {
        let out = transpiled_text("fn bump(mut i32 a) -> i32 { return a; }");
        assert!(!out.contains("__attribute__((pure))"));
    }

    #[test]
    fn void_return_skips_warn_unused_result() {
        let out = transpiled_text("fn log(i32 a) -> void { return; }");
        assert!(!out.contains("warn_unused_result"));
    }

    #[test]
    fn method_declarations_are_left_for_p9() {
        let out = transpiled_text("fn Vec2.len(Vec2 v) -> i32 { return v.x + v.y; }");
        assert!(out.contains("fn Vec2 . len"), "{out}");
    }
}
