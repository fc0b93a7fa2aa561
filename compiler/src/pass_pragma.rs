// pass_pragma.rs — P1: pragma parse
//
// Scans for `#pragma czar debug(on|off)` and sets `pragma_ctx.debug_mode`
// accordingly (language spec §6). The pragma is consumed entirely — it has
// no C equivalent, so its tokens are elided rather than passed through.
//
// Preconditions: none (first pass to run).
// Postconditions: `symbols.pragma_ctx.debug_mode` reflects the last pragma
//   seen in source order; all consumed tokens are elided.
// Failure modes: a malformed `#pragma czar ...` is left untouched (and will
//   likely confuse the C compiler downstream) rather than erroring — this
//   pass only recognizes the one documented form.
// Side effects: none beyond symbol table + tree mutation.

use crate::diag::Diagnostic;
use crate::symbols::SymbolTables;
use crate::token::TokenKind;
use crate::tree::Tree;

pub fn run(tree: &mut Tree, symbols: &mut SymbolTables) -> Vec<Diagnostic> {
    let tokens = &mut tree.tokens;
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].kind == TokenKind::Preprocessor && tokens[i].text == "#pragma" {
            if let Some(end) = try_match_czar_debug_pragma(tokens, i) {
                let on = tokens[i + 3].text == "on";
                symbols.pragma_ctx.debug_mode = on;
                for tok in &mut tokens[i..=end] {
                    tok.elide();
                }
                i = end + 1;
                continue;
            }
        }
        i += 1;
    }
    Vec::new()
}

/// If `tokens[start..]` begins `#pragma czar debug ( on|off )`, return the
/// index of the closing `)`.
fn try_match_czar_debug_pragma(
    tokens: &[crate::token::Token],
    start: usize,
) -> Option<usize> {
    let get = |off: usize| tokens.get(start + off);
    if get(1)?.text != "czar" {
        return None;
    }
    if get(2)?.text != "debug" {
        return None;
    }
    if !get(3)?.is_punct("(") {
        return None;
    }
    let mode = get(4)?;
    if mode.text != "on" && mode.text != "off" {
        return None;
    }
    if !get(5)?.is_punct(")") {
        return None;
    }
    Some(start + 5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn run_on(src: &str) -> (Tree, SymbolTables) {
        let mut tree = Tree::new(lex(src).tokens);
        let mut symbols = SymbolTables::default();
        run(&mut tree, &mut symbols);
        (tree, symbols)
    }

    #[test]
    fn debug_off_sets_flag() {
        let (_tree, symbols) = run_on("#pragma czar debug(off)\nfn main() -> i32 { return 0; }");
        assert!(!symbols.pragma_ctx.debug_mode);
    }

    #[test]
    fn debug_on_is_default_and_explicit() {
        let (_tree, symbols) = run_on("#pragma czar debug(on)\n");
        assert!(symbols.pragma_ctx.debug_mode);
    }

    #[test]
    fn pragma_tokens_are_elided() {
        let (tree, _symbols) = run_on("#pragma czar debug(off)\nfn f() -> void {}");
        let remaining: String = tree
            .tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join("");
        assert!(!remaining.contains("pragma"));
    }

    #[test]
    fn absent_pragma_keeps_default() {
        let (_tree, symbols) = run_on("fn f() -> void {}");
        assert!(symbols.pragma_ctx.debug_mode);
    }
}
