// emit.rs — Emitter
//
// In-order traversal of the transformed tree, writing each token's `text`
// verbatim (language spec §4.4). Every `Preprocessor`-kind token (`#line`,
// the runtime's own `#define`s) starts on its own source line, since a
// `#line`/`#define` mid-line is not legal C — ordinary tokens are joined
// with a single space, which is always valid between C tokens even where
// it is not strictly required.
//
// Preconditions: every pass in `pass::ALL_PASSES` has run; `tree` holds no
//   surviving CZar-only syntax (cast<T>, #defer, foreach headers, ...).
// Postconditions: returns one `String` that is the complete translation
//   unit: POSIX feature-test macro, runtime preamble (assert/clock/log/
//   format subsystems) plus any P17-generated cleanup functions, then the
//   emitted source.
// Failure modes: none (a tree that reached here has already survived every
//   validation pass).
// Side effects: none.

use crate::symbols::SymbolTables;
use crate::token::TokenKind;
use crate::tree::Tree;

/// Render the transformed tree into one standards-conforming C11
/// translation unit, preceded by the runtime preamble.
pub fn emit(tree: &Tree, symbols: &SymbolTables) -> String {
    let mut out = String::new();
    out.push_str(crate::runtime::emit_feature_test_macro());
    out.push('\n');
    out.push_str(&crate::runtime::emit_assert_macros());
    out.push_str(&crate::runtime::emit_clock());
    out.push_str(&crate::runtime::emit_log_subsystem(
        symbols.pragma_ctx.debug_mode,
    ));
    out.push_str(&crate::runtime::emit_format_subsystem());

    if !symbols.generated_cleanup_fns.is_empty() {
        out.push_str(symbols.generated_cleanup_fns.as_str());
    }

    out.push_str(&emit_tokens(tree));
    out
}

fn emit_tokens(tree: &Tree) -> String {
    let mut out = String::new();
    let mut at_line_start = true;
    for tok in &tree.tokens {
        if tok.is_elided() || tok.kind == TokenKind::Eof {
            continue;
        }
        if tok.kind == TokenKind::Preprocessor {
            if !at_line_start {
                out.push('\n');
            }
            out.push_str(&tok.text);
            out.push('\n');
            at_line_start = true;
            continue;
        }
        if tok.kind == TokenKind::Comment {
            out.push_str(&tok.text);
            out.push('\n');
            at_line_start = true;
            continue;
        }
        if !at_line_start {
            out.push(' ');
        }
        out.push_str(&tok.text);
        at_line_start = false;
    }
    if !at_line_start {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    #[test]
    fn emits_feature_test_macro_and_tokens() {
        let tree = Tree::new(lex("int32_t main ( void ) { return 0 ; }").tokens);
        let symbols = SymbolTables::default();
        let text = emit(&tree, &symbols);
        assert!(text.starts_with("#define _POSIX_C_SOURCE 199309L\n"));
        assert!(text.contains("int32_t main ( void ) { return 0 ; }"));
    }

    #[test]
    fn preprocessor_token_gets_its_own_line() {
        let tree = Tree::new(lex("cz_log_info ( \"hi\" ) ;").tokens);
        let mut symbols = SymbolTables::default();
        symbols.pragma_ctx.debug_mode = true;
        let mut t = tree;
        crate::pass_xform_loglines::run(&mut t, "f.cz");
        let text = emit(&t, &symbols);
        assert!(text.contains("\n#line 1 \"f.cz\"\ncz_log_info"), "{text}");
    }

    #[test]
    fn generated_cleanup_functions_precede_emitted_source() {
        let tree = Tree::new(lex("int32_t main ( void ) { return 0 ; }").tokens);
        let mut symbols = SymbolTables::default();
        symbols
            .generated_cleanup_fns
            .push("static void _cz_cleanup_f_0(void **f) { fclose((*f)); }");
        let text = emit(&tree, &symbols);
        let cleanup_pos = text.find("_cz_cleanup_f_0").unwrap();
        let main_pos = text.find("main").unwrap();
        assert!(cleanup_pos < main_pos);
    }
}
