// pass_xform_loglines.rs — P14: expand log #line directives
//
// Every `cz_log_*(...)` call is preceded by a `#line N "file"` preprocessor
// token so that downstream C diagnostics (and any debugger) point back at
// the `.cz` source line rather than the generated translation unit
// (language spec §4.3.6). The emitter gives `Preprocessor`-kind tokens
// their own source line, so inserting the token here is sufficient.
//
// Preconditions: P13 has run.
// Postconditions: every `cz_log_*` call site is immediately preceded by a
//   `#line` directive naming its original line and file.
// Failure modes: none.
// Side effects: mutates the tree.

use crate::scan::next_significant;
use crate::token::{Token, TokenKind};
use crate::tree::{apply_descending, Edit, Tree};

pub fn run(tree: &mut Tree, filename: &str) {
    let mut edits = Vec::new();
    {
        let tokens = &tree.tokens;
        for i in 0..tokens.len() {
            if tokens[i].is_elided() || tokens[i].kind != TokenKind::Identifier {
                continue;
            }
            if !tokens[i].text.starts_with("cz_log_") {
                continue;
            }
            if next_significant(tokens, i + 1).map(|p| tokens[p].is_punct("(")) != Some(true) {
                continue;
            }
            edits.push(Edit::insert(
                i,
                vec![Token::new(
                    TokenKind::Preprocessor,
                    format!("#line {} \"{}\"", tokens[i].line, filename),
                    tokens[i].line,
                    tokens[i].column,
                )],
            ));
        }
    }
    apply_descending(&mut tree.tokens, edits);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn transpiled(src: &str) -> Vec<String> {
        let mut tree = Tree::new(lex(src).tokens);
        run(&mut tree, "f.cz");
        tree.tokens
            .iter()
            .filter(|t| !t.is_elided() && t.kind != TokenKind::Eof)
            .map(|t| t.text.clone())
            .collect()
    }

    #[test]
    fn log_call_gets_line_directive() {
        let out = transpiled("fn f() -> void {\n  cz_log_info(\"hi\");\n}");
        let idx = out.iter().position(|t| t == "cz_log_info").unwrap();
        assert_eq!(out[idx - 1], "#line 2 \"f.cz\"");
    }

    #[test]
    fn non_log_call_is_untouched() {
        let out = transpiled("fn f() -> void { other_call(); }");
        assert!(!out.iter().any(|t| t.starts_with("#line")));
    }

    #[test]
    fn bare_identifier_named_like_log_is_untouched() {
        let out = transpiled("fn f() -> void { i32 cz_log_x = 1; }");
        assert!(!out.iter().any(|t| t.starts_with("#line")));
    }
}
