// pass_xform_defer.rs — P17: defer transform
//
// `#defer` has two shapes (language spec §4.3.9): declaration-bound
// (`T v = init() #defer { code };`) and standalone (`#defer { code };`).
// The declaration-bound form generates a unique cleanup function and
// attaches it via `__attribute__((cleanup(...)))`; the standalone form has
// no sound lowering without GCC nested functions (design notes §9), so it
// is rejected rather than emitted as unsound or compiler-specific code.
//
// Preconditions: P16 has run.
// Postconditions: no `#defer` token survives on a declaration; its
//   generated cleanup function text is recorded in
//   `symbols.generated_cleanup_fns` for the emitter to prepend.
// Failure modes: `ERR_STANDALONE_DEFER_UNSUPPORTED` for a `#defer` with no
//   enclosing declaration.
// Side effects: mutates the tree, `symbols.defer_counter`,
//   `symbols.generated_cleanup_fns`.

use crate::diag::{codes, Diagnostic, Span};
use crate::scan::{enclosing_function, matching_close, next_significant, prev_significant};
use crate::symbols::SymbolTables;
use crate::token::{Token, TokenKind};
use crate::tree::{apply_descending, Edit, Tree};

pub fn run(tree: &mut Tree, symbols: &mut SymbolTables) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    let mut edits = Vec::new();
    {
        let tokens = &tree.tokens;
        let mut i = 0;
        while i < tokens.len() {
            if tokens[i].is_elided()
                || tokens[i].kind != TokenKind::Preprocessor
                || tokens[i].text != "#defer"
            {
                i += 1;
                continue;
            }
            let Some(body_open) = next_significant(tokens, i + 1).filter(|&p| tokens[p].is_punct("{"))
            else {
                i += 1;
                continue;
            };
            let Some(body_close) = matching_close(tokens, body_open) else {
                i += 1;
                continue;
            };
            match declaration_for(tokens, i) {
                Some((stmt_start, name_idx)) => {
                    let var_name = tokens[name_idx].text.clone();
                    let n = symbols.defer_counter.next();
                    let fn_name = format!("_cz_cleanup_{var_name}_{n}");
                    let body = cleanup_body(tokens, body_open, body_close, &var_name);
                    symbols.generated_cleanup_fns.push(&format!(
                        "static void {fn_name}(void **{var_name}) {{ {body} }}"
                    ));

                    let type_idx = next_significant(tokens, stmt_start).unwrap_or(stmt_start);
                    let line = tokens[type_idx].line;
                    let col = tokens[type_idx].column;
                    edits.push(Edit::insert(
                        type_idx,
                        vec![Token::new(
                            TokenKind::Identifier,
                            format!("__attribute__((cleanup({fn_name})))"),
                            line,
                            col,
                        )],
                    ));
                    edits.push(Edit::remove(i, body_close - i + 1));
                }
                None => {
                    diags.push(
                        Diagnostic::error(
                            codes::ERR_STANDALONE_DEFER_UNSUPPORTED,
                            Span::new(tokens[i].line, tokens[i].column),
                            "standalone #defer has no sound lowering outside GCC nested functions; attach it to a declaration instead".to_string(),
                        )
                        .with_function_opt(enclosing_function(tokens, i)),
                    );
                }
            }
            i = body_close + 1;
        }
    }
    apply_descending(&mut tree.tokens, edits);
    diags
}

/// Walk backward from `#defer` to the start of its statement, then forward
/// looking for a top-level `=`. Returns `(statement_start, variable_name_idx)`
/// if this `#defer` sits on a declaration's initializer.
fn declaration_for(tokens: &[Token], defer_idx: usize) -> Option<(usize, usize)> {
    let mut depth = 0i32;
    let mut stmt_start = 0;
    let mut j = defer_idx;
    while j > 0 {
        j -= 1;
        let tok = &tokens[j];
        if tok.is_elided() {
            continue;
        }
        if tok.kind == TokenKind::Punctuation {
            match tok.text.as_str() {
                ")" | "]" => depth += 1,
                "(" | "[" => depth -= 1,
                ";" | "{" | "}" if depth == 0 => {
                    stmt_start = j + 1;
                    break;
                }
                _ => {}
            }
        }
    }

    let mut depth = 0i32;
    let mut eq_idx = None;
    let mut k = stmt_start;
    while k < defer_idx {
        let tok = &tokens[k];
        if !tok.is_elided() && tok.kind == TokenKind::Punctuation {
            match tok.text.as_str() {
                "(" | "[" => depth += 1,
                ")" | "]" => depth -= 1,
                _ => {}
            }
        }
        if !tok.is_elided() && depth == 0 && tok.is_op("=") {
            eq_idx = Some(k);
            break;
        }
        k += 1;
    }
    let eq_idx = eq_idx?;
    let name_idx = prev_significant(tokens, eq_idx.saturating_sub(1)).filter(|&p| p >= stmt_start)?;
    if tokens[name_idx].kind != TokenKind::Identifier {
        return None;
    }
    Some((stmt_start, name_idx))
}

fn cleanup_body(tokens: &[Token], body_open: usize, body_close: usize, var_name: &str) -> String {
    (body_open + 1..body_close)
        .filter(|&i| !tokens[i].is_elided() && tokens[i].kind != TokenKind::Comment)
        .map(|i| {
            if tokens[i].kind == TokenKind::Identifier && tokens[i].text == var_name {
                format!("(*{var_name})")
            } else {
                tokens[i].text.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
