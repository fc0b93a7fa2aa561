// pass_xform_named_args.rs — P15: named-argument transform
//
// Scans every function declaration (already in C parameter-list shape,
// P6/P9 having run) into `symbols.function_signatures`, then for each call
// site `f(name1 = v1, name2 = v2)` checks each `name_i` against parameter
// `i` of `f` and elides the `name_i =` prefix so the emitted C sees plain
// positional arguments (language spec §4.3.7).
//
// Preconditions: P14 has run.
// Postconditions: `symbols.function_signatures` holds every declared
//   function's ordered (name, type) parameter list; no call-site argument
//   label survives in the tree.
// Failure modes: `ERR_NAMED_ARG_ORDER` when a label names a real parameter
//   of `f` but at the wrong position; `ERR_NAMED_ARG_MISMATCH` when a label
//   names nothing in `f`'s signature at all.
// Side effects: mutates the tree and `symbols.function_signatures`.

use crate::diag::{codes, Diagnostic, Span};
use crate::scan::{enclosing_function, matching_close, next_significant};
use crate::symbols::SymbolTables;
use crate::token::{Token, TokenKind};
use crate::tree::{apply_descending, Edit, Tree};

pub fn run(tree: &mut Tree, symbols: &mut SymbolTables) -> Vec<Diagnostic> {
    scan_signatures(&tree.tokens, symbols);

    let mut diags = Vec::new();
    let mut edits = Vec::new();
    {
        let tokens = &tree.tokens;
        let mut i = 0;
        while i < tokens.len() {
            if tokens[i].is_elided() || tokens[i].kind != TokenKind::Identifier {
                i += 1;
                continue;
            }
            if let Some(call) = call_site(tokens, i, symbols) {
                check_and_elide_labels(tokens, &call, symbols, &mut edits, &mut diags);
                i = call.close + 1;
                continue;
            }
            i += 1;
        }
    }
    apply_descending(&mut tree.tokens, edits);
    diags
}

fn scan_signatures(tokens: &[Token], symbols: &mut SymbolTables) {
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].kind == TokenKind::Identifier && !tokens[i].is_elided() {
            if let Some((name, open, close)) = decl_header(tokens, i) {
                let params = parse_params(tokens, open, close);
                symbols.function_signatures.insert(name, params);
                i = close + 1;
                continue;
            }
        }
        i += 1;
    }
}

/// `Name ( params ) {` where `Name` is preceded by at least one
/// non-punctuation token (its return type, possibly attribute-prefixed).
fn decl_header(tokens: &[Token], name_idx: usize) -> Option<(String, usize, usize)> {
    let open = next_significant(tokens, name_idx + 1)?;
    if !tokens[open].is_punct("(") {
        return None;
    }
    let close = matching_close(tokens, open)?;
    let after = next_significant(tokens, close + 1)?;
    if !tokens[after].is_punct("{") {
        return None;
    }
    // Must be preceded by something (a return type) — excludes a bare call
    // statement `Name(args) { ... }`, which isn't valid C/CZar syntax
    // anyway, so this is a conservative guard rather than a load-bearing one.
    if name_idx == 0 {
        return None;
    }
    Some((tokens[name_idx].text.clone(), open, close))
}

struct Param {
    name: String,
    type_text: String,
}

fn parse_params(tokens: &[Token], open: usize, close: usize) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut i = open + 1;
    let mut depth = 0i32;
    let mut seg_start = i;
    while i < close {
        let tok = &tokens[i];
        if tok.is_punct("(") || tok.is_punct("[") {
            depth += 1;
        } else if tok.is_punct(")") || tok.is_punct("]") {
            depth -= 1;
        } else if tok.is_punct(",") && depth == 0 {
            if let Some(p) = one_param(tokens, seg_start, i) {
                params.push((p.name, p.type_text));
            }
            seg_start = i + 1;
        }
        i += 1;
    }
    if let Some(p) = one_param(tokens, seg_start, close) {
        params.push((p.name, p.type_text));
    }
    params
}

/// Split one `[mut] [const] Type [*...] name` segment into (name, type).
fn one_param(tokens: &[Token], start: usize, end: usize) -> Option<Param> {
    let indices: Vec<usize> = (start..end)
        .filter(|&i| !tokens[i].is_elided() && tokens[i].kind != TokenKind::Comment)
        .collect();
    if indices.is_empty() || tokens[indices[0]].is_keyword("void") {
        return None;
    }
    let name_pos = indices.iter().rposition(|&i| tokens[i].kind == TokenKind::Identifier)?;
    let name_idx = indices[name_pos];
    let type_text = indices[..name_pos]
        .iter()
        .map(|&i| tokens[i].text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    Some(Param {
        name: tokens[name_idx].text.clone(),
        type_text,
    })
}

struct CallSite {
    open: usize,
    close: usize,
    name: String,
}

fn call_site(tokens: &[Token], name_idx: usize, symbols: &SymbolTables) -> Option<CallSite> {
    let open = next_significant(tokens, name_idx + 1)?;
    if !tokens[open].is_punct("(") {
        return None;
    }
    let close = matching_close(tokens, open)?;
    // A declaration header (followed by `{`) is not a call.
    if let Some(after) = next_significant(tokens, close + 1) {
        if tokens[after].is_punct("{") {
            return None;
        }
    }
    let name = tokens[name_idx].text.clone();
    symbols.function_signatures.params(&name)?;
    Some(CallSite { open, close, name })
}

struct Arg {
    label: Option<(usize, usize)>, // (name_idx, eq_idx)
    value_start: usize,
}

fn split_args(tokens: &[Token], open: usize, close: usize) -> Vec<Arg> {
    let mut args = Vec::new();
    let mut i = open + 1;
    let mut depth = 0i32;
    let mut seg_start = next_significant(tokens, i).filter(|&p| p < close);
    while i < close {
        let tok = &tokens[i];
        if tok.is_punct("(") || tok.is_punct("[") {
            depth += 1;
        } else if tok.is_punct(")") || tok.is_punct("]") {
            depth -= 1;
        } else if tok.is_punct(",") && depth == 0 {
            if let Some(s) = seg_start {
                args.push(parse_arg(tokens, s));
            }
            seg_start = next_significant(tokens, i + 1).filter(|&p| p < close);
        }
        i += 1;
    }
    if let Some(s) = seg_start {
        args.push(parse_arg(tokens, s));
    }
    args
}

fn parse_arg(tokens: &[Token], start: usize) -> Arg {
    if tokens[start].kind == TokenKind::Identifier {
        if let Some(next) = next_significant(tokens, start + 1) {
            if tokens[next].is_op("=") {
                let value_start = next_significant(tokens, next + 1).unwrap_or(next + 1);
                return Arg {
                    label: Some((start, next)),
                    value_start,
                };
            }
        }
    }
    Arg {
        label: None,
        value_start: start,
    }
}

fn check_and_elide_labels(
    tokens: &[Token],
    call: &CallSite,
    symbols: &SymbolTables,
    edits: &mut Vec<Edit>,
    diags: &mut Vec<Diagnostic>,
) {
    let params = symbols.function_signatures.params(&call.name).unwrap_or(&[]);
    let args = split_args(tokens, call.open, call.close);
    for (pos, arg) in args.iter().enumerate() {
        let Some((name_idx, eq_idx)) = arg.label else {
            continue;
        };
        let label = &tokens[name_idx].text;
        match params.get(pos) {
            Some((expected, _)) if expected == label => {
                edits.push(Edit::remove(name_idx, eq_idx - name_idx + 1));
            }
            Some((expected, _)) => {
                diags.push(
                    Diagnostic::error(
                        codes::ERR_NAMED_ARG_ORDER,
                        Span::new(tokens[name_idx].line, tokens[name_idx].column),
                        format!(
                            "Named argument '{label}' at position {} does not match expected parameter '{expected}'",
                            pos + 1
                        ),
                    )
                    .with_function_opt(enclosing_function(tokens, call.open)),
                );
                return;
            }
            None => {
                diags.push(
                    Diagnostic::error(
                        codes::ERR_NAMED_ARG_MISMATCH,
                        Span::new(tokens[name_idx].line, tokens[name_idx].column),
                        format!(
                            "'{}' takes {} argument(s); named argument '{label}' at position {} is out of range",
                            call.name,
                            params.len(),
                            pos + 1
                        ),
                    )
                    .with_function_opt(enclosing_function(tokens, call.open)),
                );
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn transpiled(src: &str) -> (String, Vec<Diagnostic>) {
        let mut tree = Tree::new(lex(src).tokens);
        let mut symbols = SymbolTables::default();
        let diags = run(&mut tree, &mut symbols);
        let text = tree
            .tokens
            .iter()
            .filter(|t| !t.is_elided() && t.kind != TokenKind::Eof)
            .map(|t| t.text.clone())
            .collect::<Vec<_>>()
            .join(" ");
        (text, diags)
    }

    const MOVE_DECL: &str = "void move ( i32 x , i32 y ) { } ";

    #[test]
    fn in_order_labels_are_elided() {
        let src = format!("{MOVE_DECL} fn g ( ) -> i32 {{ move ( x = 1 , y = 2 ) ; return 0 ; }}");
        let (out, diags) = transpiled(&src);
        assert!(diags.is_empty(), "{diags:?}");
        assert!(out.contains("move ( 1 , 2 ) ;"), "{out}");
    }

    #[test]
    fn reversed_labels_error() {
        let src = format!("{MOVE_DECL} fn g ( ) -> i32 {{ move ( y = 2 , x = 1 ) ; return 0 ; }}");
        let (_out, diags) = transpiled(&src);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, codes::ERR_NAMED_ARG_ORDER);
        assert!(diags[0].message.contains("'y'"));
    }

    #[test]
    fn unlabelled_call_is_untouched() {
        let src = format!("{MOVE_DECL} fn g ( ) -> i32 {{ move ( 1 , 2 ) ; return 0 ; }}");
        let (out, diags) = transpiled(&src);
        assert!(diags.is_empty());
        assert!(out.contains("move ( 1 , 2 ) ;"));
    }

    #[test]
    fn unknown_label_name_errors() {
        let src = format!("{MOVE_DECL} fn g ( ) -> i32 {{ move ( z = 1 , y = 2 ) ; return 0 ; }}");
        let (_out, diags) = transpiled(&src);
        assert!(diags.iter().any(|d| d.code == codes::ERR_NAMED_ARG_MISMATCH));
    }
}
