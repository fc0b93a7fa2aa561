// pass_xform_method.rs — P9: method transform
//
// `fn Type.name(Type self, ...rest) -> R { ... }` (read-only receiver) and
// `fn Type:name(Type self, ...rest) -> R { ... }` (mutable receiver) become
// free functions `R Type_name(const Type_t * self, ...rest)` / `R
// Type_name(Type_t * self, ...rest)`. Call sites `obj.name(args)` and
// `obj:name(args)` become `Type_name(&obj, args)` / `Type_name(obj, args)`
// (language spec §4.3.3). Runs before P10 so the generated free-function
// symbol keeps the method's base name — only the receiver's *type* token is
// renamed here, ahead of P10's general identifier rewrite.
//
// Preconditions: P8 has run.
// Postconditions: no `fn Type.name`/`fn Type:name` declarations remain;
//   every recognized call site is rewritten to the free-function form.
// Failure modes: a call site naming a method that was never declared is
//   left untouched (best-effort: this pass has no full symbol resolution).
// Side effects: mutates the tree.

use std::collections::HashMap;

use crate::scan::{matching_close, next_significant};
use crate::symbols::SymbolTables;
use crate::token::{Token, TokenKind};
use crate::tree::{apply_descending, Edit, Tree};

struct MethodInfo {
    owner: String,
    is_const: bool,
}

pub fn run(tree: &mut Tree, symbols: &SymbolTables) {
    let mut methods: HashMap<String, MethodInfo> = HashMap::new();
    let mut decl_edits = Vec::new();
    {
        let tokens = &tree.tokens;
        let mut i = 0;
        while i < tokens.len() {
            if tokens[i].is_keyword("fn") {
                if let Some(decl) = method_decl(tokens, i) {
                    decl_edits.push(rewrite_method_decl(tokens, &decl, symbols));
                    methods.insert(
                        decl.method_name.clone(),
                        MethodInfo {
                            owner: decl.type_name.clone(),
                            is_const: decl.is_const,
                        },
                    );
                    i = decl.body_open;
                    continue;
                }
            }
            i += 1;
        }
    }
    apply_descending(&mut tree.tokens, decl_edits);

    let mut call_edits = Vec::new();
    {
        let tokens = &tree.tokens;
        let mut i = 0;
        while i < tokens.len() {
            if let Some(call) = call_site(tokens, i, &methods) {
                call_edits.push(rewrite_call_site(tokens, &call, &methods));
                i = call.close_paren + 1;
                continue;
            }
            i += 1;
        }
    }
    apply_descending(&mut tree.tokens, call_edits);
}

struct MethodDecl {
    fn_idx: usize,
    type_name: String,
    method_name: String,
    is_const: bool,
    open_paren: usize,
    close_paren: usize,
    ret_start: usize,
    body_open: usize,
}

fn method_decl(tokens: &[Token], fn_idx: usize) -> Option<MethodDecl> {
    let type_idx = next_significant(tokens, fn_idx + 1)?;
    if tokens[type_idx].kind != TokenKind::Identifier {
        return None;
    }
    let sep_idx = next_significant(tokens, type_idx + 1)?;
    let is_const = if tokens[sep_idx].is_op(".") {
        true
    } else if tokens[sep_idx].is_punct(":") {
        false
    } else {
        return None;
    };
    let name_idx = next_significant(tokens, sep_idx + 1)?;
    if tokens[name_idx].kind != TokenKind::Identifier {
        return None;
    }
    let open_paren = next_significant(tokens, name_idx + 1)?;
    if !tokens[open_paren].is_punct("(") {
        return None;
    }
    let close_paren = matching_close(tokens, open_paren)?;
    let arrow_idx = next_significant(tokens, close_paren + 1)?;
    if !tokens[arrow_idx].is_op("->") {
        return None;
    }
    let ret_start = next_significant(tokens, arrow_idx + 1)?;
    let body_open = (ret_start..tokens.len()).find(|&i| tokens[i].is_punct("{"))?;
    Some(MethodDecl {
        fn_idx,
        type_name: tokens[type_idx].text.clone(),
        method_name: tokens[name_idx].text.clone(),
        is_const,
        open_paren,
        close_paren,
        ret_start,
        body_open,
    })
}

fn rewrite_method_decl(tokens: &[Token], decl: &MethodDecl, symbols: &SymbolTables) -> Edit {
    let line = tokens[decl.fn_idx].line;
    let col = tokens[decl.fn_idx].column;
    let ret_span = significant_range(tokens, decl.ret_start, decl.body_open);
    let receiver_type = symbols
        .struct_map
        .typedef_name(&decl.type_name)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}_t", decl.type_name));

    let mut out = Vec::new();
    out.extend(ret_span);
    out.push(Token::new(
        TokenKind::Identifier,
        format!("{}_{}", decl.type_name, decl.method_name),
        line,
        col,
    ));
    out.push(Token::new(TokenKind::Punctuation, "(", line, col));
    if decl.is_const {
        // Synthetic: P16's `reject_user_const` must not mistake this
        // tool-inserted `const` for user-written source text, and its
        // declaration scan must not apply a second round of
        // constification on top of it (see pass_xform_mutability.rs).
        out.push(Token::new(TokenKind::Keyword, "const", line, col).mark_synthetic());
    } else {
        // `:` (mutable) receivers are CZar's one legal `mut`-on-pointer-
        // parameter case; spelling it out as an explicit `mut` here lets
        // P16 take its existing mut-strips-cleanly path instead of
        // falling through to "no annotation means const by default".
        out.push(Token::new(TokenKind::Keyword, "mut", line, col));
    }
    out.push(Token::new(TokenKind::Identifier, receiver_type, line, col));
    out.push(Token::new(TokenKind::Operator, "*", line, col));

    // Receiver parameter: `Type name` — keep the declared parameter name,
    // drop its (now-redundant) leading type token.
    if let Some(recv_name_idx) = receiver_param_name(tokens, decl.open_paren, decl.close_paren) {
        out.push(tokens[recv_name_idx].clone());
        if let Some(comma_idx) = first_top_level_comma(tokens, recv_name_idx + 1, decl.close_paren) {
            out.extend(significant_range(tokens, comma_idx, decl.close_paren));
        }
    }
    out.push(Token::new(TokenKind::Punctuation, ")", line, col));

    Edit::replace(decl.fn_idx, decl.body_open - decl.fn_idx, out)
}

/// The identifier immediately after the first parameter's type token.
fn receiver_param_name(tokens: &[Token], open: usize, close: usize) -> Option<usize> {
    let type_idx = next_significant(tokens, open + 1).filter(|&i| i < close)?;
    let name_idx = next_significant(tokens, type_idx + 1).filter(|&i| i < close)?;
    Some(name_idx)
}

fn first_top_level_comma(tokens: &[Token], start: usize, end: usize) -> Option<usize> {
    let mut depth = 0i32;
    for i in start..end {
        let tok = &tokens[i];
        if tok.is_punct("(") || tok.is_punct("[") {
            depth += 1;
        } else if tok.is_punct(")") || tok.is_punct("]") {
            depth -= 1;
        } else if tok.is_punct(",") && depth == 0 {
            return Some(i);
        }
    }
    None
}

fn significant_range(tokens: &[Token], start: usize, end: usize) -> Vec<Token> {
    (start..end)
        .filter(|&i| !tokens[i].is_elided() && tokens[i].kind != TokenKind::Comment)
        .map(|i| tokens[i].clone())
        .collect()
}

struct CallSite {
    recv_idx: usize,
    is_const: bool,
    method_name: String,
    open_paren: usize,
    close_paren: usize,
}

fn call_site(tokens: &[Token], recv_idx: usize, methods: &HashMap<String, MethodInfo>) -> Option<CallSite> {
    let tok = &tokens[recv_idx];
    if tok.is_elided() || tok.kind != TokenKind::Identifier {
        return None;
    }
    let sep_idx = next_significant(tokens, recv_idx + 1)?;
    let is_const_sep = if tokens[sep_idx].is_op(".") {
        true
    } else if tokens[sep_idx].is_punct(":") {
        false
    } else {
        return None;
    };
    let name_idx = next_significant(tokens, sep_idx + 1)?;
    if tokens[name_idx].kind != TokenKind::Identifier {
        return None;
    }
    let info = methods.get(&tokens[name_idx].text)?;
    let open_paren = next_significant(tokens, name_idx + 1)?;
    if !tokens[open_paren].is_punct("(") {
        return None;
    }
    let close_paren = matching_close(tokens, open_paren)?;
    Some(CallSite {
        recv_idx,
        is_const: is_const_sep && info.is_const || !is_const_sep && !info.is_const,
        method_name: tokens[name_idx].text.clone(),
        open_paren,
        close_paren,
    })
}

fn rewrite_call_site(tokens: &[Token], call: &CallSite, methods: &HashMap<String, MethodInfo>) -> Edit {
    let info = &methods[&call.method_name];
    let recv = &tokens[call.recv_idx];
    let line = recv.line;
    let col = recv.column;

    let mut out = Vec::new();
    out.push(Token::new(
        TokenKind::Identifier,
        format!("{}_{}", info.owner, call.method_name),
        line,
        col,
    ));
    out.push(Token::new(TokenKind::Punctuation, "(", line, col));
    if call.is_const {
        out.push(Token::new(TokenKind::Operator, "&", line, col));
    }
    out.push(recv.clone());
    let args_empty = next_significant(tokens, call.open_paren + 1)
        .map(|i| i >= call.close_paren)
        .unwrap_or(true);
    if !args_empty {
        out.push(Token::new(TokenKind::Punctuation, ",", line, col));
        out.extend(significant_range(tokens, call.open_paren + 1, call.close_paren));
    }
    out.push(Token::new(TokenKind::Punctuation, ")", line, col));

    Edit::replace(call.recv_idx, call.close_paren - call.recv_idx + 1, out)
}
