// pass_xform_identifiers.rs — P13: unreachable/todo/fixme expansion
//
// `unreachable(msg)`, `todo(msg)`, `fixme(msg)` (each call form accepting
// zero or one string argument) expand to an `fprintf`+`abort` sequence
// carrying the call's source line and the translation unit's file name
// (language spec §4.3.6). Expanded as a single parenthesized comma
// expression so the call keeps working in either expression or statement
// position.
//
// Preconditions: P12 has run.
// Postconditions: no bare `unreachable`/`todo`/`fixme` call remains.
// Failure modes: none.
// Side effects: mutates the tree.

use crate::scan::{matching_close, next_significant};
use crate::token::{Token, TokenKind};
use crate::tree::{apply_descending, Edit, Tree};

const MARKERS: &[(&str, &str)] = &[
    ("unreachable", "unreachable code reached"),
    ("todo", "TODO"),
    ("fixme", "FIXME"),
];

pub fn run(tree: &mut Tree, filename: &str) {
    let mut edits = Vec::new();
    {
        let tokens = &tree.tokens;
        let mut i = 0;
        while i < tokens.len() {
            if tokens[i].is_elided() || tokens[i].kind != TokenKind::Identifier {
                i += 1;
                continue;
            }
            let Some((_, label)) = MARKERS.iter().find(|(name, _)| *name == tokens[i].text) else {
                i += 1;
                continue;
            };
            let Some(open) = next_significant(tokens, i + 1).filter(|&p| tokens[p].is_punct("("))
            else {
                i += 1;
                continue;
            };
            let Some(close) = matching_close(tokens, open) else {
                i += 1;
                continue;
            };
            let msg_idx = next_significant(tokens, open + 1).filter(|&p| p < close);
            edits.push(expand(tokens, i, close, label, msg_idx, filename));
            i = close + 1;
        }
    }
    apply_descending(&mut tree.tokens, edits);
}

fn expand(
    tokens: &[Token],
    call_start: usize,
    call_end: usize,
    label: &str,
    msg_idx: Option<usize>,
    filename: &str,
) -> Edit {
    let line = tokens[call_start].line;
    let col = tokens[call_start].column;
    let tok = |kind: TokenKind, text: String| Token::new(kind, text, line, col);

    let mut out = vec![
        tok(TokenKind::Punctuation, "(".into()),
        tok(TokenKind::Identifier, "fprintf".into()),
        tok(TokenKind::Punctuation, "(".into()),
        tok(TokenKind::Identifier, "stderr".into()),
        tok(TokenKind::Punctuation, ",".into()),
    ];
    match msg_idx {
        Some(m) => {
            out.push(tok(
                TokenKind::String,
                format!("\"[CZAR] {label} at %s:%d: %s\\n\""),
            ));
            out.push(tok(TokenKind::Punctuation, ",".into()));
            out.push(tok(TokenKind::String, format!("\"{filename}\"")));
            out.push(tok(TokenKind::Punctuation, ",".into()));
            out.push(tok(TokenKind::Number, line.to_string()));
            out.push(tok(TokenKind::Punctuation, ",".into()));
            out.push(tokens[m].clone());
        }
        None => {
            out.push(tok(TokenKind::String, format!("\"[CZAR] {label} at %s:%d\\n\"")));
            out.push(tok(TokenKind::Punctuation, ",".into()));
            out.push(tok(TokenKind::String, format!("\"{filename}\"")));
            out.push(tok(TokenKind::Punctuation, ",".into()));
            out.push(tok(TokenKind::Number, line.to_string()));
        }
    }
    out.push(tok(TokenKind::Punctuation, ")".into()));
    out.push(tok(TokenKind::Punctuation, ",".into()));
    out.push(tok(TokenKind::Identifier, "abort".into()));
    out.push(tok(TokenKind::Punctuation, "(".into()));
    out.push(tok(TokenKind::Punctuation, ")".into()));
    out.push(tok(TokenKind::Punctuation, ")".into()));

    Edit::replace(call_start, call_end - call_start + 1, out)
}
