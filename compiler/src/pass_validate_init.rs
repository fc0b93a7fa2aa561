// pass_validate_init.rs — P2: init & unsafe-API validation
//
// Every variable declaration inside a function body must carry a syntactic
// initializer, and calls to a short list of unsafe C standard library
// functions are flagged (language spec §4.2.1).
//
// Preconditions: P1 has run (pragma tokens already elided, so they cannot
//   be mistaken for declarations).
// Postconditions: none on the tree — this pass only emits diagnostics.
// Failure modes: a declaration without `=` is `ERR_VARIABLE_NOT_INITIALIZED`;
//   a fatal forbidden call is `ERR_FORBIDDEN_CALL`, a non-fatal one is
//   `WARN_FORBIDDEN_CALL`.
// Side effects: none.

use crate::diag::{codes, Diagnostic, Span};
use crate::scan::{enclosing_function, next_significant};
use crate::token::TokenKind;
use crate::tree::Tree;
use crate::typetab::looks_like_type;

struct ForbiddenApi {
    name: &'static str,
    fatal: bool,
    alternative: &'static str,
}

/// Forbidden call table (language spec §4.2.1). Data, not branching logic —
/// adding an entry never touches the scan below.
const FORBIDDEN_APIS: &[ForbiddenApi] = &[
    ForbiddenApi {
        name: "gets",
        fatal: true,
        alternative: "fgets(buf, size, stdin) or cz_read_line",
    },
    ForbiddenApi {
        name: "tmpnam",
        fatal: false,
        alternative: "mkstemp",
    },
    ForbiddenApi {
        name: "rand",
        fatal: false,
        alternative: "cz_random (seeded PRNG in the runtime) or arc4random",
    },
    ForbiddenApi {
        name: "mktemp",
        fatal: false,
        alternative: "mkstemp",
    },
    ForbiddenApi {
        name: "readdir_r",
        fatal: false,
        alternative: "readdir (glibc's is already thread-local-reentrant)",
    },
    ForbiddenApi {
        name: "gethostbyname",
        fatal: false,
        alternative: "getaddrinfo",
    },
];

fn forbidden(name: &str) -> Option<&'static ForbiddenApi> {
    FORBIDDEN_APIS.iter().find(|f| f.name == name)
}

/// Tracks, per open-brace scope, whether we are dynamically within a
/// function body (`true`) or not (struct body, top level).
#[derive(Default)]
struct ScopeStack(Vec<bool>);

impl ScopeStack {
    fn in_function(&self) -> bool {
        *self.0.last().unwrap_or(&false)
    }

    fn push(&mut self, in_function: bool) {
        self.0.push(in_function);
    }

    fn pop(&mut self) {
        self.0.pop();
    }
}

pub fn run(tree: &Tree) -> Vec<Diagnostic> {
    let tokens = &tree.tokens;
    let mut diags = Vec::new();
    let mut scopes = ScopeStack::default();
    let mut i = 0;
    let mut at_statement_start = true;

    while i < tokens.len() {
        let tok = &tokens[i];
        if tok.is_elided() {
            i += 1;
            continue;
        }

        if tok.kind == TokenKind::Punctuation {
            match tok.text.as_str() {
                "{" => {
                    let opens_function = precedes_function_body(tokens, i);
                    let opens_struct = precedes_struct_body(tokens, i);
                    let in_fn = if opens_function {
                        true
                    } else if opens_struct {
                        false
                    } else {
                        scopes.in_function()
                    };
                    scopes.push(in_fn);
                    at_statement_start = true;
                    i += 1;
                    continue;
                }
                "}" => {
                    scopes.pop();
                    at_statement_start = true;
                    i += 1;
                    continue;
                }
                ";" => {
                    at_statement_start = true;
                    i += 1;
                    continue;
                }
                _ => {}
            }
        }

        if scopes.in_function() && at_statement_start {
            if let Some(decl) = try_match_declaration(tokens, i) {
                if !decl.has_initializer {
                    diags.push(
                        Diagnostic::error(
                            codes::ERR_VARIABLE_NOT_INITIALIZED,
                            Span::new(tokens[decl.name_idx].line, tokens[decl.name_idx].column),
                            format!(
                                "variable '{}' is not initialized",
                                tokens[decl.name_idx].text
                            ),
                        )
                        .with_function_opt(enclosing_function(tokens, i)),
                    );
                }
            }
        }

        if tok.kind == TokenKind::Identifier {
            if let Some(api) = forbidden(&tok.text) {
                if let Some(next) = next_significant(tokens, i + 1) {
                    if tokens[next].is_punct("(") {
                        let span = Span::new(tok.line, tok.column);
                        let diag = if api.fatal {
                            Diagnostic::error(
                                codes::ERR_FORBIDDEN_CALL,
                                span,
                                format!("'{}' is forbidden", api.name),
                            )
                        } else {
                            Diagnostic::warning(
                                codes::WARN_FORBIDDEN_CALL,
                                span,
                                format!("'{}' is discouraged", api.name),
                            )
                        }
                        .with_hint(format!("use {} instead", api.alternative))
                        .with_function_opt(enclosing_function(tokens, i));
                        diags.push(diag);
                    }
                }
            }
        }

        at_statement_start = false;
        i += 1;
    }

    diags
}

struct DeclMatch {
    name_idx: usize,
    has_initializer: bool,
}

/// Recognize `[mut] <type-token> [*...] <identifier> (= <expr>)? ;` starting
/// at `start`. Returns `None` if the tokens at `start` do not form this
/// shape (e.g. it's a call, an assignment, or a control statement).
fn try_match_declaration(tokens: &[crate::token::Token], start: usize) -> Option<DeclMatch> {
    let mut j = start;
    if tokens[j].is_keyword("mut") {
        j = next_significant(tokens, j + 1)?;
    }
    if !looks_like_type(tokens[j].kind, &tokens[j].text) || tokens[j].is_keyword("void") {
        return None;
    }
    j = next_significant(tokens, j + 1)?;
    while tokens[j].is_op("*") {
        j = next_significant(tokens, j + 1)?;
    }
    if tokens[j].kind != TokenKind::Identifier {
        return None;
    }
    let name_idx = j;
    j = next_significant(tokens, j + 1)?;
    if tokens[j].is_punct(";") {
        Some(DeclMatch {
            name_idx,
            has_initializer: false,
        })
    } else if tokens[j].is_op("=") {
        Some(DeclMatch {
            name_idx,
            has_initializer: true,
        })
    } else {
        None
    }
}

fn precedes_function_body(tokens: &[crate::token::Token], brace_idx: usize) -> bool {
    // Look backward for `-> <type>` right before the brace (functions and
    // methods both use this arrow-return shape).
    let mut j = brace_idx;
    while j > 0 {
        j -= 1;
        if tokens[j].is_elided() {
            continue;
        }
        return tokens[j].kind == TokenKind::Identifier
            && preceding_arrow(tokens, j)
            || tokens[j].kind == TokenKind::Keyword && preceding_arrow(tokens, j);
    }
    false
}

fn preceding_arrow(tokens: &[crate::token::Token], type_idx: usize) -> bool {
    let mut j = type_idx;
    while j > 0 {
        j -= 1;
        if tokens[j].is_elided() {
            continue;
        }
        return tokens[j].is_op("->");
    }
    false
}

fn precedes_struct_body(tokens: &[crate::token::Token], brace_idx: usize) -> bool {
    let mut j = brace_idx;
    while j > 0 {
        j -= 1;
        if tokens[j].is_elided() {
            continue;
        }
        if tokens[j].kind != TokenKind::Identifier {
            return false;
        }
        let mut k = j;
        while k > 0 {
            k -= 1;
            if tokens[k].is_elided() {
                continue;
            }
            return tokens[k].is_keyword("struct");
        }
        return false;
    }
    false
}
