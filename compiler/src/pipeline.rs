// pipeline.rs — Transpiler driver: lex, parse, run the fixed pass order
//
// Drives the 21-pass sequence exactly as declared in `pass::ALL_PASSES`
// (language spec §4.1): run each pass to completion, accumulate its
// diagnostics, and halt with a `PipelineError` on the first pass whose
// diagnostics include an `Error`-level entry. Per-pass timing goes to
// stderr when `verbose` is set and the pass completes, mirroring the
// teacher's `finish_pass`/`on_pass_complete` callback shape.
//
// Preconditions: source is valid UTF-8; no pass has run yet.
// Postconditions: on `Ok`, every pass up to `terminal` has run and
//   `TranspileOutput.tree` reflects every rewrite they made; on `Err`, the
//   tree reflects every pass up to (and including) the failing one.
// Failure modes: `PipelineError::Lex`/`Parse` before any pass runs;
//   `PipelineError::Pass { failing_pass }` on the first pass with an error
//   diagnostic.
// Side effects: writes per-pass timing to stderr when `verbose` is set.

use std::time::Instant;

use crate::diag::Diagnostic;
use crate::lexer::lex;
use crate::parser::{self, ParseError};
use crate::pass::{self, descriptor, PassId};
use crate::symbols::SymbolTables;
use crate::tree::Tree;
use crate::{
    pass_pragma, pass_validate_cast, pass_validate_enum, pass_validate_fn, pass_validate_init,
    pass_xform_cast, pass_xform_defer, pass_xform_enum, pass_xform_fn, pass_xform_foreach,
    pass_xform_identifiers, pass_xform_ifexpr, pass_xform_loglines, pass_xform_method,
    pass_xform_mutability, pass_xform_named_args, pass_xform_names, pass_xform_struct,
    pass_xform_typeconst,
};

/// Everything a successful (or partially successful) run produced.
pub struct TranspileOutput {
    pub tree: Tree,
    pub symbols: SymbolTables,
    pub diagnostics: Vec<Diagnostic>,
}

/// Pipeline execution failed before producing a complete transformed tree.
#[derive(Debug)]
pub enum PipelineError {
    Lex(Vec<crate::lexer::LexError>),
    Parse(ParseError),
    Pass {
        failing_pass: PassId,
        diagnostics: Vec<Diagnostic>,
    },
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Lex(errs) => write!(f, "{} lex error(s)", errs.len()),
            PipelineError::Parse(e) => write!(f, "parse error: {e}"),
            PipelineError::Pass { failing_pass, .. } => {
                write!(f, "pass {} failed", descriptor(*failing_pass).name)
            }
        }
    }
}

impl std::error::Error for PipelineError {}

/// Drives the fixed pass sequence over one translation unit.
pub struct Transpiler;

impl Transpiler {
    /// Run every pass up to (and including) `terminal`, in `pass::ALL_PASSES`
    /// order. `release` forces `pragma_ctx.debug_mode = false` regardless of
    /// any in-source `#pragma czar debug(...)`, matching build profiles
    /// overriding source pragmas. `on_pass_complete` fires after each pass,
    /// before the error check, so a caller can render diagnostics as they
    /// land rather than only at the end.
    pub fn run(
        source: &str,
        filename: &str,
        terminal: PassId,
        verbose: bool,
        release: bool,
        mut on_pass_complete: impl FnMut(PassId, &[Diagnostic]),
    ) -> Result<TranspileOutput, PipelineError> {
        let lexed = lex(source);
        if !lexed.errors.is_empty() {
            return Err(PipelineError::Lex(lexed.errors));
        }
        let tree = parser::parse(lexed.tokens).map_err(PipelineError::Parse)?;

        let mut tree = tree;
        let mut symbols = SymbolTables::default();
        let mut diagnostics = Vec::new();

        for pass_id in pass::passes_up_to(terminal) {
            let start = Instant::now();
            let diags = run_pass(pass_id, &mut tree, &mut symbols, filename);
            let elapsed = start.elapsed();

            on_pass_complete(pass_id, &diags);
            if verbose {
                eprintln!(
                    "czar: {} complete, {:.1}ms",
                    descriptor(pass_id).name,
                    elapsed.as_secs_f64() * 1000.0
                );
            }

            let failed = diags.iter().any(Diagnostic::is_error);
            diagnostics.extend(diags);
            if failed {
                return Err(PipelineError::Pass {
                    failing_pass: pass_id,
                    diagnostics,
                });
            }

            if pass_id == PassId::PragmaParse && release {
                symbols.pragma_ctx.debug_mode = false;
            }
        }

        Ok(TranspileOutput {
            tree,
            symbols,
            diagnostics,
        })
    }
}

/// Dispatch one pass by id. Signatures vary (some take `&SymbolTables`,
/// some `&mut`, some a filename, some return no diagnostics) — this match is
/// the one place that variance is reconciled into a uniform
/// `Vec<Diagnostic>` return.
fn run_pass(
    pass_id: PassId,
    tree: &mut Tree,
    symbols: &mut SymbolTables,
    filename: &str,
) -> Vec<Diagnostic> {
    use PassId::*;
    match pass_id {
        PragmaParse => pass_pragma::run(tree, symbols),
        ValidateInit => pass_validate_init::run(tree),
        ValidateCasts => pass_validate_cast::run(tree),
        ValidateEnumSwitch => pass_validate_enum::run(tree, symbols),
        ValidateFunctions => pass_validate_fn::run(tree),
        TransformFunctions => {
            pass_xform_fn::run(tree);
            Vec::new()
        }
        TransformStructs => {
            pass_xform_struct::run_structs(tree, symbols);
            Vec::new()
        }
        TransformStructLits => {
            pass_xform_struct::run_struct_lits(tree);
            Vec::new()
        }
        TransformMethods => {
            pass_xform_method::run(tree, symbols);
            Vec::new()
        }
        RewriteStructNames => {
            pass_xform_names::run_rewrite_struct_names(tree, symbols);
            Vec::new()
        }
        AutoDeref => {
            pass_xform_names::run_auto_deref(tree);
            Vec::new()
        }
        TransformEnums => {
            pass_xform_enum::run(tree);
            Vec::new()
        }
        ExpandIdentifiers => {
            pass_xform_identifiers::run(tree, filename);
            Vec::new()
        }
        ExpandLogLines => {
            pass_xform_loglines::run(tree, filename);
            Vec::new()
        }
        TransformNamedArgs => pass_xform_named_args::run(tree, symbols),
        TransformMutability => pass_xform_mutability::run(tree),
        TransformDefer => pass_xform_defer::run(tree, symbols),
        TransformForeach => {
            pass_xform_foreach::run(tree);
            Vec::new()
        }
        TransformIfExpr => {
            pass_xform_ifexpr::run(tree);
            Vec::new()
        }
        TypeConstMapping => {
            pass_xform_typeconst::run(tree, symbols);
            Vec::new()
        }
        TransformCasts => {
            pass_xform_cast::run(tree);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = "fn main() -> i32 { return 0; }";

    #[test]
    fn full_pipeline_succeeds_on_trivial_source() {
        let out = Transpiler::run(SRC, "t.cz", PassId::TransformCasts, false, false, |_, _| {})
            .expect("pipeline should succeed");
        assert!(out.diagnostics.is_empty());
        let text: String = out
            .tree
            .tokens
            .iter()
            .filter(|t| !t.is_elided())
            .map(|t| t.text.clone())
            .collect::<Vec<_>>()
            .join(" ");
        assert!(text.contains("int32_t"), "{text}");
    }

    #[test]
    fn passes_up_to_stops_early() {
        let out = Transpiler::run(SRC, "t.cz", PassId::ValidateFunctions, false, false, |_, _| {})
            .expect("should succeed through P5");
        let text: String = out
            .tree
            .tokens
            .iter()
            .filter(|t| !t.is_elided())
            .map(|t| t.text.clone())
            .collect::<Vec<_>>()
            .join(" ");
        // TransformFunctions (P6) hasn't run yet, so `()` is still bare.
        assert!(text.contains("main ( )"), "{text}");
    }

    #[test]
    fn release_flag_forces_debug_mode_off() {
        let src = "#pragma czar debug(on)\nfn main() -> i32 { return 0; }";
        let out = Transpiler::run(src, "t.cz", PassId::TransformCasts, false, true, |_, _| {})
            .expect("pipeline should succeed");
        assert!(!out.symbols.pragma_ctx.debug_mode);
    }

    #[test]
    fn validation_error_halts_pipeline_with_failing_pass() {
        // A declaration without `mut` and without an initializer violates
        // P2; the pipeline should stop there rather than run P3-P21.
        let src = "fn f() -> void { i32 x; }";
        let err = Transpiler::run(src, "t.cz", PassId::TransformCasts, false, false, |_, _| {})
            .expect_err("missing initializer should fail P2");
        match err {
            PipelineError::Pass { failing_pass, diagnostics } => {
                assert_eq!(failing_pass, PassId::ValidateInit);
                assert!(!diagnostics.is_empty());
            }
            other => panic!("expected Pass error, got {other:?}"),
        }
    }
}
