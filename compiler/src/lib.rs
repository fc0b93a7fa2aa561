// czar — source-to-source transpiler from CZar (.cz) to C11
//
// Library root. `Transpiler::run` (pipeline.rs) is the external interface
// everything else is built to serve: lex, parse into a flat `Tree`, run the
// 21-pass pipeline, then hand the transformed tree to `emit.rs` alongside
// `runtime.rs`'s generated `cz.h`/`cz.c` pair.

pub mod diag;
pub mod emit;
pub mod lexer;
pub mod parser;
pub mod pass;
pub mod pass_pragma;
pub mod pass_validate_cast;
pub mod pass_validate_enum;
pub mod pass_validate_fn;
pub mod pass_validate_init;
pub mod pass_xform_cast;
pub mod pass_xform_defer;
pub mod pass_xform_enum;
pub mod pass_xform_fn;
pub mod pass_xform_foreach;
pub mod pass_xform_identifiers;
pub mod pass_xform_ifexpr;
pub mod pass_xform_loglines;
pub mod pass_xform_method;
pub mod pass_xform_mutability;
pub mod pass_xform_named_args;
pub mod pass_xform_names;
pub mod pass_xform_struct;
pub mod pass_xform_typeconst;
pub mod pipeline;
pub mod render;
pub mod runtime;
pub mod scan;
pub mod symbols;
pub mod token;
pub mod tree;
pub mod typetab;
