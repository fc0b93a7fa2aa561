// pass.rs — Pass descriptor module: metadata and total pass order
//
// Declares the transpiler's 21 passes and their documented dependencies.
// Unlike a build system with optional targets, CZar's pass order is a
// single fixed total order (language spec §2/§4.1) — there is no DAG to
// resolve, so `passes_up_to` is a prefix slice rather than a graph visit.
// The `inputs` field stays purely documentary, the same role the teacher
// codebase's `PassDescriptor.invariants` plays: it lets a test assert that
// every pass's declared data dependency is scheduled strictly earlier.

/// Identifies each of the 21 CZar transformation passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassId {
    PragmaParse,          // P1
    ValidateInit,         // P2
    ValidateCasts,        // P3
    ValidateEnumSwitch,   // P4
    ValidateFunctions,    // P5
    TransformFunctions,   // P6
    TransformStructs,     // P7
    TransformStructLits,  // P8
    TransformMethods,     // P9
    RewriteStructNames,   // P10
    AutoDeref,            // P11
    TransformEnums,       // P12
    ExpandIdentifiers,    // P13
    ExpandLogLines,       // P14
    TransformNamedArgs,   // P15
    TransformMutability,  // P16
    TransformDefer,       // P17
    TransformForeach,     // P18
    TransformIfExpr,      // P19
    TypeConstMapping,     // P20
    TransformCasts,       // P21
}

/// Static metadata about a pass.
pub struct PassDescriptor {
    pub name: &'static str,
    /// Passes whose tables/tree shape this pass reads. Documentary only —
    /// the scheduler does not compute a minimal subset from it, because
    /// there is nothing to compute: the order below is already minimal and
    /// total.
    pub inputs: &'static [PassId],
    pub writes: &'static str,
    pub invariants: &'static str,
}

pub fn descriptor(id: PassId) -> PassDescriptor {
    use PassId::*;
    match id {
        PragmaParse => PassDescriptor {
            name: "pragma_parse",
            inputs: &[],
            writes: "pragma_ctx.debug_mode",
            invariants: "every #pragma czar debug(on|off) consumed",
        },
        ValidateInit => PassDescriptor {
            name: "validate_init",
            inputs: &[PragmaParse],
            writes: "diagnostics only",
            invariants: "every declaration without `mut` has a `=` initializer; no forbidden API calls survive without a diagnostic",
        },
        ValidateCasts => PassDescriptor {
            name: "validate_casts",
            inputs: &[ValidateInit],
            writes: "diagnostics only",
            invariants: "no C-style `(Type)expr` cast survives without a diagnostic",
        },
        ValidateEnumSwitch => PassDescriptor {
            name: "validate_enum_switch",
            inputs: &[ValidateCasts],
            writes: "enum_table; diagnostics",
            invariants: "every enum declaration is recorded; every switch on an enum-typed selector is exhaustive or has a default",
        },
        ValidateFunctions => PassDescriptor {
            name: "validate_functions",
            inputs: &[ValidateEnumSwitch],
            writes: "diagnostics only",
            invariants: "no empty `()` parameter list; main returns an integer type",
        },
        TransformFunctions => PassDescriptor {
            name: "transform_functions",
            inputs: &[ValidateFunctions],
            writes: "tree (function declarations)",
            invariants: "every validated `()` becomes `(void)`; attributes inserted",
        },
        TransformStructs => PassDescriptor {
            name: "transform_structs",
            inputs: &[TransformFunctions],
            writes: "tree (struct declarations); struct_map",
            invariants: "every `struct Name { ... };` becomes `typedef struct Name_s { ... } Name_t;`",
        },
        TransformStructLits => PassDescriptor {
            name: "transform_struct_lits",
            inputs: &[TransformStructs],
            writes: "tree (struct literal initializers)",
            invariants: "`T s = {}` / `T s = T {}` / `T s = T { ... }` normalized",
        },
        TransformMethods => PassDescriptor {
            name: "transform_methods",
            inputs: &[TransformStructLits],
            writes: "tree (method declarations and call sites)",
            invariants: "`fn Type.name`/`fn Type:name` become `Type_name` free functions; call sites rewritten; runs before name replacement so `Type_name` keeps its base name",
        },
        RewriteStructNames => PassDescriptor {
            name: "rewrite_struct_names",
            inputs: &[TransformMethods],
            writes: "tree (identifier tokens naming a struct)",
            invariants: "every identifier use of `Name` becomes `Name_t`, except immediately after `struct`/`typedef struct`",
        },
        AutoDeref => PassDescriptor {
            name: "auto_deref",
            inputs: &[RewriteStructNames],
            writes: "tree (`.` operator tokens)",
            invariants: "`.` becomes `->` when the left operand is a known pointer or `self`",
        },
        TransformEnums => PassDescriptor {
            name: "transform_enums",
            inputs: &[AutoDeref],
            writes: "tree (enum-scoped case labels, switch statements)",
            invariants: "`case Enum.MEMBER` becomes `case MEMBER`; fallthrough `continue` becomes an attribute; missing default inserted",
        },
        ExpandIdentifiers => PassDescriptor {
            name: "expand_identifiers",
            inputs: &[TransformEnums],
            writes: "tree (unreachable/todo/fixme call expressions)",
            invariants: "each expands to a fprintf+abort sequence carrying file and line",
        },
        ExpandLogLines => PassDescriptor {
            name: "expand_log_lines",
            inputs: &[ExpandIdentifiers],
            writes: "tree (#line directives before cz_log_* calls)",
            invariants: "every cz_log_* call is preceded by `#line N \"file\"`",
        },
        TransformNamedArgs => PassDescriptor {
            name: "transform_named_args",
            inputs: &[ExpandLogLines],
            writes: "tree (call-site argument labels); function_signatures",
            invariants: "labels match declared parameter order and are elided to positional arguments",
        },
        TransformMutability => PassDescriptor {
            name: "transform_mutability",
            inputs: &[TransformNamedArgs],
            writes: "tree (type tokens gain/lose `const`/`mut`)",
            invariants: "every non-mut type token is preceded by const; pointer declarations get const twice; `const` keyword usage is rejected upstream (P2-era concept, enforced here since mutability is this pass's concern)",
        },
        TransformDefer => PassDescriptor {
            name: "transform_defer",
            inputs: &[TransformMutability],
            writes: "tree (#defer spans); generated_cleanup_fns; defer_counter",
            invariants: "every declaration-bound #defer becomes a cleanup attribute plus a generated function",
        },
        TransformForeach => PassDescriptor {
            name: "transform_foreach",
            inputs: &[TransformDefer],
            writes: "tree (for-range loops)",
            invariants: "`for (T v : a..b)` becomes a classic `for` with an inclusive bound",
        },
        TransformIfExpr => PassDescriptor {
            name: "transform_if_expr",
            inputs: &[TransformForeach],
            writes: "tree (if-expressions in expression position)",
            invariants: "`if (c) a else b` not followed by `{` becomes `(c) ? a : b`",
        },
        TypeConstMapping => PassDescriptor {
            name: "type_const_mapping",
            inputs: &[TransformIfExpr],
            writes: "tree (type/constant identifiers; `_` identifiers); unused_counter",
            invariants: "CZar primitive types and named constants map to their C/stdint equivalents; each `_` becomes a fresh unused identifier",
        },
        TransformCasts => PassDescriptor {
            name: "transform_casts",
            inputs: &[TypeConstMapping],
            writes: "tree (cast<T>(...) expressions)",
            invariants: "`cast<T>(v)` becomes `((T)(v))`; `cast<T>(v, fb)` becomes a runtime-checked cast",
        },
    }
}

/// All 21 passes in their fixed execution order.
pub const ALL_PASSES: [PassId; 21] = {
    use PassId::*;
    [
        PragmaParse,
        ValidateInit,
        ValidateCasts,
        ValidateEnumSwitch,
        ValidateFunctions,
        TransformFunctions,
        TransformStructs,
        TransformStructLits,
        TransformMethods,
        RewriteStructNames,
        AutoDeref,
        TransformEnums,
        ExpandIdentifiers,
        ExpandLogLines,
        TransformNamedArgs,
        TransformMutability,
        TransformDefer,
        TransformForeach,
        TransformIfExpr,
        TypeConstMapping,
        TransformCasts,
    ]
};

/// Return the prefix of `ALL_PASSES` ending at (and including) `terminal`.
/// Used by `--emit tokens|ast` to stop the pipeline early.
pub fn passes_up_to(terminal: PassId) -> Vec<PassId> {
    let idx = ALL_PASSES
        .iter()
        .position(|p| *p == terminal)
        .expect("terminal is always a member of ALL_PASSES");
    ALL_PASSES[..=idx].to_vec()
}

fn index_of(id: PassId) -> usize {
    ALL_PASSES.iter().position(|p| *p == id).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_up_to_type_const_mapping_excludes_cast_transform() {
        let passes = passes_up_to(PassId::TypeConstMapping);
        assert_eq!(passes.len(), 20);
        assert!(!passes.contains(&PassId::TransformCasts));
    }

    #[test]
    fn passes_up_to_cast_transform_includes_all() {
        let passes = passes_up_to(PassId::TransformCasts);
        assert_eq!(passes.len(), 21);
    }

    #[test]
    fn dependency_edges_point_strictly_earlier() {
        for &pass in &ALL_PASSES {
            for &dep in descriptor(pass).inputs {
                assert!(
                    index_of(dep) < index_of(pass),
                    "{:?} depends on {:?}, which is not scheduled earlier",
                    pass,
                    dep
                );
            }
        }
    }

    #[test]
    fn methods_run_before_struct_name_rewrite() {
        // Open question resolution: P9 must precede P10 so method bodies
        // keep the `Type_name` symbol while `self`'s type becomes `Type_t`.
        assert!(index_of(PassId::TransformMethods) < index_of(PassId::RewriteStructNames));
    }

    #[test]
    fn all_passes_have_unique_names() {
        let mut names: Vec<_> = ALL_PASSES.iter().map(|&p| descriptor(p).name).collect();
        let before = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), before);
    }
}
