// runtime.rs — Runtime Writer
//
// Generates the `cz.h`/`cz.c` pair transformed code depends on: assertion
// macros, a monotonic clock, the log subsystem, and the mustache-style
// format subsystem (language spec §4.4, final paragraph). Grounded on the
// teacher's `codegen.rs` preamble style — one function per logical section,
// each returning a `String`, concatenated by the caller rather than a
// templating engine.
//
// Preconditions: none.
// Postconditions: `RuntimeWriter::write` returns declarations in the first
//   string, bodies in the second; every symbol transformed code may call
//   (`cz_assert`, `cz_monotonic_ns`, `cz_log_*`, `cz_format`) is declared in
//   the first and defined in the second.
// Failure modes: none (pure string building).
// Side effects: none.

use crate::symbols::PragmaContext;

/// `#define _POSIX_C_SOURCE 199309L\n` — must precede every other include so
/// glibc exposes `clock_gettime`/`CLOCK_MONOTONIC` (language spec §6, output
/// format paragraph).
pub fn emit_feature_test_macro() -> &'static str {
    "#define _POSIX_C_SOURCE 199309L\n"
}

/// `cz_assert`/`cz_assert_msg`: print to stderr with `__FILE__`/`__LINE__`
/// and abort, compiled to a no-op under `NDEBUG` — the lowering target for
/// the `#assert` directive.
pub fn emit_assert_macros() -> String {
    r#"#ifdef NDEBUG
#define cz_assert(cond) ((void)0)
#define cz_assert_msg(cond, msg) ((void)0)
#else
#define cz_assert(cond) \
    ((cond) ? (void)0 : (fprintf(stderr, "assertion failed: %s (%s:%d)\n", #cond, __FILE__, __LINE__), abort()))
#define cz_assert_msg(cond, msg) \
    ((cond) ? (void)0 : (fprintf(stderr, "assertion failed: %s: %s (%s:%d)\n", #cond, (msg), __FILE__, __LINE__), abort()))
#endif
"#
    .to_string()
}

/// `cz_monotonic_ns()` wraps `clock_gettime(CLOCK_MONOTONIC, ...)`, used by
/// `#DEBUG` timing directives and available to user code directly.
pub fn emit_clock() -> String {
    r#"static inline int64_t cz_monotonic_ns(void) {
    struct timespec ts;
    clock_gettime(CLOCK_MONOTONIC, &ts);
    return (int64_t)ts.tv_sec * 1000000000LL + (int64_t)ts.tv_nsec;
}
"#
    .to_string()
}

/// `cz_log_info`/`cz_log_warn`/`cz_log_error`/`cz_log_debug`, variadic,
/// prefixed `[INFO]`/`[WARN]`/`[ERROR]`/`[DEBUG]` and printed to stderr.
/// `cz_log_debug` compiles to a no-op macro when `debug_mode` is `false`
/// (release builds, or `#pragma czar debug(off)`).
pub fn emit_log_subsystem(debug_mode: bool) -> String {
    let mut out = String::new();
    out.push_str(
        r#"static void cz_log_info(const char *fmt, ...) {
    va_list args;
    fprintf(stderr, "[INFO] ");
    va_start(args, fmt);
    vfprintf(stderr, fmt, args);
    va_end(args);
    fprintf(stderr, "\n");
}

static void cz_log_warn(const char *fmt, ...) {
    va_list args;
    fprintf(stderr, "[WARN] ");
    va_start(args, fmt);
    vfprintf(stderr, fmt, args);
    va_end(args);
    fprintf(stderr, "\n");
}

static void cz_log_error(const char *fmt, ...) {
    va_list args;
    fprintf(stderr, "[ERROR] ");
    va_start(args, fmt);
    vfprintf(stderr, fmt, args);
    va_end(args);
    fprintf(stderr, "\n");
}
"#,
    );
    if debug_mode {
        out.push_str(
            r#"static void cz_log_debug(const char *fmt, ...) {
    va_list args;
    fprintf(stderr, "[DEBUG] ");
    va_start(args, fmt);
    vfprintf(stderr, fmt, args);
    va_end(args);
    fprintf(stderr, "\n");
}
"#,
        );
    } else {
        out.push_str("#define cz_log_debug(...) ((void)0)\n");
    }
    out
}

/// `any_t`: a tagged union dispatched via C11 `_Generic`, and `cz_format`,
/// the mustache-style `{}`/`{{name}}` placeholder formatter (language spec
/// §4.4 bullet 5: "compile-time dispatch" without runtime vtables).
pub fn emit_format_subsystem() -> String {
    r#"typedef enum {
    CZ_ANY_I64,
    CZ_ANY_U64,
    CZ_ANY_F64,
    CZ_ANY_STR,
    CZ_ANY_BOOL,
} cz_any_kind_t;

typedef struct {
    cz_any_kind_t kind;
    union {
        int64_t i64;
        uint64_t u64;
        double f64;
        const char *str;
        bool b;
    } value;
} any_t;

#define cz_any(x) _Generic((x), \
    bool: (any_t){ .kind = CZ_ANY_BOOL, .value.b = (x) }, \
    char *: (any_t){ .kind = CZ_ANY_STR, .value.str = (x) }, \
    const char *: (any_t){ .kind = CZ_ANY_STR, .value.str = (x) }, \
    float: (any_t){ .kind = CZ_ANY_F64, .value.f64 = (x) }, \
    double: (any_t){ .kind = CZ_ANY_F64, .value.f64 = (x) }, \
    default: _Generic((x), \
        unsigned long long: (any_t){ .kind = CZ_ANY_U64, .value.u64 = (x) }, \
        default: (any_t){ .kind = CZ_ANY_I64, .value.i64 = (int64_t)(x) } \
    ) \
)

static void cz_format_one(const any_t *v) {
    switch (v->kind) {
        case CZ_ANY_I64:
            printf("%lld", (long long)v->value.i64);
            break;
        case CZ_ANY_U64:
            printf("%llu", (unsigned long long)v->value.u64);
            break;
        case CZ_ANY_F64:
            printf("%g", v->value.f64);
            break;
        case CZ_ANY_STR:
            printf("%s", v->value.str);
            break;
        case CZ_ANY_BOOL:
            printf("%s", v->value.b ? "true" : "false");
            break;
    }
}

/// Mustache-style formatter: `{}` consumes the next argument in order,
/// `{{name}}` is left in the output verbatim (named slots are resolved by
/// the call site that builds the argument list, not by this function).
static void cz_format(const char *fmt, int argc, const any_t *argv) {
    int next = 0;
    for (const char *p = fmt; *p; p++) {
        if (p[0] == '{' && p[1] == '{') {
            putchar('{');
            p++;
            continue;
        }
        if (p[0] == '}' && p[1] == '}') {
            putchar('}');
            p++;
            continue;
        }
        if (p[0] == '{' && p[1] == '}') {
            if (next < argc) {
                cz_format_one(&argv[next]);
                next++;
            }
            p++;
            continue;
        }
        putchar(*p);
    }
}
"#
    .to_string()
}

/// Produces the `(cz_h_contents, cz_c_contents)` pair: declarations the
/// emitted translation unit needs to see, and the bodies that back them.
/// `pragma_ctx` decides whether `cz_log_debug` is a real function or a
/// compiled-out macro.
pub struct RuntimeWriter;

impl RuntimeWriter {
    pub fn write(pragma_ctx: &PragmaContext) -> (String, String) {
        let mut h = String::new();
        h.push_str("#ifndef CZ_H\n#define CZ_H\n\n");
        h.push_str("#include <stdarg.h>\n");
        h.push_str("#include <stdbool.h>\n");
        h.push_str("#include <stdint.h>\n");
        h.push_str("#include <stdio.h>\n");
        h.push_str("#include <stdlib.h>\n");
        h.push_str("#include <time.h>\n\n");
        h.push_str("int64_t cz_monotonic_ns(void);\n");
        h.push_str("void cz_log_info(const char *fmt, ...);\n");
        h.push_str("void cz_log_warn(const char *fmt, ...);\n");
        h.push_str("void cz_log_error(const char *fmt, ...);\n");
        if pragma_ctx.debug_mode {
            h.push_str("void cz_log_debug(const char *fmt, ...);\n");
        } else {
            h.push_str("#define cz_log_debug(...) ((void)0)\n");
        }
        h.push('\n');
        h.push_str(&emit_format_subsystem());
        h.push_str("\n#endif // CZ_H\n");

        let mut c = String::new();
        c.push_str("#include \"cz.h\"\n\n");
        c.push_str(&emit_clock());
        c.push('\n');
        c.push_str(&emit_log_subsystem(pragma_ctx.debug_mode));

        (h, c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_test_macro_is_posix_199309() {
        assert_eq!(
            emit_feature_test_macro(),
            "#define _POSIX_C_SOURCE 199309L\n"
        );
    }

    #[test]
    fn debug_mode_on_emits_real_log_debug_function() {
        let out = emit_log_subsystem(true);
        assert!(out.contains("static void cz_log_debug"));
        assert!(!out.contains("#define cz_log_debug"));
    }

    #[test]
    fn debug_mode_off_emits_noop_macro() {
        let out = emit_log_subsystem(false);
        assert!(out.contains("#define cz_log_debug(...) ((void)0)"));
        assert!(!out.contains("static void cz_log_debug"));
    }

    #[test]
    fn writer_produces_header_and_impl_pair() {
        let ctx = PragmaContext { debug_mode: true };
        let (h, c) = RuntimeWriter::write(&ctx);
        assert!(h.contains("#ifndef CZ_H"));
        assert!(h.contains("void cz_log_debug(const char *fmt, ...);"));
        assert!(c.contains("#include \"cz.h\""));
        assert!(c.contains("cz_monotonic_ns"));
    }

    #[test]
    fn writer_release_mode_macro_not_function() {
        let ctx = PragmaContext { debug_mode: false };
        let (h, c) = RuntimeWriter::write(&ctx);
        assert!(h.contains("#define cz_log_debug(...) ((void)0)"));
        assert!(!c.contains("cz_log_debug"));
    }
}
