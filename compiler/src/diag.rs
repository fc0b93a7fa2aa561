// diag.rs — Unified diagnostics model
//
// Diagnostics are values, not printf side effects (language spec §9 design
// note): every pass returns `Vec<Diagnostic>` instead of writing to stderr
// directly, so the driver decides how and when to render them.
//
// Preconditions: none (types only).
// Postconditions: none.
// Failure modes: none.
// Side effects: none.

use std::fmt;

/// A source location, in the 1-based line/column terms tokens carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A stable diagnostic code. Once assigned, a code's meaning must never
/// change — new rules get new codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLevel {
    Error,
    Warning,
}

/// A compiler diagnostic emitted by any pass.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: DiagCode,
    pub level: DiagLevel,
    pub span: Span,
    /// Name of the enclosing function, if the offending construct is
    /// inside one — required for the `WARNING in <func>()` format (§6).
    pub function: Option<String>,
    pub message: String,
    pub hint: Option<String>,
}

impl Diagnostic {
    pub fn error(code: DiagCode, span: Span, message: impl Into<String>) -> Self {
        Self {
            code,
            level: DiagLevel::Error,
            span,
            function: None,
            message: message.into(),
            hint: None,
        }
    }

    pub fn warning(code: DiagCode, span: Span, message: impl Into<String>) -> Self {
        Self {
            code,
            level: DiagLevel::Warning,
            span,
            function: None,
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_function(mut self, name: impl Into<String>) -> Self {
        self.function = Some(name.into());
        self
    }

    /// Same as `with_function`, but for the common case of an
    /// `Option<String>` returned by `scan::enclosing_function` — every
    /// validation pass hits this, so it lives here once instead of as a
    /// local `impl Diagnostic` block repeated per pass module.
    pub fn with_function_opt(self, name: Option<String>) -> Self {
        match name {
            Some(n) => self.with_function(n),
            None => self,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagLevel::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            DiagLevel::Error => write!(f, "[CZAR] ERROR: {} ({})", self.message, self.code),
            DiagLevel::Warning => write!(f, "WARNING {} ({})", self.message, self.code),
        }
    }
}

/// Stable diagnostic codes, one per distinct rule in the language spec.
///
/// See `DIAGNOSTIC_CODES.md`-style policy: a code is never reassigned to a
/// different semantic meaning once shipped.
pub mod codes {
    use super::DiagCode;

    // ── P2: init & unsafe-API validation ──
    pub const ERR_VARIABLE_NOT_INITIALIZED: DiagCode = DiagCode("ERR_VARIABLE_NOT_INITIALIZED");
    pub const ERR_FORBIDDEN_CALL: DiagCode = DiagCode("ERR_FORBIDDEN_CALL");
    pub const WARN_FORBIDDEN_CALL: DiagCode = DiagCode("WARN_FORBIDDEN_CALL");

    // ── P3: cast validation ──
    pub const ERR_CAST_SYNTAX: DiagCode = DiagCode("ERR_CAST_SYNTAX");

    // ── P4: enum/switch validation ──
    pub const ERR_ENUM_SWITCH_MISSING_CASE: DiagCode = DiagCode("ERR_ENUM_SWITCH_MISSING_CASE");
    pub const ERR_ENUM_SWITCH_MISSING_DEFAULT: DiagCode =
        DiagCode("ERR_ENUM_SWITCH_MISSING_DEFAULT");
    pub const ERR_SWITCH_CASE_NO_TERMINATOR: DiagCode = DiagCode("ERR_SWITCH_CASE_NO_TERMINATOR");
    pub const WARN_ENUM_MEMBER_NOT_UPPERCASE: DiagCode =
        DiagCode("WARN_ENUM_MEMBER_NOT_UPPERCASE");

    // ── P5: function validation ──
    pub const ERR_EMPTY_PARAM_LIST: DiagCode = DiagCode("ERR_EMPTY_PARAM_LIST");
    pub const ERR_MAIN_RETURN_TYPE: DiagCode = DiagCode("ERR_MAIN_RETURN_TYPE");
    pub const WARN_AMBIGUOUS_ADJACENT_PARAMS: DiagCode =
        DiagCode("WARN_AMBIGUOUS_ADJACENT_PARAMS");

    // ── P15: named arguments ──
    pub const ERR_NAMED_ARG_MISMATCH: DiagCode = DiagCode("ERR_NAMED_ARG_MISMATCH");
    pub const ERR_NAMED_ARG_ORDER: DiagCode = DiagCode("ERR_NAMED_ARG_ORDER");

    // ── P16: mutability ──
    pub const ERR_CONST_FORBIDDEN: DiagCode = DiagCode("ERR_CONST_FORBIDDEN");
    pub const ERR_MUT_ON_VALUE_PARAM: DiagCode = DiagCode("ERR_MUT_ON_VALUE_PARAM");

    // ── P17: defer ──
    pub const ERR_STANDALONE_DEFER_UNSUPPORTED: DiagCode =
        DiagCode("ERR_STANDALONE_DEFER_UNSUPPORTED");

    // ── Internal ──
    pub const ERR_INTERNAL: DiagCode = DiagCode("ERR_INTERNAL");
}
