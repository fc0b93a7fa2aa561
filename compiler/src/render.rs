// render.rs — Diagnostic rendering
//
// Turns a `Diagnostic` plus the original source text into the exact
// multiline formats from the language spec §6, or into JSON for
// `--diagnostic-format json`.
//
// Preconditions: `source` is the same text the diagnostic's span was
//   computed against.
// Postconditions: returned string always ends with a newline.
// Failure modes: a line number past the end of `source` renders an empty
//   excerpt rather than panicking.
// Side effects: none.

use serde::Serialize;

use crate::diag::{DiagLevel, Diagnostic};

/// Fetch the 1-based source line, with leading whitespace trimmed, for the
/// `> <excerpt>` line in the rendered diagnostic.
fn excerpt(source: &str, line: usize) -> String {
    source
        .lines()
        .nth(line.saturating_sub(1))
        .unwrap_or("")
        .trim_start()
        .to_string()
}

/// Render one diagnostic in the human-readable multiline format from §6.
pub fn render_human(diag: &Diagnostic, filename: &str, source: &str) -> String {
    let line = diag.span.line;
    let excerpt = excerpt(source, line);
    match diag.level {
        DiagLevel::Error => {
            format!(
                "[CZAR] ERROR at {}:{}: {}\n        > {}\n",
                filename, line, diag.message, excerpt
            )
        }
        DiagLevel::Warning => {
            let func = diag.function.as_deref().unwrap_or("<top-level>");
            let kebab = kebab_case(diag.code.0);
            format!(
                "WARNING in {}() at {}:{} {}\n        {}\n        > {}\n",
                func, filename, line, kebab, diag.message, excerpt
            )
        }
    }
}

/// Render a full diagnostic batch, human-readable, in order.
pub fn render_all_human(diags: &[Diagnostic], filename: &str, source: &str) -> String {
    diags
        .iter()
        .map(|d| render_human(d, filename, source))
        .collect::<Vec<_>>()
        .join("")
}

fn kebab_case(screaming_snake: &str) -> String {
    screaming_snake
        .trim_start_matches("ERR_")
        .trim_start_matches("WARN_")
        .to_lowercase()
        .replace('_', "-")
}

#[derive(Serialize)]
struct JsonDiag<'a> {
    code: &'a str,
    level: &'static str,
    line: usize,
    column: usize,
    function: Option<&'a str>,
    message: &'a str,
    hint: Option<&'a str>,
}

/// Render a diagnostic batch as a JSON array, for `--diagnostic-format json`.
pub fn render_all_json(diags: &[Diagnostic]) -> String {
    let entries: Vec<JsonDiag> = diags
        .iter()
        .map(|d| JsonDiag {
            code: d.code.0,
            level: match d.level {
                DiagLevel::Error => "error",
                DiagLevel::Warning => "warning",
            },
            line: d.span.line,
            column: d.span.column,
            function: d.function.as_deref(),
            message: &d.message,
            hint: d.hint.as_deref(),
        })
        .collect();
    serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::{codes, Span};

    #[test]
    fn error_format_matches_spec() {
        let d = Diagnostic::error(
            codes::ERR_VARIABLE_NOT_INITIALIZED,
            Span::new(2, 1),
            "variable 'x' is not initialized",
        );
        let out = render_human(&d, "f.cz", "i32 a = 1;\ni32 x;\n");
        assert_eq!(
            out,
            "[CZAR] ERROR at f.cz:2: variable 'x' is not initialized\n        > i32 x;\n"
        );
    }

    #[test]
    fn warning_format_matches_spec() {
        let d = Diagnostic::warning(
            codes::WARN_ENUM_MEMBER_NOT_UPPERCASE,
            Span::new(1, 1),
            "enum member 'Red' should be ALL_UPPERCASE",
        )
        .with_function("show");
        let out = render_human(&d, "f.cz", "enum Color { Red }\n");
        assert_eq!(
            out,
            "WARNING in show() at f.cz:1 enum-member-not-uppercase\n        enum member 'Red' should be ALL_UPPERCASE\n        > enum Color { Red }\n"
        );
    }

    #[test]
    fn json_round_trips_fields() {
        let d = Diagnostic::error(codes::ERR_CAST_SYNTAX, Span::new(5, 3), "bad cast");
        let json = render_all_json(&[d]);
        assert!(json.contains("\"code\": \"ERR_CAST_SYNTAX\""));
        assert!(json.contains("\"line\": 5"));
    }
}
