use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::Command;

use czar::diag::Diagnostic;
use czar::emit::emit;
use czar::lexer::lex;
use czar::pass::PassId;
use czar::pipeline::{PipelineError, Transpiler};
use czar::render::{render_all_human, render_all_json};
use czar::runtime::RuntimeWriter;

const EXIT_OK: i32 = 0;
const EXIT_COMPILE_ERROR: i32 = 1;
const EXIT_USAGE_ERROR: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DiagnosticFormat {
    Human,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "czar",
    version,
    about = "czar — transpiles .cz source files to standards-conforming C11"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print per-pass timing to stderr.
    #[arg(long, global = true)]
    verbose: bool,

    /// Diagnostic output format.
    #[arg(long, value_enum, default_value_t = DiagnosticFormat::Human, global = true)]
    diagnostic_format: DiagnosticFormat,

    /// Sibling header search path for #import (repeatable).
    #[arg(short = 'I', long = "import-dir", global = true)]
    import_dir: Vec<PathBuf>,

    /// Release build: force pragma_ctx.debug_mode off regardless of source.
    #[arg(long, global = true)]
    release: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Transpile only; writes <name>.c, cz.h, cz.c next to the output path.
    Compile {
        source: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compile, then invoke $CZAR_CC (default `cc`) on the result.
    Build {
        source: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build, then execute the resulting binary, forwarding its exit code.
    Run { source: PathBuf },
    /// Build with -S and print the assembly file's path.
    Asm { source: PathBuf },
    /// Compile+build any #[cz_test]-tagged functions into a test runner.
    Test { source: PathBuf },
    /// Re-serialize the token stream with canonical whitespace; no passes run.
    Format { source: PathBuf },
    /// Remove generated .c/cz.h/cz.c/binary artifacts for a source file.
    Clean { source: PathBuf },
}

fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    let diag_format = cli.diagnostic_format;
    let release = cli.release;

    let source_path: &Path = match &cli.command {
        Commands::Compile { source, .. }
        | Commands::Build { source, .. }
        | Commands::Run { source }
        | Commands::Asm { source }
        | Commands::Test { source }
        | Commands::Format { source }
        | Commands::Clean { source } => source,
    };

    if matches!(cli.command, Commands::Clean { .. }) {
        clean_artifacts(source_path, verbose);
        std::process::exit(EXIT_OK);
    }

    let source = match std::fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}: {}", source_path.display(), e);
            std::process::exit(EXIT_USAGE_ERROR);
        }
    };
    let filename = source_path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| source_path.display().to_string());

    if matches!(cli.command, Commands::Format { .. }) {
        print!("{}", canonical_format(&source));
        std::process::exit(EXIT_OK);
    }

    let out = Transpiler::run(
        &source,
        &filename,
        PassId::TransformCasts,
        verbose,
        release,
        |pass_id, diags| {
            if verbose && !diags.is_empty() {
                eprintln!("czar: {:?} produced {} diagnostic(s)", pass_id, diags.len());
            }
        },
    );

    let output = match out {
        Ok(output) => {
            if !output.diagnostics.is_empty() {
                print_diagnostics(&output.diagnostics, &filename, &source, diag_format);
            }
            output
        }
        Err(PipelineError::Lex(errs)) => {
            for e in &errs {
                eprintln!("error: {}:{}:{}: {}", filename, e.line, e.column, e.message);
            }
            std::process::exit(EXIT_COMPILE_ERROR);
        }
        Err(PipelineError::Parse(e)) => {
            eprintln!("error: {}: {}", filename, e);
            std::process::exit(EXIT_COMPILE_ERROR);
        }
        Err(PipelineError::Pass { diagnostics, .. }) => {
            print_diagnostics(&diagnostics, &filename, &source, diag_format);
            std::process::exit(EXIT_COMPILE_ERROR);
        }
    };

    let c_source = emit(&output.tree, &output.symbols);
    let (cz_h, cz_c) = RuntimeWriter::write(&output.symbols.pragma_ctx);

    match cli.command {
        Commands::Compile { output: out_path, .. } => {
            write_outputs(source_path, &out_path, &c_source, &cz_h, &cz_c, verbose);
            std::process::exit(EXIT_OK);
        }
        Commands::Build { output: out_path, .. } => {
            let (bin_path, c_path, _, _) =
                write_outputs(source_path, &out_path, &c_source, &cz_h, &cz_c, verbose);
            let status = run_cc(&c_path, &bin_path, release, &[], verbose);
            match status {
                Ok(true) => std::process::exit(EXIT_OK),
                Ok(false) => std::process::exit(EXIT_COMPILE_ERROR),
                Err(code) => std::process::exit(code),
            }
        }
        Commands::Run { .. } => {
            let default_out = source_path.with_extension("");
            let (bin_path, c_path, _, _) =
                write_outputs(source_path, &None, &c_source, &cz_h, &cz_c, verbose);
            let _ = default_out;
            match run_cc(&c_path, &bin_path, release, &[], verbose) {
                Ok(true) => {}
                Ok(false) => std::process::exit(EXIT_COMPILE_ERROR),
                Err(code) => std::process::exit(code),
            }
            if verbose {
                eprintln!("czar: running {}", bin_path.display());
            }
            let status = Command::new(&bin_path).status();
            match status {
                Ok(s) => std::process::exit(s.code().unwrap_or(EXIT_COMPILE_ERROR)),
                Err(e) => {
                    eprintln!("error: failed to run {}: {}", bin_path.display(), e);
                    std::process::exit(EXIT_COMPILE_ERROR);
                }
            }
        }
        Commands::Asm { .. } => {
            let (bin_path, c_path, _, _) =
                write_outputs(source_path, &None, &c_source, &cz_h, &cz_c, verbose);
            let asm_path = bin_path.with_extension("s");
            match run_cc(&c_path, &asm_path, release, &["-S".to_string()], verbose) {
                Ok(true) => {
                    println!("{}", asm_path.display());
                    std::process::exit(EXIT_OK);
                }
                Ok(false) => std::process::exit(EXIT_COMPILE_ERROR),
                Err(code) => std::process::exit(code),
            }
        }
        Commands::Test { .. } => {
            let test_fns = scan_test_functions(&source);
            if test_fns.is_empty() {
                eprintln!("czar: no #[cz_test]-tagged functions found in {}", filename);
                std::process::exit(EXIT_OK);
            }
            let harness = build_test_harness(&test_fns);
            let (bin_path, c_path, _, _) =
                write_outputs(source_path, &None, &c_source, &cz_h, &cz_c, verbose);
            let harness_path = c_path.with_extension("harness.c");
            if let Err(e) = std::fs::write(&harness_path, &harness) {
                eprintln!("error: failed to write {}: {}", harness_path.display(), e);
                std::process::exit(EXIT_USAGE_ERROR);
            }
            match run_cc_sources(&[c_path, harness_path], &bin_path, release, &[], verbose) {
                Ok(true) => {}
                Ok(false) => std::process::exit(EXIT_COMPILE_ERROR),
                Err(code) => std::process::exit(code),
            }
            let status = Command::new(&bin_path).status();
            match status {
                Ok(s) => std::process::exit(s.code().unwrap_or(EXIT_COMPILE_ERROR)),
                Err(e) => {
                    eprintln!("error: failed to run {}: {}", bin_path.display(), e);
                    std::process::exit(EXIT_COMPILE_ERROR);
                }
            }
        }
        Commands::Clean { .. } | Commands::Format { .. } => unreachable!(),
    }
}

fn print_diagnostics(diags: &[Diagnostic], filename: &str, source: &str, format: DiagnosticFormat) {
    match format {
        DiagnosticFormat::Human => eprint!("{}", render_all_human(diags, filename, source)),
        DiagnosticFormat::Json => eprintln!("{}", render_all_json(diags)),
    }
}

/// `compile`/`build`/`run`/`asm` all need the same three sibling output
/// paths: the primary artifact (`.c` for compile, the binary for the rest),
/// plus `cz.h`/`cz.c` written next to it. Returns `(binary_stem, c_path,
/// cz_h_path, cz_c_path)`.
fn write_outputs(
    source_path: &Path,
    requested_output: &Option<PathBuf>,
    c_source: &str,
    cz_h: &str,
    cz_c: &str,
    verbose: bool,
) -> (PathBuf, PathBuf, PathBuf, PathBuf) {
    let dir = source_path.parent().unwrap_or_else(|| Path::new("."));
    let stem = source_path
        .file_stem()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("a"));

    let c_path = requested_output
        .clone()
        .unwrap_or_else(|| dir.join(stem.with_extension("c")));
    let bin_path = requested_output
        .clone()
        .unwrap_or_else(|| dir.join(&stem));
    let cz_h_path = dir.join("cz.h");
    let cz_c_path = dir.join("cz.c");

    write_or_exit(&c_path, c_source, verbose);
    write_or_exit(&cz_h_path, cz_h, verbose);
    write_or_exit(&cz_c_path, cz_c, verbose);

    (bin_path, c_path, cz_h_path, cz_c_path)
}

fn write_or_exit(path: &Path, content: &str, verbose: bool) {
    if let Err(e) = std::fs::write(path, content) {
        eprintln!("error: failed to write {}: {}", path.display(), e);
        std::process::exit(EXIT_USAGE_ERROR);
    }
    if verbose {
        eprintln!("czar: wrote {}", path.display());
    }
}

/// Invoke `$CZAR_CC` (default `cc`) on one C source plus `cz.c`.
fn run_cc(
    c_path: &Path,
    out_path: &Path,
    release: bool,
    extra_flags: &[String],
    verbose: bool,
) -> Result<bool, i32> {
    let cz_c = c_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("cz.c");
    run_cc_sources(&[c_path.to_path_buf(), cz_c], out_path, release, extra_flags, verbose)
}

fn run_cc_sources(
    sources: &[PathBuf],
    out_path: &Path,
    release: bool,
    extra_flags: &[String],
    verbose: bool,
) -> Result<bool, i32> {
    let cc = std::env::var("CZAR_CC").unwrap_or_else(|_| "cc".to_string());
    let mut cmd = Command::new(&cc);
    cmd.arg("-std=c11");
    if release {
        cmd.arg("-O2").arg("-DNDEBUG");
    } else {
        cmd.arg("-O0").arg("-g");
    }
    for flag in extra_flags {
        cmd.arg(flag);
    }
    cmd.arg("-o").arg(out_path);
    for src in sources {
        cmd.arg(src);
    }

    if verbose {
        eprintln!("czar: running {:?}", cmd);
    }

    let status = cmd.status().map_err(|e| {
        eprintln!("error: failed to run C compiler '{}': {}", cc, e);
        EXIT_COMPILE_ERROR
    })?;
    Ok(status.success())
}

fn clean_artifacts(source_path: &Path, verbose: bool) {
    let dir = source_path.parent().unwrap_or_else(|| Path::new("."));
    let stem = source_path.file_stem().map(PathBuf::from);
    let mut candidates = vec![dir.join("cz.h"), dir.join("cz.c")];
    if let Some(stem) = &stem {
        candidates.push(dir.join(stem.with_extension("c")));
        candidates.push(dir.join(stem.with_extension("s")));
        candidates.push(dir.join(stem));
    }
    for path in candidates {
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                eprintln!("warning: failed to remove {}: {}", path.display(), e);
            } else if verbose {
                eprintln!("czar: removed {}", path.display());
            }
        }
    }
}

/// `format`: re-serialize the lexed token stream with canonical whitespace.
/// No pass pipeline runs — purely a lexical round trip.
fn canonical_format(source: &str) -> String {
    let result = lex(source);
    let mut out = String::new();
    let mut at_line_start = true;
    for tok in &result.tokens {
        use czar::token::TokenKind;
        if tok.kind == TokenKind::Eof {
            continue;
        }
        if tok.kind == TokenKind::Preprocessor || tok.kind == TokenKind::Comment {
            if !at_line_start {
                out.push('\n');
            }
            out.push_str(&tok.text);
            out.push('\n');
            at_line_start = true;
            continue;
        }
        if !at_line_start {
            out.push(' ');
        }
        out.push_str(&tok.text);
        at_line_start = false;
    }
    if !at_line_start {
        out.push('\n');
    }
    out
}

/// Scan the raw source textually for `#[cz_test]` tags immediately
/// preceding a `fn name(...)` — out of core-pass scope per the language
/// spec's `test` subcommand description, so this runs before P1 rather than
/// as a pipeline pass.
fn scan_test_functions(source: &str) -> Vec<String> {
    let mut names = Vec::new();
    let lines: Vec<&str> = source.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        if line.trim() != "#[cz_test]" {
            continue;
        }
        if let Some(next) = lines.get(i + 1) {
            if let Some(rest) = next.trim_start().strip_prefix("fn ") {
                if let Some(paren) = rest.find('(') {
                    names.push(rest[..paren].trim().to_string());
                }
            }
        }
    }
    names
}

fn build_test_harness(test_fns: &[String]) -> String {
    let mut out = String::new();
    out.push_str("#include \"cz.h\"\n\n");
    for name in test_fns {
        out.push_str(&format!("extern void {name}(void);\n"));
    }
    out.push_str("\nint main(void) {\n");
    out.push_str(&format!("    int total = {};\n", test_fns.len()));
    out.push_str("    int passed = 0;\n");
    for name in test_fns {
        out.push_str(&format!(
            "    cz_log_info(\"running {name}\");\n    {name}();\n    passed++;\n"
        ));
    }
    out.push_str(
        "    cz_log_info(\"%d/%d tests passed\", passed, total);\n    return passed == total ? 0 : 1;\n}\n",
    );
    out
}
