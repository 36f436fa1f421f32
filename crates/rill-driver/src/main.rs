use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use rill_ast::{NameTable, Span};
use rill_lexer::{Lexer, Token, TokenKind};

#[derive(Parser)]
#[command(
    name = "rill",
    version = "0.1.0",
    about = "Compiler for the Rill language",
    long_about = "A compiler front-end for a small statically-typed language\n\
                  with explicit mutability, references and lifetime checking."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a source file without emitting anything
    Check {
        /// Input file
        input: PathBuf,

        /// Print diagnostics as plain `file:line:col: error: ...` lines
        #[arg(short, long)]
        plain: bool,
    },

    /// Compile a source file to C
    Build {
        /// Input file
        input: PathBuf,

        /// Output file path (defaults to the input with a .c extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print diagnostics as plain `file:line:col: error: ...` lines
        #[arg(short, long)]
        plain: bool,
    },

    /// Lex a source file and show tokens (debug)
    Lex {
        /// Input file
        input: PathBuf,
    },

    /// Parse a source file and show the AST (debug)
    Parse {
        /// Input file
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { input, plain } => check_command(input, plain),
        Commands::Build {
            input,
            output,
            plain,
        } => build_command(input, output, plain),
        Commands::Lex { input } => lex_command(input),
        Commands::Parse { input } => parse_command(input),
    }
}

/// Runs lex → parse → analyze, reporting any diagnostics along the way.
fn analyze_file(
    input: &Path,
    plain: bool,
) -> Result<(String, rill_sema::Sema, rill_ast::File), ExitCode> {
    let source = match read_source_file(input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error reading {}: {}", input.display(), e);
            return Err(ExitCode::FAILURE);
        }
    };
    let filename = input.to_string_lossy().to_string();

    log::debug!("lexing {}", filename);
    let tokens = Lexer::new(&source).tokenize();
    if report_lexer_errors(&tokens, &filename, &source, plain) {
        return Err(ExitCode::FAILURE);
    }

    log::debug!("parsing {}", filename);
    let mut names = NameTable::new();
    let mut file = match rill_parser::parse(tokens, &mut names) {
        Ok(file) => file,
        Err(errors) => {
            for err in &errors {
                report_error(&err.message, err.span, &filename, &source, plain);
            }
            return Err(ExitCode::FAILURE);
        }
    };

    log::debug!("analyzing {}", filename);
    match rill_sema::analyze(&mut file, names, &source) {
        Ok(sema) => Ok((source, sema, file)),
        Err(errors) => {
            for err in &errors {
                report_error(&err.to_string(), err.span, &filename, &source, plain);
            }
            Err(ExitCode::FAILURE)
        }
    }
}

fn check_command(input: PathBuf, plain: bool) -> ExitCode {
    match analyze_file(&input, plain) {
        Ok(_) => {
            println!("{}: no errors found", input.display());
            ExitCode::SUCCESS
        }
        Err(code) => code,
    }
}

fn build_command(input: PathBuf, output: Option<PathBuf>, plain: bool) -> ExitCode {
    let (_, sema, file) = match analyze_file(&input, plain) {
        Ok(parts) => parts,
        Err(code) => return code,
    };

    log::debug!("emitting C for {}", input.display());
    let code = match rill_codegen::generate(&sema, &file) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let output = output.unwrap_or_else(|| input.with_extension("c"));
    if let Err(e) = fs::write(&output, code) {
        eprintln!("error writing {}: {}", output.display(), e);
        return ExitCode::FAILURE;
    }
    println!("wrote {}", output.display());
    ExitCode::SUCCESS
}

fn lex_command(input: PathBuf) -> ExitCode {
    let source = match read_source_file(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error reading {}: {}", input.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let filename = input.to_string_lossy().to_string();

    let tokens = Lexer::new(&source).tokenize();
    for (i, token) in tokens.iter().enumerate() {
        println!(
            "{:4} | {:?} | {:?} | {}..{}",
            i, token.kind, token.text, token.span.start, token.span.end
        );
    }

    if report_lexer_errors(&tokens, &filename, &source, false) {
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn parse_command(input: PathBuf) -> ExitCode {
    let source = match read_source_file(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error reading {}: {}", input.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let filename = input.to_string_lossy().to_string();

    let tokens = Lexer::new(&source).tokenize();
    if report_lexer_errors(&tokens, &filename, &source, false) {
        return ExitCode::FAILURE;
    }

    let mut names = NameTable::new();
    match rill_parser::parse(tokens, &mut names) {
        Ok(file) => {
            println!("{:#?}", file);
            ExitCode::SUCCESS
        }
        Err(errors) => {
            for err in &errors {
                report_error(&err.message, err.span, &filename, &source, false);
            }
            ExitCode::FAILURE
        }
    }
}

// Helper functions

fn read_source_file(path: &Path) -> io::Result<String> {
    fs::read_to_string(path)
}

fn report_lexer_errors(tokens: &[Token], filename: &str, source: &str, plain: bool) -> bool {
    let mut any = false;
    for token in tokens.iter().filter(|t| t.kind == TokenKind::Error) {
        report_error(&token.text, token.span, filename, source, plain);
        any = true;
    }
    any
}

/// Renders one diagnostic, either as an ariadne report or as a plain
/// `file:line:col: error: message` line (1-based line and column).
fn report_error(message: &str, span: Span, filename: &str, source: &str, plain: bool) {
    if plain {
        let (line, col) = line_col(source, span.start);
        eprintln!("{}:{}:{}: error: {}", filename, line, col, message);
        return;
    }

    let report_span = (filename, span.start..span.end.max(span.start + 1));
    let _ = Report::build(ReportKind::Error, report_span.clone())
        .with_message(message)
        .with_label(
            Label::new(report_span)
                .with_message(message)
                .with_color(Color::Red),
        )
        .finish()
        .eprint((filename, Source::from(source)));
}

/// 1-based line and column of a byte offset.
fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let mut line = 1;
    let mut line_start = 0;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            line_start = i + 1;
        }
    }
    let col = source[line_start..offset].chars().count() + 1;
    (line, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_is_one_based() {
        let source = "ab\ncde\nf";
        assert_eq!(line_col(source, 0), (1, 1));
        assert_eq!(line_col(source, 1), (1, 2));
        assert_eq!(line_col(source, 3), (2, 1));
        assert_eq!(line_col(source, 5), (2, 3));
        assert_eq!(line_col(source, 7), (3, 1));
    }

    #[test]
    fn line_col_clamps_past_the_end() {
        assert_eq!(line_col("ab", 99), (1, 3));
    }
}
