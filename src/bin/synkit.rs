//! Command-line interface for synkit
//! Inspects how the toolkit sees a file: its tokens, or its tree under the reference grammar.
//!
//! Usage:
//!   synkit tokens `<path>` [--config `<cfg.json|yaml>`] [--json]  - Print the token stream
//!   synkit tree `<path>` [--no-tokens] [--no-trivia] [--trace]    - Parse with calc, print tree and diagnostics
//!
//! Exit status: 0 on valid input, 1 on invalid input, 2 on I/O or configuration errors.

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::process::ExitCode;
use synkit::synkit::diagnostics::collect_diagnostics;
use synkit::synkit::formats::{to_treeviz_str_with, TreevizOptions};
use synkit::synkit::lexing::{tokenize, LexerConfig};
use synkit::synkit::parsing::ParserSession;
use synkit::synkit::testing::calc::{self, Calc};
use synkit::synkit::trace::RecordingTracer;
use synkit::synkit::{TokenType, TreeBuilder};

const EXIT_INVALID: u8 = 1;
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    let matches = Command::new("synkit")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect tokens and syntax trees produced by synkit")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("tokens")
                .about("Tokenize a file and print the tokens")
                .arg(
                    Arg::new("path")
                        .help("Path to the source file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .help("Lexer config (.json, .yaml or .yml); defaults to the C-like preset"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the tokens as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("tree")
                .about("Parse a file with the calc grammar and print its tree")
                .arg(
                    Arg::new("path")
                        .help("Path to the source file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("no-tokens")
                        .long("no-tokens")
                        .help("Only print nodes")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no-trivia")
                        .long("no-trivia")
                        .help("Hide whitespace and comment tokens")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("trace")
                        .long("trace")
                        .help("Print the parser and builder trace to stderr")
                        .action(ArgAction::SetTrue),
                ),
        )
        .get_matches();

    let result = match matches.subcommand() {
        Some(("tokens", tokens_matches)) => handle_tokens_command(tokens_matches),
        Some(("tree", tree_matches)) => handle_tree_command(tree_matches),
        _ => unreachable!(),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_INVALID),
        Err(message) => {
            eprintln!("Error: {}", message);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn read_source(matches: &ArgMatches) -> Result<String, String> {
    let path = matches
        .get_one::<String>("path")
        .ok_or_else(|| "missing path".to_string())?;
    std::fs::read_to_string(path).map_err(|e| format!("Cannot read {}: {}", path, e))
}

/// Handle the tokens command. Returns whether the input lexed without errors.
fn handle_tokens_command(matches: &ArgMatches) -> Result<bool, String> {
    let source = read_source(matches)?;
    let config = match matches.get_one::<String>("config") {
        Some(path) => LexerConfig::load(path).map_err(|e| e.to_string())?,
        None => LexerConfig::c_like(),
    };

    let tokens = tokenize(&source, &config, None);
    if matches.get_flag("json") {
        let json = serde_json::to_string_pretty(&tokens).map_err(|e| e.to_string())?;
        println!("{}", json);
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    Ok(tokens.iter().all(|t| t.kind != TokenType::Error))
}

/// Handle the tree command. Returns whether the tree is valid.
fn handle_tree_command(matches: &ArgMatches) -> Result<bool, String> {
    let source = read_source(matches)?;
    let tracer = RecordingTracer::new();

    let mut session = ParserSession::from_source(&source, &calc::config());
    let mut builder = TreeBuilder::new(calc::registry());
    if matches.get_flag("trace") {
        session = session.with_tracer(Box::new(tracer.clone()));
        builder = builder.with_tracer(Box::new(tracer.clone()));
    }

    Calc.parse_program(&mut session);
    let result = session.finish();
    let output = builder.build(&result.tokens, &result.completed_markers, &result.errors);

    for event in tracer.events() {
        eprintln!("{}", event);
    }

    let options = TreevizOptions {
        show_tokens: !matches.get_flag("no-tokens"),
        show_trivia: !matches.get_flag("no-trivia"),
    };
    print!("{}", to_treeviz_str_with(&output.root, options));

    let diagnostics = collect_diagnostics(&source, &output.root);
    if !diagnostics.is_empty() {
        println!();
        for diagnostic in &diagnostics {
            println!("{}", diagnostic.render(&source));
        }
    }
    for anomaly in &output.anomalies {
        println!("anomaly: {}", anomaly);
    }

    Ok(output.valid)
}
