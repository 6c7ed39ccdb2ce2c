//! Starling CLI.
//!
//! Three modes:
//! - **Shell mode**: `starling [flags] COMMAND` — single command, exit
//! - **REPL mode**: `starling [flags]` — interactive prompt (if stdin is TTY)
//! - **Pipe mode**: `echo "purchase alice cafe" | starling` — line-by-line from stdin

mod commands;
mod format;
mod parse;
mod repl;
mod state;

use std::io::IsTerminal;
use std::process;

use starling::{Starling, StarlingConfig};
use tracing::debug;

use commands::build_cli;
use format::{format_error, format_output, OutputMode};
use parse::matches_to_command;
use state::SessionState;

fn main() {
    let cli = build_cli();
    let matches = cli.get_matches();

    init_logging(matches.get_count("verbose"));

    let output_mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let db = match open_database(&matches) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    debug!(path = %db.path().display(), ephemeral = db.is_ephemeral(), "database ready");

    let mut state = SessionState::new(db);

    if matches.subcommand().is_some() {
        let exit_code = run_shell_mode(&matches, &mut state, output_mode);
        process::exit(exit_code);
    } else if std::io::stdin().is_terminal() {
        repl::run_repl(&mut state, output_mode);
    } else {
        let exit_code = repl::run_pipe(&mut state, output_mode);
        process::exit(exit_code);
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(verbosity > 1)
        .with_writer(std::io::stderr)
        .init();
}

fn open_database(matches: &clap::ArgMatches) -> Result<Starling, String> {
    let mut builder = Starling::builder();

    if let Some(path) = matches.get_one::<String>("config") {
        let config = StarlingConfig::load(path)
            .map_err(|e| format!("Failed to load config {}: {}", path, e))?;
        builder = builder.config(config);
    }

    if matches.get_flag("ephemeral") {
        return builder
            .open()
            .map_err(|e| format!("Failed to open ephemeral database: {}", e));
    }

    let path = matches
        .get_one::<String>("db")
        .map(|s| s.as_str())
        .unwrap_or(".starling");
    builder
        .path(path)
        .open()
        .map_err(|e| format!("Failed to open database: {}", e))
}

fn run_shell_mode(matches: &clap::ArgMatches, state: &mut SessionState, mode: OutputMode) -> i32 {
    let code = match matches_to_command(matches) {
        Ok(cmd) => match state.execute(cmd) {
            Ok(output) => {
                let formatted = format_output(&output, mode);
                if !formatted.is_empty() {
                    println!("{}", formatted);
                }
                0
            }
            Err(e) => {
                eprintln!("{}", format_error(&e, mode));
                1
            }
        },
        Err(e) => {
            eprintln!("(error) {}", e);
            1
        }
    };

    if let Err(e) = state.db().close() {
        eprintln!("{}", format_error(&e, mode));
        return 1;
    }
    code
}
