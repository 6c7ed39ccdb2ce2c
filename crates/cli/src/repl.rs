//! REPL and pipe modes.
//!
//! Each line is split with shell quoting rules, checked for a meta-command,
//! then parsed with the same clap tree as shell mode.

use std::io::BufRead;
use std::path::PathBuf;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::commands::build_repl_cli;
use crate::format::{format_error, format_output, OutputMode};
use crate::parse::{check_meta_command, matches_to_command, MetaCommand};
use crate::state::SessionState;

const PROMPT: &str = "starling> ";

/// What happened to one input line.
enum LineOutcome {
    Continue,
    Failed,
    Quit,
}

/// Interactive prompt with history.
pub fn run_repl(state: &mut SessionState, mode: OutputMode) {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("(error) cannot start line editor: {}", e);
            return;
        }
    };
    let history = history_path();
    if let Some(path) = &history {
        let _ = rl.load_history(path);
    }

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                if let LineOutcome::Quit = run_line(state, &line, mode) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("(error) {}", e);
                break;
            }
        }
    }

    if let Some(path) = &history {
        let _ = rl.save_history(path);
    }
    if let Err(e) = state.db().close() {
        eprintln!("{}", format_error(&e, mode));
    }
}

/// Line-by-line from stdin; exit code 1 if any line failed.
pub fn run_pipe(state: &mut SessionState, mode: OutputMode) -> i32 {
    let stdin = std::io::stdin();
    let mut exit_code = 0;
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("(error) {}", e);
                return 1;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match run_line(state, trimmed, mode) {
            LineOutcome::Continue => {}
            LineOutcome::Failed => exit_code = 1,
            LineOutcome::Quit => break,
        }
    }
    if let Err(e) = state.db().close() {
        eprintln!("{}", format_error(&e, mode));
        exit_code = 1;
    }
    exit_code
}

fn run_line(state: &mut SessionState, line: &str, mode: OutputMode) -> LineOutcome {
    if let Some(meta) = check_meta_command(line) {
        return run_meta(meta);
    }

    let words = match shlex::split(line) {
        Some(words) => words,
        None => {
            eprintln!("(error) unbalanced quotes");
            return LineOutcome::Failed;
        }
    };

    let matches = match build_repl_cli().try_get_matches_from(words) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{}", e.render().to_string().trim_end());
            return LineOutcome::Failed;
        }
    };

    match matches_to_command(&matches) {
        Ok(cmd) => match state.execute(cmd) {
            Ok(output) => {
                let formatted = format_output(&output, mode);
                if !formatted.is_empty() {
                    println!("{}", formatted);
                }
                LineOutcome::Continue
            }
            Err(e) => {
                eprintln!("{}", format_error(&e, mode));
                LineOutcome::Failed
            }
        },
        Err(e) => {
            eprintln!("(error) {}", e);
            LineOutcome::Failed
        }
    }
}

fn run_meta(meta: MetaCommand) -> LineOutcome {
    match meta {
        MetaCommand::Quit => LineOutcome::Quit,
        MetaCommand::Clear => {
            print!("\x1B[2J\x1B[1;1H");
            LineOutcome::Continue
        }
        MetaCommand::Help { command } => {
            let mut cli = build_repl_cli();
            let help = match command.as_deref() {
                Some(name) => match cli.find_subcommand_mut(name) {
                    Some(sub) => sub.render_help(),
                    None => {
                        eprintln!("(error) Unknown command: {}", name);
                        return LineOutcome::Failed;
                    }
                },
                None => cli.render_help(),
            };
            println!("{}", help);
            println!("Meta-commands: help [command], clear, quit");
            LineOutcome::Continue
        }
    }
}

fn history_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".starling_history"))
}
