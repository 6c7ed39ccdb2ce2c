//! clap command tree.
//!
//! The same tree serves shell mode (`starling purchase alice cafe`) and each
//! REPL/pipe line (`purchase alice cafe`).

use clap::{Arg, ArgAction, Command};

/// Top-level command with global flags, for shell mode.
pub fn build_cli() -> Command {
    with_subcommands(
        Command::new("starling")
            .about("Loyalty-sticker progression store")
            .version(env!("CARGO_PKG_VERSION"))
            .arg(
                Arg::new("db")
                    .long("db")
                    .value_name("PATH")
                    .help("Database directory (default: .starling)"),
            )
            .arg(
                Arg::new("config")
                    .long("config")
                    .short('c')
                    .value_name("FILE")
                    .help("TOML configuration file"),
            )
            .arg(
                Arg::new("ephemeral")
                    .long("ephemeral")
                    .action(ArgAction::SetTrue)
                    .conflicts_with("db")
                    .help("In-memory database, nothing written to disk"),
            )
            .arg(
                Arg::new("json")
                    .long("json")
                    .action(ArgAction::SetTrue)
                    .help("Print results as JSON"),
            )
            .arg(
                Arg::new("verbose")
                    .long("verbose")
                    .short('v')
                    .action(ArgAction::Count)
                    .help("Log to stderr (-v info, -vv debug, -vvv trace)"),
            ),
    )
}

/// Command tree for one REPL or pipe line.
pub fn build_repl_cli() -> Command {
    with_subcommands(
        Command::new("starling")
            .no_binary_name(true)
            .disable_version_flag(true)
            .disable_help_flag(true),
    )
}

fn user_arg() -> Arg {
    Arg::new("user").required(true).help("User id")
}

fn store_arg() -> Arg {
    Arg::new("store").required(true).help("Store id")
}

fn with_subcommands(cmd: Command) -> Command {
    cmd.subcommand(
        Command::new("purchase")
            .about("Record one purchase: one star, maybe a level-up")
            .arg(user_arg())
            .arg(store_arg())
            .arg(
                Arg::new("count")
                    .long("count")
                    .short('n')
                    .value_name("N")
                    .help("Record N purchases in a row"),
            ),
    )
    .subcommand(
        Command::new("progress")
            .about("Show the raw record of a user at a store")
            .arg(user_arg())
            .arg(store_arg()),
    )
    .subcommand(
        Command::new("list")
            .about("List every raw record of a user")
            .arg(user_arg()),
    )
    .subcommand(
        Command::new("sticker")
            .about("Show a sticker with its store's name and location")
            .arg(user_arg())
            .arg(store_arg()),
    )
    .subcommand(
        Command::new("stickers")
            .about("Show every sticker of a user")
            .arg(user_arg()),
    )
    .subcommand(
        Command::new("user")
            .about("User directory")
            .subcommand_required(true)
            .subcommand(
                Command::new("add")
                    .about("Register a user (idempotent by username)")
                    .arg(Arg::new("username").required(true)),
            )
            .subcommand(
                Command::new("get")
                    .about("Look up a user by id or username")
                    .arg(Arg::new("user").required(true)),
            ),
    )
    .subcommand(
        Command::new("store")
            .about("Store directory")
            .subcommand_required(true)
            .subcommand(
                Command::new("add")
                    .about("Register a store")
                    .arg(Arg::new("name").required(true))
                    .arg(Arg::new("location").required(true))
                    .arg(
                        Arg::new("id")
                            .long("id")
                            .value_name("STORE_ID")
                            .help("Use this id instead of a generated one"),
                    ),
            )
            .subcommand(
                Command::new("get")
                    .about("Look up a store")
                    .arg(store_arg()),
            ),
    )
    .subcommand(Command::new("stores").about("List registered stores"))
    .subcommand(Command::new("thresholds").about("Show the level threshold table"))
    .subcommand(Command::new("info").about("Database path, durability, recovery and counters"))
    .subcommand(Command::new("flush").about("Force buffered writes to disk"))
}
