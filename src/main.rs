//! empsync CLI entry point.

use clap::Parser;
use empsync::cli::commands;
use empsync::cli::{Cli, Commands};
use empsync::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,rusqlite=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<(), Error> {
    let db = cli.db.as_ref();
    let document = cli.document.as_ref();
    let json = cli.json;

    match &cli.command {
        Commands::Init => commands::init::execute(db, document, json),
        Commands::Validate { file } => commands::validate::execute(file, json),

        // Writes
        Commands::Add(args) => commands::add::execute(args, db, document, json),
        Commands::Sync { file, dry_run } => {
            commands::sync::execute(file, *dry_run, db, document, json)
        }

        // Reads
        Commands::Current { phone } => commands::query::current(phone, db, json),
        Commands::History { phone } => commands::query::history(phone, db, json),
        Commands::Edges => commands::query::edges(db, json),
        Commands::Export { output } => commands::export::execute(output.as_ref(), db, json),

        Commands::Version => commands::version::execute(json),
        Commands::Completions { shell } => commands::completions::execute(shell),
    }
}
