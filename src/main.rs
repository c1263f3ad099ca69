//! Notes tracker CLI entry point.

use clap::Parser;
use nt::cli::commands;
use nt::cli::workspace::Workspace;
use nt::cli::{Cli, Commands};
use nt::config::Config;
use nt::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    // Resolve effective JSON mode: --json OR non-TTY stdout
    let json = cli.json || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    // Run the command and handle errors
    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
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
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    // Commands that never touch a repository
    match &cli.command {
        Commands::Version => return commands::version::execute(json),
        Commands::Completions { shell } => return commands::completions::execute(shell),
        _ => {}
    }

    let config = Config::resolve(
        cli.repo.as_deref(),
        cli.author.as_deref(),
        cli.remote.as_deref(),
        cli.anchor.as_deref(),
    );
    let pinned = config.anchor.is_some();
    let ws = Workspace::open(config)?;

    match &cli.command {
        Commands::Project { command } => commands::project::execute(command, &ws, json),
        Commands::Issue { command } => commands::issue::execute(command, &ws, json),
        Commands::Comment { command } => commands::comment::execute(command, &ws, json),
        Commands::Sync { command } => commands::sync::execute(command, &ws, json),
        Commands::Anchor => commands::anchor::execute(&ws, pinned, json),
        Commands::Hook { command } => commands::hook::execute(command, &ws, json),
        Commands::Version | Commands::Completions { .. } => Ok(()),
    }
}
