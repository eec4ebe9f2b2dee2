use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use loadout_core::{load_settings_from_env, CharacterKey, LedgerStore};
use tracing::info;

mod commands;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Inspect and maintain weapon loadout ledgers",
    long_about = None
)]
struct Cli {
    /// Directory holding the ledger files. Defaults to the configured save directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every recorded weapon.
    Inspect {
        /// Roster name (michael, franklin, ...) or model hash.
        #[arg(long)]
        character: Option<CharacterKey>,
    },
    /// Decode each ledger file strictly and report its state.
    Verify,
    /// Write all five ledgers as one JSON document.
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replace the ledgers with the contents of a JSON export.
    Import {
        #[arg(long)]
        input: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();
    let dir = match cli.dir {
        Some(dir) => dir,
        None => load_settings_from_env().0.save_dir().to_path_buf(),
    };
    let store = LedgerStore::new(dir);
    info!(target: "loadout::cli", dir = %store.dir().display(), "ledger.dir");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Inspect { character } => {
            commands::inspect(&mut out, &store.load_all(), character)?;
        }
        Command::Verify => {
            let report = commands::verify(&store);
            commands::write_verify_report(&mut out, &report)?;
            if report.iter().any(|(_, status)| status.is_malformed()) {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Export { out: path } => {
            let json = commands::export(&store, path.as_deref())?;
            if path.is_none() {
                writeln!(out, "{json}")?;
            }
        }
        Command::Import { input } => {
            let characters = commands::import(&store, &input)?;
            writeln!(out, "imported {characters} characters into {}", store.dir().display())?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
