//! Point d'entrée CLI pour listed-map

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use listed_map::cli::{self, Commands};

// Charger .env au démarrage
fn load_env() {
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

/// Carte des bâtiments classés : ingestion, hotspots et tuiles vectorielles
#[derive(Parser)]
#[command(name = "listed-map")]
#[command(author, version)]
#[command(about = "Listed Buildings Map CLI - Process and tile historic building data")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    load_env();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Ingest(args) => {
            info!(csv = %args.csv_path.display(), output = %args.output.display(), "Ingest");
            cli::cmd_ingest(&args)?;
        }
        Commands::Hotspots(args) => {
            info!(input = %args.input.display(), config = %args.params.config, "Hotspots");
            let report = cli::cmd_hotspots(&args)?;
            println!("{}", report.summary());
        }
        Commands::Package(args) => {
            info!(docs_dir = %args.docs_dir.display(), "Package");
            cli::cmd_package(&args)?;
        }
        Commands::All {
            csv_path,
            params,
            min_zoom,
            max_zoom,
        } => {
            cli::cmd_all(&csv_path, &params, min_zoom, max_zoom)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
