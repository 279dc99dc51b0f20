//! Point d'entrée CLI pour coolector

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Outils en ligne de commande autour de la carte des remarques Coolector
#[derive(Parser)]
#[command(name = "coolector")]
#[command(author, version)]
#[command(about = "Rayon de recherche et simulation headless de la carte Coolector")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Radius { center, north_east } => {
            info!(center = %center, north_east = %north_east, "Calcul du rayon");
            cli::cmd_radius(center, north_east)?;
        }
        Commands::Simulate {
            lat,
            lng,
            remarks,
            preset,
            zoom,
            distinguish_liked,
            data_dir,
        } => {
            info!(lat, lng, preset = ?preset, "Simulation headless");
            cli::cmd_simulate(
                lat,
                lng,
                remarks.as_deref(),
                preset.as_deref(),
                zoom,
                distinguish_liked,
                data_dir,
            )?;
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

    // Les logs vont sur stderr : stdout est réservé au résultat
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
