//! Castle Manor - Development Tools

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "manor-tools")]
#[command(about = "Development tools for Castle Manor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a catalog or server config file
    Validate {
        /// Catalog file
        #[arg(long, default_value = "assets/data/manor_catalog.ron")]
        catalog: PathBuf,
        /// Server config file; also validates the catalog it names
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print upcoming mode changes for a server config
    Schedule {
        /// Server config file
        #[arg(default_value = manor_server::DEFAULT_CONFIG_PATH)]
        config: PathBuf,
        /// Number of transitions to print
        #[arg(short, long, default_value_t = 6)]
        count: usize,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { catalog, config } => {
            let outcome = match &config {
                Some(config) => {
                    tracing::info!("Validating server config: {}", config.display());
                    manor_tools::validate::validate_server_config(config).map(|_| ())
                }
                None => {
                    tracing::info!("Validating catalog: {}", catalog.display());
                    manor_tools::validate::validate_catalog(&catalog).map(|_| ())
                }
            };
            match outcome {
                Ok(()) => tracing::info!("Validation passed"),
                Err(e) => {
                    tracing::error!("Validation failed: {e}");
                    if let manor_tools::validate::ValidateError::Problems { problems, .. } = &e {
                        for problem in problems {
                            tracing::error!("  {problem}");
                        }
                    }
                    std::process::exit(1);
                }
            }
        }
        Commands::Schedule { config, count } => {
            let text = match std::fs::read_to_string(&config) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!("Failed to read {}: {e}", config.display());
                    std::process::exit(1);
                }
            };
            let server = match manor_server::ServerConfig::from_ron_str(&text, &config) {
                Ok(server) => server,
                Err(e) => {
                    tracing::error!("{e}");
                    std::process::exit(1);
                }
            };
            let now = chrono::Local::now().naive_local();
            let (mode, transitions) = manor_tools::schedule::upcoming_transitions(
                &server.manor.schedule,
                now,
                count,
            );
            println!("{now}  {mode}");
            for (at, mode) in transitions {
                println!("{at}  {mode}");
            }
        }
    }
}
