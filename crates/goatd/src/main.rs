//! goatd — the Best Goats daemon.
//!
//! Assembles config, the key-value store, the goats module, the request
//! forwarder and the HTTP trigger into one process.
//!
//! # Usage
//!
//! ```text
//! goatd scaffold > goats.toml
//! goatd seed --config goats.toml --file featured.json
//! goatd serve --config goats.toml
//! ```

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "goatd", about = "Best Goats daemon", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the site.
    Serve {
        /// Path to goats.toml. Defaults are used when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the port from the config's bind address.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Load the featured goat catalogue from a JSON array.
    Seed {
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// JSON file with the goats to feature.
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Print a default goats.toml.
    Scaffold,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("info,goatd=debug,goats_app=debug")
                }),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config, port } => {
            let config = serve::load_config(config.as_deref(), port)?;
            serve::run(config).await
        }
        Command::Seed { config, file } => {
            let config = serve::load_config(config.as_deref(), None)?;
            serve::seed(&config, &file)
        }
        Command::Scaffold => {
            print!("{}", goats_core::GoatsConfig::default().to_toml_string()?);
            Ok(())
        }
    }
}
