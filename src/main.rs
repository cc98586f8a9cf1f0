//! tabula - Main Entry Point

use clap::Parser;
use tabula::cli::{cmd_demo, cmd_info, cmd_interactive, cmd_train, Cli, Commands, TrainOptions};

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `train --json` output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabula=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Info { data }) => {
            cmd_info(&data)?;
        }
        Some(Commands::Train { data, target, features, set, json, options }) => {
            cmd_train(&data, &target, features, &set, json, &options)?;
        }
        Some(Commands::Demo { rows, seed, kind, output }) => {
            cmd_demo(rows, seed, kind, output.as_deref())?;
        }
        Some(Commands::Interactive { data, options }) => {
            cmd_interactive(data.as_deref(), &options)?;
        }
        None => {
            cmd_interactive(None, &TrainOptions::default())?;
        }
    }

    Ok(())
}
