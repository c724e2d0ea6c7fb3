mod analysis;
mod config;
mod data;
mod live;
mod manager;
mod model;
mod stats;

use crate::manager::Manager;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[arg(long)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Analyze {
        #[arg(long)]
        city: Option<String>,
    },

    Classify {
        #[arg(long)]
        city: String,

        #[arg(long, allow_negative_numbers = true)]
        temp: f64,

        #[arg(long)]
        day: Option<u32>,
    },

    Clean,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(args.data_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Analyze { city } => mgr.analyze(city.as_deref())?,
        Command::Classify { city, temp, day } => mgr.classify(&city, temp, day)?,
        Command::Clean => mgr.clean()?,
    }

    Ok(())
}
