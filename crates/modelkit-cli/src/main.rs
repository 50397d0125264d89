//! modelkit schema tool
//!
//! Validates model schema files and shows how field paths expand.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::OutputFormat;
use tracing_subscriber::EnvFilter;

/// modelkit schema tool
#[derive(Parser, Debug)]
#[command(name = "modelkit")]
#[command(version, about = "Validate modelkit schemas and expand field paths")]
pub struct Args {
    /// Output format
    #[arg(long, default_value = "text", value_enum, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the registry and summarize its models
    Check {
        /// Schema file (JSON)
        #[arg(short, long)]
        schema: PathBuf,
    },
    /// Expand a field list into the set of wire paths it reads
    Expand {
        #[arg(short, long)]
        schema: PathBuf,
        /// Model the fields belong to
        #[arg(short, long)]
        model: String,
        /// Field names or dotted paths
        #[arg(required = true)]
        fields: Vec<String>,
    },
    /// Resolve one dotted path to its wire path
    Resolve {
        #[arg(short, long)]
        schema: PathBuf,
        #[arg(short, long)]
        model: String,
        path: String,
    },
}

fn main() {
    let filter = EnvFilter::try_from_env("MODELKIT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("modelkit=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match commands::run(&args.command, args.format) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
