#![forbid(unsafe_code)]
//! fxstubs Command Line Interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fxstubs::commands::{
    execute_generate, execute_init, execute_inspect, GenerateOptions, InitOptions, InspectOptions,
};
use fxstubs::config::{Config, CONFIG_FILE};

#[derive(Parser)]
#[command(name = "fxstubs")]
#[command(about = "Generate LuaLS declarations from resource exports and state bags")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,

        /// Output directory to record in the config
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Scan resources and write declaration files
    Generate {
        /// Root directory holding resources
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Output directory (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the merged snapshot as JSON instead of Lua declarations
        #[arg(long)]
        json: bool,

        /// Let doc comment blocks continue across blank lines
        #[arg(long)]
        lenient_comments: bool,
    },

    /// Scan one file and print the extracted records as JSON
    Inspect {
        /// Lua file to scan
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise warnings only unless --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { force, output } => {
            let options = InitOptions {
                path: cli.config,
                force,
                output,
            };
            execute_init(options)?;
        }

        Commands::Generate {
            root,
            output,
            json,
            lenient_comments,
        } => {
            let config = Config::load_or_default(&cli.config)?;
            let options = GenerateOptions {
                root,
                output,
                json,
                lenient_comments,
            };
            execute_generate(options, config)?;
        }

        Commands::Inspect { file } => {
            let config = Config::load_or_default(&cli.config)?;
            execute_inspect(InspectOptions { file }, &config)?;
        }
    }

    Ok(())
}
