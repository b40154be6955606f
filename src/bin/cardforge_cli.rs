//! CardForge CLI
//!
//! Commands: create, shuffle, layers, validate
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 on validation failure, 1 on any other failure

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cardforge_core::{
    export_shuffled, shuffle::DEFAULT_EXPORT_COUNT, Catalog, GenerationPipeline, GeneratorConfig,
    OutputLayout, RasterSurface, Strategy, Validator,
};

#[derive(Parser)]
#[command(name = "cardforge-cli", version)]
#[command(about = "CardForge CLI - Generative Card Art Compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the generator configuration
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose artworks and write images plus metadata
    Create {
        /// Enumeration strategy
        #[arg(short, long, value_enum, default_value_t = Strategy::Pairwise)]
        strategy: Strategy,

        /// Seed for reproducible rarity draws
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Copy a random renumbered subset of json/ into json_rand/
    Shuffle {
        /// Number of files to export
        #[arg(short = 'n', long, default_value_t = DEFAULT_EXPORT_COUNT)]
        count: usize,

        /// Seed for a reproducible ordering
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the loaded layer catalog
    Layers,

    /// Validate the configuration for a strategy
    Validate {
        #[arg(short, long, value_enum, default_value_t = Strategy::Pairwise)]
        strategy: Strategy,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            let output = serde_json::json!({
                "success": false,
                "error": format!("{:#}", e),
            });
            println!("{}", output);
            ExitCode::FAILURE
        }
    }
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn load_config(path: &Path) -> anyhow::Result<GeneratorConfig> {
    GeneratorConfig::load(path).with_context(|| format!("load configuration '{}'", path.display()))
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let layout = OutputLayout::new(&cli.output);

    match cli.command {
        Commands::Create { strategy, seed } => {
            let config = load_config(&cli.config)?;
            let validation = Validator::new().validate(&config, strategy);
            if !validation.valid {
                println!("{}", serde_json::to_string_pretty(&validation)?);
                return Ok(ExitCode::from(2));
            }

            let catalog = Catalog::load(&config).context("load layer catalog")?;
            let pipeline = GenerationPipeline::new(&config, &catalog, layout);
            let mut surface = RasterSurface::new(config.canvas_size());
            let mut rng = rng_from(seed);

            let summary = pipeline.run(strategy, &mut surface, &mut rng)?;
            let output = serde_json::json!({
                "success": true,
                "runId": summary.run_id,
                "artworks": summary.artworks,
                "output": summary.output,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Shuffle { count, seed } => {
            let mut rng = rng_from(seed);
            let copied = export_shuffled(&layout.json_dir(), &layout.json_rand_dir(), count, &mut rng)?;
            let output = serde_json::json!({
                "success": true,
                "copied": copied.len(),
                "target": layout.json_rand_dir(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Layers => {
            let config = load_config(&cli.config)?;
            let catalog = Catalog::load(&config).context("load layer catalog")?;
            println!("{}", serde_json::to_string_pretty(&catalog)?);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Validate { strategy } => {
            let config = load_config(&cli.config)?;
            let result = Validator::new().validate(&config, strategy);
            println!("{}", serde_json::to_string_pretty(&result)?);
            if result.valid {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(2))
            }
        }
    }
}
