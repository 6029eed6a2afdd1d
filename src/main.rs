//! ordis CLI - schema-first extraction tool.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ordis::schema::loader::load_schema;
use ordis::{extract, ExtractionRequest, LlmConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ordis", version, about = "Schema-first LLM extraction tool")]
struct Cli {
    /// Enable verbose debug output
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract structured data from a text file using a schema
    Extract {
        /// Path to schema definition file (JSON)
        #[arg(long)]
        schema: String,

        /// Path to input text file
        #[arg(long)]
        input: String,

        /// Base URL for OpenAI-compatible API
        #[arg(long, default_value = "http://localhost:11434/v1")]
        base: String,

        /// Model name to use for extraction
        #[arg(long)]
        model: String,

        /// Environment variable holding the API key, if the endpoint needs one
        #[arg(long, default_value = "ORDIS_API_KEY")]
        api_key_env: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "ordis=debug" } else { "ordis=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    match cli.command {
        Command::Extract {
            schema,
            input,
            base,
            model,
            api_key_env,
        } => run_extract(&schema, &input, &base, &model, &api_key_env),
    }
}

fn run_extract(
    schema_path: &str,
    input_path: &str,
    base_url: &str,
    model: &str,
    api_key_env: &str,
) -> Result<()> {
    let schema = load_schema(schema_path)?;
    let input = std::fs::read_to_string(input_path)
        .with_context(|| format!("failed to read input file {input_path}"))?;

    let mut config = LlmConfig::new(base_url, model);
    if let Ok(key) = std::env::var(api_key_env) {
        if !key.is_empty() {
            config = config.api_key(key);
        }
    }

    let request = ExtractionRequest {
        input,
        schema,
        config,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let result = runtime.block_on(extract(&request));

    println!("{}", serde_json::to_string_pretty(&result.to_json())?);

    if result.is_success() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}
