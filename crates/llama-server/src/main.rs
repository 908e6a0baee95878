use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use llama_candle::{CandleLoader, CandleOptions};
use llama_server::{CommandServer, ServerConfig, ZmqTransport};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "llama-server",
    version,
    about = "Serve a causal language model over a ZeroMQ REP socket"
)]
struct Cli {
    /// Model directory (config.json, tokenizer.json, *.safetensors)
    model_path: PathBuf,

    /// Port to bind
    port: u16,

    /// Input token budget reported by TOKENIZE (capped by the model)
    max_input_tokens: usize,

    /// Tokens to sample per GENERATE
    max_new_tokens: usize,

    /// Sampling temperature (> 0)
    #[arg(allow_negative_numbers = true)]
    temperature: f32,

    /// Interface to bind on
    #[arg(long, default_value = "0.0.0.0")]
    bind_host: String,

    /// Fixed sampling seed
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    top_k: Option<usize>,

    #[arg(long)]
    top_p: Option<f32>,

    /// Never try accelerators
    #[arg(long)]
    cpu: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if !(cli.temperature > 0.0 && cli.temperature.is_finite()) {
        return Err(format!("temperature must be positive, got {}", cli.temperature).into());
    }

    let config = ServerConfig {
        model_path: cli.model_path,
        port: cli.port,
        max_input_tokens: cli.max_input_tokens,
        max_new_tokens: cli.max_new_tokens,
        temperature: cli.temperature,
    };
    let loader = Arc::new(CandleLoader::new(CandleOptions {
        seed: cli.seed,
        top_k: cli.top_k,
        top_p: cli.top_p,
        force_cpu: cli.cpu,
    }));

    let transport = ZmqTransport::bind(&cli.bind_host, config.port).await?;
    tracing::info!(
        endpoint = %transport.endpoint(),
        model = %config.model_path.display(),
        max_input_tokens = config.max_input_tokens,
        max_new_tokens = config.max_new_tokens,
        temperature = config.temperature,
        "listening"
    );

    CommandServer::new(transport, loader, config).run().await?;
    Ok(())
}
