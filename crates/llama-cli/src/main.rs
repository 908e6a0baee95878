use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use clap::Parser;
use llama_cli::{ChatSession, Turn};
use llama_client::{ChatConfig, ConfigFile, ModelClient};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command as Process};
use tracing_subscriber::EnvFilter;

/// llama.rs console chat
#[derive(Parser)]
#[command(name = "llama-cli", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Chat with a model served by llama-server.
    Chat {
        /// Chat config file; created with defaults if missing.
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Start this llama-server binary with the configured model.
        #[arg(long)]
        spawn_server: Option<PathBuf>,

        /// Seconds to wait for the server to accept connections.
        #[arg(long, default_value_t = 60)]
        connect_timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Chat {
            config,
            spawn_server,
            connect_timeout,
        } => {
            run_chat(
                &config,
                spawn_server.as_deref(),
                Duration::from_secs(connect_timeout),
            )
            .await
        }
    }
}

async fn run_chat(
    config_path: &Path,
    server_bin: Option<&Path>,
    connect_timeout: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match ChatConfig::load_or_create(config_path)? {
        ConfigFile::Loaded(config) => config,
        ConfigFile::Created(_) => {
            println!(
                "Generated {} with defaults. Please fill in the required fields before restarting.",
                config_path.display()
            );
            return Ok(());
        }
    };

    let mut server = match server_bin {
        Some(bin) => Some(spawn_server(bin, &config)?),
        None => None,
    };

    let result = chat_loop(&config, connect_timeout).await;

    if let Some(child) = server.as_mut() {
        shutdown(child).await;
    }
    result
}

fn spawn_server(bin: &Path, config: &ChatConfig) -> std::io::Result<Child> {
    tracing::info!(server = %bin.display(), port = config.model_process_port, "starting server");
    Process::new(bin)
        .args(config.server_args())
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .spawn()
}

async fn shutdown(child: &mut Child) {
    match tokio::time::timeout(Duration::from_secs(5), child.wait()).await {
        Ok(Ok(status)) => tracing::info!(%status, "server exited"),
        _ => {
            if let Err(e) = child.kill().await {
                tracing::warn!(error = %e, "failed to kill server");
            }
        }
    }
}

async fn chat_loop(
    config: &ChatConfig,
    connect_timeout: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut client = ModelClient::connect_timeout(&config.endpoint(), connect_timeout).await?;

    println!("Loading model, this may take a few minutes...");
    client.load().await?;
    println!("Successfully loaded model.");

    let mut session = ChatSession::new(config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("Enter a message (\"exit\" to quit): ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line == "exit" {
            break;
        }

        match session.turn(&mut client, &line).await? {
            Turn::Reply(text) => println!("{}{}", session.model_name(), text),
            Turn::TooLong => println!("Message too long, please try again."),
        }
    }

    client.exit().await?;
    Ok(())
}
