mod config;
mod repl;

use clap::{Parser, Subcommand};
use config::DocchatConfig;
use docchat_agent::{LlmClient, SessionContextManager};
use docchat_gateway::GatewayServer;
use docchat_loader::DocumentLoader;
use docchat_session::PairingMode;
use repl::Repl;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docchat", about = "docchat: chat with your documents")]
struct Cli {
    /// Path to config file (optional; defaults apply when it is missing)
    #[arg(short, long, default_value = "docchat.toml")]
    config: PathBuf,

    /// Transcript pairing mode (overrides config)
    #[arg(long)]
    pairing: Option<PairingMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat interactively in the terminal
    Chat {
        /// Session key (overrides config)
        #[arg(long)]
        session: Option<String>,
        /// Where to write the transcript on exit (overrides config)
        #[arg(long)]
        transcript: Option<PathBuf>,
    },
    /// Start the HTTP gateway
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn init_tracing(interactive: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if interactive {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    }
}

fn build_manager(config: &DocchatConfig) -> SessionContextManager {
    SessionContextManager::new(LlmClient::new(config.model.clone()), DocumentLoader::default())
        .with_system_prompt(config.assistant.system_prompt.as_str())
        .with_request_timeout(config.model.request_timeout())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(matches!(cli.command, Commands::Chat { .. }));

    let config = DocchatConfig::load(&cli.config).await?;
    let pairing = cli.pairing.unwrap_or(config.session.pairing);
    let manager = Arc::new(build_manager(&config));
    info!(
        provider = ?config.model.provider,
        model = %config.model.model_id,
        "Model client ready"
    );

    match cli.command {
        Commands::Chat {
            session,
            transcript,
        } => {
            let repl = Repl {
                session_key: session.unwrap_or_else(|| config.session.default_key.clone()),
                transcript_path: transcript
                    .unwrap_or_else(|| config.session.transcript_path.clone()),
                pairing,
            };
            let stdin = BufReader::new(tokio::io::stdin());
            repl.run(&manager, stdin, &mut std::io::stdout()).await?;
        }
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let auth_config = config.auth_config();
            if auth_config.is_enabled() {
                info!(keys = config.security.api_keys.len(), "API key auth enabled");
            }

            let app = GatewayServer::build_with_options(
                manager.clone(),
                config.gateway_options(),
                auth_config,
            );

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("docchat gateway listening on {}", addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            info!("Gateway stopped");

            if config.session.export_on_shutdown {
                let key = &config.session.default_key;
                let path = &config.session.transcript_path;
                if let Err(e) = manager.export_transcript(key, path, pairing).await {
                    error!(
                        session = %key,
                        path = %path.display(),
                        error = %e,
                        "Transcript export failed"
                    );
                }
            }
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
