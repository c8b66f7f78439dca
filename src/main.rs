use anyhow::{Context, Result};
use clap::Parser;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;
use summarist::{api, config, logging, processing::DocumentService};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "summarist", about = "Upload PDFs and serve cached summaries over HTTP")]
struct Cli {
    /// Port to listen on (overrides `SERVER_PORT`).
    #[arg(long)]
    port: Option<u16>,
    /// Prompt template path (overrides `PROMPT_TEMPLATE_PATH`).
    #[arg(long)]
    prompt: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::load_config().context("failed to load configuration")?;
    logging::init_tracing(config.log_file.as_deref());
    if let Some(port) = cli.port {
        config.server_port = port;
    }
    if let Some(prompt) = cli.prompt {
        config.prompt_template_path = prompt;
    }
    tracing::debug!(
        model = %config.completion_model,
        document_dir = %config.document_dir.display(),
        summary_dir = %config.summary_dir.display(),
        "Loaded configuration"
    );

    let service = DocumentService::from_config(&config)
        .await
        .context("failed to initialize document service")?;
    let limits = api::BodyLimits {
        upload_bytes: config.max_upload_bytes,
        text_bytes: config.max_text_bytes,
    };
    let app = api::create_router(Arc::new(service), limits);

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.server_port))
        .await
        .with_context(|| format!("failed to bind port {}", config.server_port))?;
    tracing::info!("Listening on http://0.0.0.0:{}", config.server_port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated unexpectedly")?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %error, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
