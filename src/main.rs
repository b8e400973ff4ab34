use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use summarizepro::{api, config, logging, service::SummarizeService};
use tokio::net::TcpListener;

/// SummarizePro HTTP server.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Port to listen on (overrides `SERVER_PORT`).
    #[arg(long)]
    port: Option<u16>,
    /// Directory with the pre-built front-end (overrides `FRONTEND_DIR`).
    #[arg(long)]
    frontend_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let dotenv_path = config::load_dotenv();
    logging::init_tracing(&logging::LogSettings::from_env());
    if let Some(path) = dotenv_path {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }

    let mut config = config::init_config().context("failed to load configuration")?;
    if let Some(port) = cli.port {
        config.server_port = Some(port);
    }
    if let Some(frontend_dir) = cli.frontend_dir {
        config.frontend_dir = frontend_dir;
    }

    tracing::info!("Loading summarization model...");
    let service =
        SummarizeService::from_config(&config).context("failed to initialize summarizer")?;
    let app = api::create_router(
        Arc::new(service),
        api::RouterOptions {
            frontend_dir: config.frontend_dir.clone(),
            max_upload_bytes: config.max_upload_bytes,
        },
    );

    let (listener, port) = bind_listener(config.server_port)
        .await
        .context("failed to bind listener")?;
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app)
        .await
        .context("server terminated unexpectedly")?;
    Ok(())
}

async fn bind_listener(
    configured_port: Option<u16>,
) -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    if let Some(port) = configured_port {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    const PORT_RANGE: std::ops::RangeInclusive<u16> = 8000..=8099;
    for port in PORT_RANGE {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "No available port found in range 8000-8099",
    ))
}
