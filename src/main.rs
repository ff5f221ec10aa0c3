use anyhow::{Context, Result};
use axum::Router;
use clap::{Parser, Subcommand};
use cloudinary_image_store::config::StoreConfig;
use cloudinary_image_store::store::{build_store, ImageStore};
use std::net::SocketAddr;
use std::path::PathBuf;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "cloudinary-image-store")]
#[command(about = "Upload, check, and serve images backed by Cloudinary")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload a local image and print its hosted URL.
    Upload {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Print whether a hosted URL currently resolves.
    Exists {
        #[arg(value_name = "URL")]
        url: String,
    },
    /// Serve the local images directory.
    Serve {
        #[arg(long, default_value = "127.0.0.1:2368")]
        addr: SocketAddr,
        #[arg(long, default_value = "/content/images", value_parser = parse_mount)]
        mount: String,
    },
}

fn parse_mount(input: &str) -> std::result::Result<String, String> {
    if !input.starts_with('/') {
        return Err(format!("Invalid mount '{}'. Must start with '/'", input));
    }
    let trimmed = input.trim_end_matches('/');
    Ok(if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    })
}

fn mount_router(mount: &str, images: Router) -> Router {
    if mount == "/" {
        Router::new().fallback_service(images)
    } else {
        Router::new().nest_service(mount, images)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}

async fn run(store: Box<dyn ImageStore>, command: Command) -> Result<()> {
    match command {
        Command::Upload { path } => {
            let url = store
                .store(&path)
                .await
                .with_context(|| format!("Failed to upload {}", path.display()))?;
            println!("{}", url);
        }
        Command::Exists { url } => {
            println!("{}", store.exists_at(&url).await);
        }
        Command::Serve { addr, mount } => {
            let app = mount_router(&mount, store.serve()).layer(TraceLayer::new_for_http());
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;

            info!("Serving images under {} on http://{}", mount, addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cloudinary_image_store=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let store = match StoreConfig::from_env().and_then(|config| build_store(&config)) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to initialize image store: {}", e);
            std::process::exit(1);
        }
    };

    // Store failures are already logged where they happen.
    if let Err(e) = run(store, args.command).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
