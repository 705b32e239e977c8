use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use clap::Parser;
use tokio::net::TcpListener;
use bottomless_server::Registry;
use bottomless_server::config::Config;
use bottomless_server::db::Db;
use bottomless_server::db::repo::{MemoryStoreRepo, StoreRepo, StoreRepository};
use bottomless_server::net::handle_connection;
use bottomless_server::services::StoreService;

#[derive(Parser, Debug)]
#[command(name = "bottomless-server", version, about = "Authoritative unbounded item store server")]
struct Args {
    /// TOML configuration file. Without it, settings come from the environment / .env
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();
    let cfg = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::from_env()?,
    };

    let repo = open_repo(&cfg).await?;
    let registry = Arc::new(Registry::new(StoreService::new(repo)));

    spawn_snapshot_task(registry.clone(), cfg.snapshot_interval());

    let tcp_addr: SocketAddr = cfg.tcp_addr.parse()?;
    let listener = TcpListener::bind(tcp_addr).await?;
    tracing::info!(%tcp_addr, "bottomless server listening");

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tracing::info!(%peer, "client connected");
                    let registry = registry.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, registry).await {
                            tracing::error!(%peer, error = %e, "connection error");
                        }
                        tracing::info!(%peer, "client disconnected");
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to accept connection");
                    tokio::time::sleep(Duration::from_millis(200)).await;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down, saving online stores");
                registry.snapshot_all().await;
                break;
            }
        }
    }

    Ok(())
}

async fn open_repo(cfg: &Config) -> anyhow::Result<Arc<dyn StoreRepo>> {
    match &cfg.database_url {
        Some(url) => {
            // Setup database and run migrations if needed
            let db = Db::new(url)?;
            db.init().await?;
            tracing::info!("using postgres store repository");
            Ok(Arc::new(StoreRepository::new(Arc::new(db))))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, stores are kept in memory only");
            Ok(Arc::new(MemoryStoreRepo::new()))
        }
    }
}

fn spawn_snapshot_task(registry: Arc<Registry>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // the first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            registry.snapshot_all().await;
        }
    });
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, prelude::*};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,bottomless_server=debug"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
