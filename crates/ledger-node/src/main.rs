//! ledger-node — the federated ledger full-node binary.
//!
//! Startup sequence:
//!   1. Open (or initialise) the block/key/metadata store
//!   2. Load the local node identity, generating one on first run
//!   3. Load the chain from storage, or mint a fresh genesis block
//!   4. Start the TCP transport and dial any configured peers
//!   5. Run the network engine's event loop alongside heartbeat, health
//!      sweep, and pruning background tasks until interrupted

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ledger_core::constants::{CHECKPOINT_INTERVAL, PRUNE_KEEP_BLOCKS};
use ledger_network::{NetworkConfig, NetworkEngine, WireMessage};
use ledger_node::{chainio, identity, transport::TcpTransport};
use ledger_readmodel::{ReadModelAdapter, ReadModelEvent};
use ledger_storage::{SledStore, Store};
use tokio::sync::Mutex;
use tokio::time::interval;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "ledger-node", version, about = "Federated ledger full node")]
struct Args {
    /// Directory for the persistent block/key/metadata store.
    #[arg(long, default_value = "~/.ledger/data")]
    data_dir: PathBuf,

    /// Address this node accepts peer connections on.
    #[arg(long, default_value = "0.0.0.0:7800")]
    listen_addr: SocketAddr,

    /// Peer address to dial at startup (repeatable).
    #[arg(long = "peer")]
    peers: Vec<SocketAddr>,

    /// Uniqueness marker for a freshly minted genesis block. Ignored if a
    /// chain already exists in `data_dir`.
    #[arg(long, default_value = "primary")]
    genesis_marker: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,ledger=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    info!("federated ledger node starting");

    // ── Storage ───────────────────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir).with_context(|| format!("creating data dir {}", data_dir.display()))?;
    let store: Arc<dyn Store> = Arc::new(SledStore::open(&data_dir).context("opening block store")?);

    // ── Identity ──────────────────────────────────────────────────────────────
    let keypair = identity::load_or_generate(&store).await?;
    let node_id = keypair.node_id.clone();
    let public_key_hex = hex::encode(&keypair.public_key.0);
    info!(%node_id, "node identity ready");

    // ── Chain ─────────────────────────────────────────────────────────────────
    let chain = chainio::load_or_bootstrap(&store, &node_id, &args.genesis_marker).await?;
    let mut persisted_up_to = chain.len();
    let chain = Arc::new(Mutex::new(chain));

    // ── Transport ─────────────────────────────────────────────────────────────
    let (tcp_transport, inbound_events, bound_addr) = TcpTransport::bind(node_id.clone(), args.listen_addr).await?;
    info!(%bound_addr, "listening for peers");
    for peer_addr in &args.peers {
        if let Err(e) = tcp_transport.dial(*peer_addr).await {
            warn!(%peer_addr, error = %e, "failed to dial peer at startup");
        }
    }

    // ── Engine ────────────────────────────────────────────────────────────────
    let readmodel = Arc::new(ReadModelAdapter::default());
    let config = NetworkConfig::default();
    let heartbeat_interval = config.heartbeat_interval;
    let health_check_interval = config.health_check_interval;
    let engine = Arc::new(NetworkEngine::new(
        node_id.clone(),
        public_key_hex,
        chain.clone(),
        tcp_transport.clone(),
        config,
        readmodel.clone(),
    ));

    let engine_loop = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.run(inbound_events).await })
    };

    let readmodel_logger = {
        let mut rx = readmodel.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = rx.recv().await {
                match event {
                    ReadModelEvent::NodeMap(map) => debug!(nodes = map.len(), "node map updated"),
                    ReadModelEvent::Presence(p) => {
                        debug!(node_id = %p.node_id, is_online = p.is_online, "presence update")
                    }
                    ReadModelEvent::SyncProgress(p) => {
                        debug!(status = ?p.status, progress = p.progress, "sync progress")
                    }
                }
            }
        })
    };

    let heartbeat_task = {
        let transport = tcp_transport.clone();
        tokio::spawn(async move {
            let mut ticker = interval(heartbeat_interval);
            loop {
                ticker.tick().await;
                let message = WireMessage::Heartbeat {
                    timestamp: chrono::Utc::now().timestamp(),
                    is_online: true,
                    seen_online: Vec::new(),
                };
                if let Err(e) = transport.broadcast(&message).await {
                    warn!(error = %e, "heartbeat broadcast failed");
                }
            }
        })
    };

    let health_task = {
        let engine = engine.clone();
        tokio::spawn(async move {
            let mut ticker = interval(health_check_interval);
            loop {
                ticker.tick().await;
                let (stale, needs_more) = engine.health_sweep().await;
                if !stale.is_empty() {
                    info!(count = stale.len(), "disconnected stale peers");
                }
                if needs_more {
                    debug!("below minimum connection count");
                }
            }
        })
    };

    let persistence_task = {
        let store = store.clone();
        let chain = chain.clone();
        tokio::spawn(async move {
            let mut ticker = interval(std::time::Duration::from_secs(5));
            loop {
                ticker.tick().await;
                let guard = chain.lock().await;
                let blocks = guard.blocks().to_vec();
                drop(guard);
                match chainio::persist_new_blocks(&store, &blocks, persisted_up_to).await {
                    Ok(new_high_water) => persisted_up_to = new_high_water,
                    Err(e) => warn!(error = %e, "failed to persist new blocks"),
                }

                let mut guard = chain.lock().await;
                if let Err(e) = chainio::prune_and_persist(&store, &mut guard, PRUNE_KEEP_BLOCKS, CHECKPOINT_INTERVAL).await {
                    warn!(error = %e, "pruning failed");
                }
            }
        })
    };

    info!("node ready");
    tokio::signal::ctrl_c().await.context("waiting for shutdown signal")?;
    info!("shutdown signal received, stopping background tasks");

    engine_loop.abort();
    readmodel_logger.abort();
    heartbeat_task.abort();
    health_task.abort();
    persistence_task.abort();

    Ok(())
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
