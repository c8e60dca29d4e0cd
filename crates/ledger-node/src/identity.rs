//! Local node identity, persisted across restarts through the `Store`'s
//! key-pair slot (spec.md §6.2). A fresh data directory has no way to know
//! its own node id yet, so the lookup goes through one extra level of
//! indirection: a well-known metadata key pointing at the node id, which is
//! then used to fetch the wrapped key pair.

use std::sync::Arc;

use anyhow::Context;
use ledger_core::NodeId;
use ledger_crypto::KeyPair;
use ledger_storage::Store;
use tracing::info;

const LOCAL_NODE_ID_METADATA_KEY: &str = "local_node_id";

/// Load this node's persisted identity, or generate and persist a fresh one
/// on first run.
pub async fn load_or_generate(store: &Arc<dyn Store>) -> anyhow::Result<KeyPair> {
    if let Some(value) = store.get_metadata(LOCAL_NODE_ID_METADATA_KEY).await? {
        let node_id: NodeId = serde_json::from_value(value).context("decoding persisted local_node_id")?;
        let wrapped = store
            .get_key_pair(&node_id)
            .await?
            .with_context(|| format!("local_node_id {node_id} is set but its key pair is missing"))?;
        let keypair: KeyPair = serde_json::from_slice(&wrapped).context("decoding persisted key pair")?;
        info!(node_id = %keypair.node_id, "loaded existing node identity");
        return Ok(keypair);
    }

    let keypair = KeyPair::generate();
    let wrapped = serde_json::to_vec(&keypair).context("encoding new key pair")?;
    store.put_key_pair(&keypair.node_id, &wrapped).await?;
    store
        .put_metadata(LOCAL_NODE_ID_METADATA_KEY, serde_json::to_value(&keypair.node_id)?)
        .await?;
    info!(node_id = %keypair.node_id, "generated new node identity");
    Ok(keypair)
}
