//! ledger-cli
//!
//! Small standalone utility for operators and node administrators:
//! generate/inspect a local Ed25519 key pair, derive or verify its
//! recovery mnemonic, and inspect a persisted chain directory without
//! bringing up the full network stack.
//!
//! Usage:
//!   ledger-cli keygen              [--keyfile <path>]
//!   ledger-cli mnemonic show       [--keyfile <path>]
//!   ledger-cli mnemonic verify     --hash <hex> [--phrase "<12 words>"]
//!   ledger-cli chain inspect       <data-dir>

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use ledger_chain::Chain;
use ledger_crypto::KeyPair;
use ledger_storage::{SledStore, Store};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli", version, about = "Federated ledger key/mnemonic/chain utility")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new Ed25519 key pair and write it to a keyfile.
    Keygen {
        /// Path to write the keyfile to (JSON, holds the wrapped private key).
        #[arg(long, default_value = "~/.ledger/identity.json")]
        keyfile: PathBuf,
    },

    /// Recovery-phrase operations for an existing keyfile.
    #[command(subcommand)]
    Mnemonic(MnemonicCommand),

    /// Inspect a node's persisted chain directory.
    #[command(subcommand)]
    Chain(ChainCommand),
}

#[derive(Subcommand, Debug)]
enum MnemonicCommand {
    /// Derive and print this keyfile's 12-word recovery phrase, plus the
    /// hash that would be stored alongside its NODE_JOIN event.
    Show {
        #[arg(long, default_value = "~/.ledger/identity.json")]
        keyfile: PathBuf,
    },
    /// Verify a candidate phrase against a stored hash, without ever
    /// touching a keyfile — this is the operation a join-time check
    /// performs.
    Verify {
        /// The stored `SHA-256(lowercase(trim(phrase)))` hex digest.
        #[arg(long)]
        hash: String,
        /// The candidate phrase. If omitted, it is read from stdin so it
        /// doesn't linger in shell history.
        #[arg(long)]
        phrase: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ChainCommand {
    /// Load every block from a node's `sled` data directory, replay
    /// derived state, and print a summary.
    Inspect {
        /// Path to the node's `--data-dir`.
        data_dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("warn,ledger_cli=info").init();

    let args = Args::parse();
    match args.command {
        Command::Keygen { keyfile } => cmd_keygen(&expand_tilde(&keyfile)),
        Command::Mnemonic(MnemonicCommand::Show { keyfile }) => cmd_mnemonic_show(&expand_tilde(&keyfile)),
        Command::Mnemonic(MnemonicCommand::Verify { hash, phrase }) => cmd_mnemonic_verify(&hash, phrase),
        Command::Chain(ChainCommand::Inspect { data_dir }) => {
            // Chain replay and sled I/O are async (`Store` is an async
            // trait); the rest of this binary is plain sync CLI glue, so
            // only this branch needs a runtime.
            tokio::runtime::Runtime::new()?.block_on(cmd_chain_inspect(&expand_tilde(&data_dir)))
        }
    }
}

// ── keygen ────────────────────────────────────────────────────────────────────

fn cmd_keygen(keyfile: &Path) -> anyhow::Result<()> {
    if keyfile.exists() {
        bail!(
            "keyfile {} already exists — delete it first to generate a new identity",
            keyfile.display()
        );
    }
    if let Some(parent) = keyfile.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let kp = KeyPair::generate();
    let json = serde_json::to_string_pretty(&kp)?;
    std::fs::write(keyfile, json).with_context(|| format!("writing keyfile to {}", keyfile.display()))?;

    println!("Generated new node identity.");
    println!("Node id:    {}", kp.node_id);
    println!("Public key: {}", hex::encode(&kp.public_key.0));
    println!("Keyfile:    {}", keyfile.display());
    println!();
    println!("Back up this keyfile and run `ledger-cli mnemonic show` to record a recovery phrase.");
    Ok(())
}

// ── mnemonic ──────────────────────────────────────────────────────────────────

fn cmd_mnemonic_show(keyfile: &Path) -> anyhow::Result<()> {
    let kp = load_keypair(keyfile)?;
    let phrase = ledger_mnemonic::generate_phrase(kp.secret_key_bytes())
        .context("deriving recovery phrase from this key pair's secret seed")?;
    let hash = ledger_mnemonic::hash_phrase(&phrase);

    println!("Node id: {}", kp.node_id);
    println!();
    println!("Recovery phrase (write this down, never store it alongside the keyfile):");
    println!("  {}", phrase);
    println!();
    println!("Stored hash (this is what a NODE_JOIN's recoveryPhraseHash should carry):");
    println!("  {}", hash);
    Ok(())
}

fn cmd_mnemonic_verify(hash: &str, phrase: Option<String>) -> anyhow::Result<()> {
    let phrase = match phrase {
        Some(p) => p,
        None => {
            println!("Enter the 12-word recovery phrase:");
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).context("reading phrase from stdin")?;
            line
        }
    };

    match ledger_mnemonic::verify_phrase(&phrase, hash) {
        Ok(true) => {
            println!("valid: phrase matches the stored hash");
            Ok(())
        }
        Ok(false) => {
            println!("invalid: phrase does not match the stored hash");
            std::process::exit(1);
        }
        Err(e) => {
            println!("rejected: {e}");
            std::process::exit(1);
        }
    }
}

// ── chain inspect ─────────────────────────────────────────────────────────────

async fn cmd_chain_inspect(data_dir: &Path) -> anyhow::Result<()> {
    if !data_dir.exists() {
        bail!("data directory {} does not exist", data_dir.display());
    }
    let store = SledStore::open(data_dir).with_context(|| format!("opening store at {}", data_dir.display()))?;

    let Some(genesis) = store.get_block(0).await? else {
        bail!("no genesis block found under {}", data_dir.display());
    };
    let mut blocks = vec![genesis];
    let mut index = 1u64;
    while let Some(block) = store.get_block(index).await? {
        blocks.push(block);
        index += 1;
    }
    let retained = blocks.len() as u64;

    let chain = Chain::from_blocks(blocks).context("replaying retained blocks")?;
    let state = chain.state();

    let pruned_before = store
        .get_metadata("pruned_before")
        .await?
        .and_then(|v| serde_json::from_value::<u64>(v).ok())
        .unwrap_or(0);
    let checkpoint = store.latest_checkpoint().await?;

    println!("Chain at {}", data_dir.display());
    println!("  length (incl. pruned prefix): {}", pruned_before + retained);
    println!("  retained blocks:              {retained}");
    println!("  pruned before index:          {pruned_before}");
    if let Some(cp) = checkpoint {
        println!("  last checkpoint:              index {} hash {}", cp.index, cp.hash.to_hex());
    } else {
        println!("  last checkpoint:              none");
    }
    println!("  tip hash:                     {}", chain.tip().hash.to_hex());
    println!("  genesis unique marker:        {:?}", chain.genesis_info().unique_marker);
    println!();
    println!("Derived state:");
    println!("  nodes:                 {}", state.node_map.len());
    println!("  root(s):               {}", count_role(state, ledger_chain::NodeRole::Root));
    println!("  institutions:          {} ({} pending)", state.institutions.len(), state.pending_institutions.len());
    println!("  soulbound tokens:      {}", state.soulbound_tokens.values().map(|v| v.len()).sum::<usize>());
    println!("  active proposals:      {}", state.active_proposals.len());
    println!("  accounts w/ recovery:  {}", state.account_states.len());
    println!("  nonzero karma holders: {}", state.karma_balances.values().filter(|&&v| v > 0).count());
    Ok(())
}

fn count_role(state: &ledger_chain::ChainState, role: ledger_chain::NodeRole) -> usize {
    state.node_roles.values().filter(|r| **r == role).count()
}

// ── helpers ───────────────────────────────────────────────────────────────────

fn load_keypair(keyfile: &Path) -> anyhow::Result<KeyPair> {
    let json = std::fs::read_to_string(keyfile).with_context(|| format!("reading keyfile {}", keyfile.display()))?;
    serde_json::from_str(&json).context("parsing keyfile — is it a valid ledger-cli identity file?")
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
