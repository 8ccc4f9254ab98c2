use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

use ln_network::wire::constants::CHAIN_HASH_REGTEST;
use ln_network::wire::{payload, Message, MessageView, Value};
use ln_network::{Inbound, MemoryTransport, PeerAddress, PeerSession, SessionConfig};

#[derive(Parser)]
#[command(name = "ln-cli", version, about = "Lightning peer message toolbox")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode hex-encoded messages given on the command line
    Decode {
        #[arg(required = true, value_name = "HEX")]
        messages: Vec<String>,
    },
    /// Decode a file holding one hex-encoded message per line
    DecodeFile { path: PathBuf },
    /// Validate a `<node_id>@<host>:<port>` peer address
    ParsePeer { addr: String },
    /// Run two sessions against each other in memory and log the traffic
    Demo {
        /// JSON session config; missing fields take their defaults
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Keepalive interval, overriding the config
        #[arg(long, default_value_t = 1)]
        interval_secs: u64,

        /// Keepalive rounds to wait for before stopping
        #[arg(long, default_value_t = 3)]
        rounds: u32,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    fmt().with_env_filter(filter).with_target(false).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Decode { messages } => decode_all(messages.iter().map(String::as_str)),
        Commands::DecodeFile { path } => {
            let contents = std::fs::read_to_string(&path)?;
            decode_all(
                contents
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty() && !l.starts_with('#')),
            )
        }
        Commands::ParsePeer { addr } => parse_peer(&addr),
        Commands::Demo {
            config,
            interval_secs,
            rounds,
        } => demo(config, interval_secs, rounds).await,
    }
}

fn decode_all<'a>(lines: impl Iterator<Item = &'a str>) -> Result<(), Box<dyn Error>> {
    for line in lines {
        let bytes = match hex::decode(line.replace(' ', "")) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(input = line, error = %e, "not valid hex, skipping");
                continue;
            }
        };

        match Message::try_from(&bytes[..]) {
            Ok(msg) => print_message(&msg),
            Err(e) => warn!(input = line, error = %e, "could not decode"),
        }
    }

    Ok(())
}

fn print_message(msg: &Message) {
    println!("{msg}");

    for (name, value) in msg.fields() {
        match value {
            Value::U16(v) => println!("  {name}: {v}"),
            Value::U32(v) => println!("  {name}: {v}"),
            Value::Bytes(b) => println!("  {name}: {} ({} bytes)", hex::encode(b), b.len()),
        }
    }

    if !msg.trailing().is_empty() {
        println!("  trailing: {}", hex::encode(msg.trailing()));
    }

    match msg.view() {
        MessageView::Init(init) => match init.tlvs() {
            Ok(tlvs) => {
                for record in tlvs.records() {
                    println!(
                        "  tlv {} ({}): {}",
                        record.tlv_type,
                        record.init_name().unwrap_or("unknown"),
                        hex::encode(record.value)
                    );
                }
            }
            Err(e) => println!("  tlv stream: {e}"),
        },
        MessageView::ChannelAnnouncement(ann) => {
            println!("  scid: {}", ann.short_channel_id);
        }
        MessageView::QueryShortChannelIds(q) => {
            if let Some(ids) = q.short_ids() {
                for id in ids {
                    println!("  scid: {id}");
                }
            }
        }
        _ => {}
    }
}

fn parse_peer(addr: &str) -> Result<(), Box<dyn Error>> {
    let peer: PeerAddress = addr.parse()?;

    println!("node_id: {}", hex::encode(peer.node_id.serialize()));
    println!("host:    {}", peer.host);
    println!("port:    {}", peer.port);

    Ok(())
}

/// Deterministic demo identity: the public key of secret `[n; 32]`.
fn demo_peer(n: u8, port: u16) -> Result<PeerAddress, Box<dyn Error>> {
    let secp = Secp256k1::new();
    let secret = SecretKey::from_slice(&[n; 32])?;
    Ok(PeerAddress::new(
        PublicKey::from_secret_key(&secp, &secret),
        "127.0.0.1",
        port,
    ))
}

async fn demo(
    config_path: Option<PathBuf>,
    interval_secs: u64,
    rounds: u32,
) -> Result<(), Box<dyn Error>> {
    let mut config = match config_path {
        Some(path) => {
            info!(path = %path.display(), "loading session config");
            serde_json::from_str::<SessionConfig>(&std::fs::read_to_string(&path)?)?
        }
        None => SessionConfig::default(),
    };
    config.ping_interval_secs = interval_secs;

    let (a_end, b_end) = MemoryTransport::pair();

    // each session is named after the node on the other end
    let alice = demo_peer(1, 9735)?;
    let bob = demo_peer(2, 9736)?;

    let (mut to_bob, bob_inbound) =
        PeerSession::start(bob.clone(), Arc::new(a_end), config.clone()).await?;
    let (mut to_alice, alice_inbound) =
        PeerSession::start(alice.clone(), Arc::new(b_end), config).await?;

    let watchers = [
        tokio::spawn(log_inbound("from bob", bob_inbound)),
        tokio::spawn(log_inbound("from alice", alice_inbound)),
    ];

    to_bob.send(payload::build_gossip_timestamp_filter(
        &CHAIN_HASH_REGTEST,
        0,
        u32::MAX,
    ))?;

    let run_for =
        Duration::from_secs(interval_secs.max(1) * rounds as u64) + Duration::from_millis(200);
    tokio::time::sleep(run_for).await;

    // Stopping one side closes the other side's transport, so either may
    // report a closed connection here.
    let (bob_result, alice_result) = tokio::join!(to_bob.stop(), to_alice.stop());
    for (peer, result) in [(&bob, bob_result), (&alice, alice_result)] {
        match result {
            Ok(()) => info!(peer = %peer, "session stopped cleanly"),
            Err(e) => info!(peer = %peer, error = %e, "session ended"),
        }
    }

    for watcher in watchers {
        let count = watcher.await?;
        info!(received = count, "watcher finished");
    }

    Ok(())
}

async fn log_inbound(label: &'static str, mut inbound: Inbound) -> usize {
    let mut count = 0;
    while let Some(msg) = inbound.recv().await {
        count += 1;
        info!(
            direction = label,
            type_id = msg.type_id(),
            len = msg.encoded_len(),
            "{}",
            msg.type_name()
        );
    }
    count
}
