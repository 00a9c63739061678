//! Headless peer agent.
//!
//! `share` logs in to the tracker, registers the given files, serves them
//! through the peer listener and keeps the session alive with heartbeats
//! until interrupted. `fetch` searches the index, resolves a live host and
//! downloads the file directly from it.
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fileswarm::client::TrackerClient;
use fileswarm::peer::downloader::{self, DownloadRequest};
use fileswarm::peer::listener::PeerListener;
use fileswarm::peer::progress::LogProgress;
use fileswarm::servers::rpc::wire::tag;

/// Interval between keep-alive heartbeats. The tracker evicts sessions
/// silent for 120 s, so one beat every 30 s leaves plenty of slack.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "fileswarm-peer", about = "Fileswarm peer agent")]
struct Args {
    /// Tracker RPC address, e.g. 203.0.113.7:7070
    #[arg(long, env = "FILESWARM_TRACKER_ADDR")]
    tracker: SocketAddr,

    /// User name (5-25 characters)
    #[arg(long)]
    name: String,

    /// Password (6-50 characters)
    #[arg(long, env = "FILESWARM_PASSWORD")]
    password: String,

    /// IP address other peers should connect to for downloads
    #[arg(long, default_value = "127.0.0.1")]
    ip: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register files and serve them until interrupted
    Share {
        /// Port the peer listener binds to
        #[arg(long)]
        port: u16,

        /// Files to register
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Search the index and download the first live result
    Fetch {
        /// Substring matched against file name and type
        #[arg(long)]
        query: String,

        /// Directory the download lands in
        #[arg(long, default_value = ".")]
        into: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let args = Args::parse();
    let client = TrackerClient::new(args.tracker);

    match args.command {
        Command::Share { port, files } => share(&client, &args.name, &args.password, &args.ip, port, &files).await,
        Command::Fetch { query, into } => fetch(&client, &args.name, &args.password, &args.ip, &query, &into).await,
    }
}

/// It logs in and returns the granted session token.
async fn log_in(client: &TrackerClient, name: &str, password: &str, ip: &str, port: u16) -> Result<String> {
    let response = client.connect_to_server(name, password, ip, port).await?;

    match response[0].as_str() {
        outcome @ (tag::OK | tag::NEW | tag::UPDATE) => {
            tracing::info!(outcome, "logged in to tracker");
            Ok(response[1].clone())
        }
        _ => bail!("login rejected ({}): {}", response[0], response.get(1).cloned().unwrap_or_default()),
    }
}

async fn share(client: &TrackerClient, name: &str, password: &str, ip: &str, port: u16, files: &[PathBuf]) -> Result<()> {
    let mut token = log_in(client, name, password, ip, port).await?;

    let listener = PeerListener::start(format!("0.0.0.0:{port}").parse()?).await
        .context("could not open the peer listener port")?;

    for file in files {
        register(client, &token, name, file).await?;
    }

    tracing::info!("serving; press ctrl-c to disconnect");

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("disconnecting ...");
                break;
            }
            _ = heartbeat.tick() => {
                match client.send_heart_beat(&token, name).await {
                    Ok(response) if response[0] == tag::OK => {}
                    Ok(response) => {
                        bail!("session lost ({}): {}", response[0], response.get(1).cloned().unwrap_or_default());
                    }
                    Err(e) => {
                        // Transport dropped but the server-side session may
                        // still live: resume rotates the token.
                        tracing::warn!(err = %e, "heartbeat failed, trying to resume the session");
                        let response = client.resume_session(&token, name, ip, port).await?;
                        match response[0].as_str() {
                            tag::OK | tag::UPDATE => {
                                token = response[1].clone();
                                tracing::info!("session resumed");
                            }
                            _ => bail!("could not resume session ({})", response[0]),
                        }
                    }
                }
            }
        }
    }

    let _ = client.disconnect_from_server(&token, name).await;
    listener.stop().await;

    Ok(())
}

/// It registers one local file, deriving name, type, directory and size
/// from the filesystem.
async fn register(client: &TrackerClient, token: &str, name: &str, file: &Path) -> Result<()> {
    let metadata = tokio::fs::metadata(file)
        .await
        .with_context(|| format!("could not read {}", file.display()))?;

    if !metadata.is_file() {
        bail!("{} is not a regular file", file.display());
    }

    let file_name = file
        .file_stem()
        .and_then(|stem| stem.to_str())
        .with_context(|| format!("{} has no usable file name", file.display()))?;

    let file_type = file.extension().and_then(|e| e.to_str()).unwrap_or_default();

    let directory = file
        .canonicalize()?
        .parent()
        .map(|parent| format!("{}/", parent.display()))
        .unwrap_or_else(|| "/".to_string());

    let response = client
        .register_file(token, name, file_name, file_type, &directory, metadata.len())
        .await?;

    match response[0].as_str() {
        tag::OK => {
            tracing::info!(file = %file.display(), "registered");
            Ok(())
        }
        tag::COPY => {
            tracing::info!(file = %file.display(), "already registered");
            Ok(())
        }
        _ => bail!(
            "could not register {} ({}): {}",
            file.display(),
            response[0],
            response.get(1).cloned().unwrap_or_default()
        ),
    }
}

async fn fetch(client: &TrackerClient, name: &str, password: &str, ip: &str, query: &str, into: &Path) -> Result<()> {
    let token = log_in(client, name, password, ip, 0).await?;

    let outcome = fetch_with_session(client, &token, name, query, into).await;

    let _ = client.disconnect_from_server(&token, name).await;

    outcome
}

async fn fetch_with_session(client: &TrackerClient, token: &str, name: &str, query: &str, into: &Path) -> Result<()> {
    let response = client.search_file(token, name, query).await?;

    if response[0] != tag::OK {
        bail!("search failed ({}): {}", response[0], response.get(1).cloned().unwrap_or_default());
    }

    // [OK, id, name, type, size, ...] in groups of four.
    let hit = response[1..]
        .chunks_exact(4)
        .next()
        .context("the tracker returned a malformed search response")?;

    let (id, file_name, file_type, size) = (&hit[0], &hit[1], &hit[2], &hit[3]);
    let file_id: u32 = id.parse().context("the tracker returned a malformed file id")?;
    let expected_size: u64 = size.parse().context("the tracker returned a malformed file size")?;

    tracing::info!(file = %file_name, id = file_id, "found a match, resolving hosts");

    let response = client.get_file_host_info(token, name, file_id).await?;

    if response[0] != tag::OK {
        bail!("host lookup failed ({}): {}", response[0], response.get(1).cloned().unwrap_or_default());
    }

    // [OK, ip, port, path, ...] in groups of three.
    let host = response[1..]
        .chunks_exact(3)
        .next()
        .context("the tracker returned a malformed host response")?;

    let request = DownloadRequest::new(
        host[0].clone(),
        host[1].parse().context("the tracker returned a malformed port")?,
        host[2].clone(),
        file_name.clone(),
        file_type.clone(),
        expected_size,
    );

    tracing::info!(ip = %request.ip, port = request.port, "downloading from peer");

    let destination = downloader::download(&request, into, &LogProgress).await?;

    tracing::info!(destination = %destination.display(), "download finished");

    Ok(())
}
