//! It fetches a file from a remote peer and streams it to disk.
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_more::Constructor;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::progress::ProgressSink;
use super::protocol::{self, CHUNK_SIZE, NOT_FOUND_SENTINEL};

/// Receive timeout applied to the connect and to every read.
pub const RECEIVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Highest `name(n).type` suffix tried before overwriting the base name.
pub const MAX_COPY_SUFFIX: u32 = 1000;

/// Everything needed to fetch one file: where the host is, what the file is
/// called, and how big the tracker says it is.
#[derive(Debug, Clone, Constructor)]
pub struct DownloadRequest {
    pub ip: String,
    pub port: u16,
    /// Directory on the host's filesystem, as returned by the host lookup.
    pub remote_path: String,
    pub file_name: String,
    pub file_type: String,
    pub expected_size: u64,
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Could not connect to peer")]
    Connect(#[source] io::Error),

    #[error("Peer timed out")]
    TimedOut,

    #[error("File not found on peer machine")]
    PeerNotFound,

    #[error("I/O error during file transfer")]
    Io(#[from] io::Error),
}

/// It downloads one file into `target_dir`.
///
/// The transfer connects directly to the remote peer, sends the one-line
/// request, sniffs the first chunk for the 404 sentinel and then streams
/// chunks to disk, updating `progress` as
/// `floor(bytes_written * 100 / expected_size)`. On any fault the partial
/// file is deleted and a display-ready message reaches the sink.
///
/// Returns the path of the completed local file.
///
/// # Errors
///
/// Will return a [`DownloadError`] if the peer is unreachable, times out,
/// reports the file missing, or the streams fail mid-transfer.
pub async fn download(
    request: &DownloadRequest,
    target_dir: &Path,
    progress: &dyn ProgressSink,
) -> Result<PathBuf, DownloadError> {
    let remote_target = format!("{}{}.{}", request.remote_path, request.file_name, request.file_type);

    let outcome = fetch(request, &remote_target, target_dir, progress).await;

    match outcome {
        Ok(destination) => {
            progress.on_complete();
            Ok(destination)
        }
        Err((destination, error)) => {
            if let Some(partial) = destination {
                let _ = tokio::fs::remove_file(&partial).await;
            }
            progress.on_error(&format!("ERROR: {error}"));
            Err(error)
        }
    }
}

/// Inner transfer; on failure it hands back the partial file (if one was
/// created) so the caller can delete it.
async fn fetch(
    request: &DownloadRequest,
    remote_target: &str,
    target_dir: &Path,
    progress: &dyn ProgressSink,
) -> Result<PathBuf, (Option<PathBuf>, DownloadError)> {
    let mut stream = connect(&request.ip, request.port).await.map_err(|e| (None, e))?;

    stream
        .write_all(protocol::request_line(remote_target).as_bytes())
        .await
        .map_err(|e| (None, DownloadError::Io(e)))?;

    let destination = pick_destination(target_dir, &request.file_name, &request.file_type).await;

    let stream_outcome = stream_to_disk(&mut stream, &destination, request.expected_size, progress).await;

    match stream_outcome {
        Ok(()) => Ok(destination),
        Err(error) => Err((Some(destination), error)),
    }
}

async fn connect(ip: &str, port: u16) -> Result<TcpStream, DownloadError> {
    match timeout(RECEIVE_TIMEOUT, TcpStream::connect((ip, port))).await {
        Err(_) => Err(DownloadError::TimedOut),
        Ok(Err(e)) => Err(DownloadError::Connect(e)),
        Ok(Ok(stream)) => Ok(stream),
    }
}

async fn stream_to_disk(
    stream: &mut TcpStream,
    destination: &Path,
    expected_size: u64,
    progress: &dyn ProgressSink,
) -> Result<(), DownloadError> {
    let mut file = File::create(destination).await?;
    let mut buffer = [0u8; CHUNK_SIZE];
    let mut written: u64 = 0;

    // The first chunk decides between the 404 sentinel and file content.
    let first = read_chunk(stream, &mut buffer).await?;

    if buffer[..first].starts_with(NOT_FOUND_SENTINEL) {
        return Err(DownloadError::PeerNotFound);
    }

    if first > 0 {
        file.write_all(&buffer[..first]).await?;
        written += first as u64;
        progress.on_progress(percent(written, expected_size));

        loop {
            let read = read_chunk(stream, &mut buffer).await?;
            if read == 0 {
                break;
            }
            file.write_all(&buffer[..read]).await?;
            written += read as u64;
            progress.on_progress(percent(written, expected_size));
        }
    }

    file.flush().await?;

    Ok(())
}

async fn read_chunk(stream: &mut TcpStream, buffer: &mut [u8]) -> Result<usize, DownloadError> {
    match timeout(RECEIVE_TIMEOUT, stream.read(buffer)).await {
        Err(_) => Err(DownloadError::TimedOut),
        Ok(Err(e)) => Err(DownloadError::Io(e)),
        Ok(Ok(read)) => Ok(read),
    }
}

fn percent(written: u64, expected_size: u64) -> u8 {
    if expected_size == 0 {
        return 100;
    }

    u8::try_from((written * 100 / expected_size).min(100)).expect("a value clamped to 100 should fit in a u8")
}

/// It picks a collision-free local name: `name.type`, then `name(1).type`
/// up to `name(1000).type`; when every candidate exists the base name is
/// overwritten.
async fn pick_destination(target_dir: &Path, file_name: &str, file_type: &str) -> PathBuf {
    let base = target_dir.join(format!("{file_name}.{file_type}"));

    if !exists(&base).await {
        return base;
    }

    for copy_number in 1..=MAX_COPY_SUFFIX {
        let candidate = target_dir.join(format!("{file_name}({copy_number}).{file_type}"));
        if !exists(&candidate).await {
            return candidate;
        }
    }

    base
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::percent;

    #[test]
    fn it_should_floor_the_completion_percentage() {
        assert_eq!(percent(0, 1024), 0);
        assert_eq!(percent(512, 1024), 50);
        assert_eq!(percent(1023, 1024), 99);
        assert_eq!(percent(1024, 1024), 100);
    }

    #[test]
    fn it_should_clamp_the_percentage_when_more_arrives_than_expected() {
        assert_eq!(percent(4096, 1024), 100);
    }

    #[test]
    fn it_should_report_an_empty_expectation_as_complete() {
        assert_eq!(percent(0, 0), 100);
    }

    mod picking_the_destination {
        use super::super::pick_destination;

        #[tokio::test]
        async fn it_should_prefer_the_plain_file_name() {
            let dir = tempfile::tempdir().unwrap();

            let destination = pick_destination(dir.path(), "report", "pdf").await;

            assert_eq!(destination, dir.path().join("report.pdf"));
        }

        #[tokio::test]
        async fn it_should_append_a_copy_number_on_collision() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("report.pdf"), b"first").unwrap();

            let destination = pick_destination(dir.path(), "report", "pdf").await;

            assert_eq!(destination, dir.path().join("report(1).pdf"));
        }

        #[tokio::test]
        async fn it_should_increment_past_existing_copies() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("report.pdf"), b"first").unwrap();
            std::fs::write(dir.path().join("report(1).pdf"), b"second").unwrap();

            let destination = pick_destination(dir.path(), "report", "pdf").await;

            assert_eq!(destination, dir.path().join("report(2).pdf"));
        }
    }
}
