//! Integration tests for the direct peer-to-peer transfer leg.
//!
//! A real listener serves files from a temporary directory and a real
//! downloader fetches them over localhost, so both sides of the wire
//! protocol are exercised together.
use std::net::SocketAddr;
use std::path::Path;

use fileswarm::peer::downloader::{self, DownloadError, DownloadRequest};
use fileswarm::peer::listener::PeerListener;
use fileswarm::peer::progress::{ProgressEvent, RecordingProgress};

fn ephemeral_addr() -> SocketAddr {
    "127.0.0.1:0".parse().expect("hardcoded address should parse")
}

/// Directory path with the trailing separator the tracker stores.
fn directory_of(dir: &Path) -> String {
    format!("{}/", dir.display())
}

fn request_for(listener: &PeerListener, share_dir: &Path, file_name: &str, file_type: &str, size: u64) -> DownloadRequest {
    DownloadRequest::new(
        "127.0.0.1".to_string(),
        listener.local_addr().port(),
        directory_of(share_dir),
        file_name.to_string(),
        file_type.to_string(),
        size,
    )
}

#[tokio::test]
async fn it_should_round_trip_a_file_byte_for_byte() {
    let share_dir = tempfile::tempdir().unwrap();
    let target_dir = tempfile::tempdir().unwrap();

    // More than one chunk, not chunk-aligned.
    let content: Vec<u8> = (0..3000u32).map(|n| (n % 251) as u8).collect();
    std::fs::write(share_dir.path().join("report.pdf"), &content).unwrap();

    let listener = PeerListener::start(ephemeral_addr()).await.unwrap();
    let progress = RecordingProgress::default();

    let request = request_for(&listener, share_dir.path(), "report", "pdf", content.len() as u64);
    let destination = downloader::download(&request, target_dir.path(), &progress).await.unwrap();

    assert_eq!(destination, target_dir.path().join("report.pdf"));
    assert_eq!(std::fs::read(&destination).unwrap(), content);

    let events = progress.events();
    assert_eq!(events.last(), Some(&ProgressEvent::Complete));
    assert!(events.contains(&ProgressEvent::Progress(100)));

    listener.stop().await;
}

#[tokio::test]
async fn it_should_transfer_a_file_whose_path_contains_spaces() {
    let share_dir = tempfile::tempdir().unwrap();
    let target_dir = tempfile::tempdir().unwrap();

    let content = b"quarterly numbers".to_vec();
    std::fs::write(share_dir.path().join("annual report.pdf"), &content).unwrap();

    let listener = PeerListener::start(ephemeral_addr()).await.unwrap();
    let progress = RecordingProgress::default();

    let request = request_for(&listener, share_dir.path(), "annual report", "pdf", content.len() as u64);
    let destination = downloader::download(&request, target_dir.path(), &progress).await.unwrap();

    assert_eq!(destination, target_dir.path().join("annual report.pdf"));
    assert_eq!(std::fs::read(&destination).unwrap(), content);

    listener.stop().await;
}

#[tokio::test]
async fn it_should_abort_and_clean_up_when_the_peer_does_not_have_the_file() {
    let share_dir = tempfile::tempdir().unwrap();
    let target_dir = tempfile::tempdir().unwrap();

    let listener = PeerListener::start(ephemeral_addr()).await.unwrap();
    let progress = RecordingProgress::default();

    let request = request_for(&listener, share_dir.path(), "missing", "pdf", 1024);
    let outcome = downloader::download(&request, target_dir.path(), &progress).await;

    assert!(matches!(outcome, Err(DownloadError::PeerNotFound)));

    // The partial file was deleted.
    assert!(!target_dir.path().join("missing.pdf").exists());

    assert!(matches!(progress.events().last(), Some(ProgressEvent::Error(message)) if message.contains("not found")));

    listener.stop().await;
}

#[tokio::test]
async fn it_should_pick_a_numbered_name_when_the_local_file_already_exists() {
    let share_dir = tempfile::tempdir().unwrap();
    let target_dir = tempfile::tempdir().unwrap();

    let content = b"fresh copy".to_vec();
    std::fs::write(share_dir.path().join("report.pdf"), &content).unwrap();
    std::fs::write(target_dir.path().join("report.pdf"), b"older download").unwrap();

    let listener = PeerListener::start(ephemeral_addr()).await.unwrap();
    let progress = RecordingProgress::default();

    let request = request_for(&listener, share_dir.path(), "report", "pdf", content.len() as u64);
    let destination = downloader::download(&request, target_dir.path(), &progress).await.unwrap();

    assert_eq!(destination, target_dir.path().join("report(1).pdf"));
    assert_eq!(std::fs::read(&destination).unwrap(), content);

    // The older download is untouched.
    assert_eq!(std::fs::read(target_dir.path().join("report.pdf")).unwrap(), b"older download");

    listener.stop().await;
}

#[tokio::test]
async fn it_should_report_a_connection_failure_without_leaving_files_behind() {
    let target_dir = tempfile::tempdir().unwrap();

    // A port nothing listens on.
    let listener = PeerListener::start(ephemeral_addr()).await.unwrap();
    let dead_port = listener.local_addr().port();
    listener.stop().await;

    let request = DownloadRequest::new(
        "127.0.0.1".to_string(),
        dead_port,
        "/share/".to_string(),
        "report".to_string(),
        "pdf".to_string(),
        1024,
    );

    let progress = RecordingProgress::default();
    let outcome = downloader::download(&request, target_dir.path(), &progress).await;

    assert!(matches!(outcome, Err(DownloadError::Connect(_))));
    assert!(!target_dir.path().join("report.pdf").exists());

    listener_events_contain_error(&progress);
}

fn listener_events_contain_error(progress: &RecordingProgress) {
    assert!(progress
        .events()
        .iter()
        .any(|event| matches!(event, ProgressEvent::Error(_))));
}
