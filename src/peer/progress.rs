//! Progress reporting for downloads.
use std::sync::Mutex;

/// Where a running download reports to. The original desktop client drew a
/// progress bar; the headless peer agent logs instead, and tests collect.
pub trait ProgressSink: Send + Sync {
    /// Completion percentage so far, `0..=100`.
    fn on_progress(&self, percent: u8);

    /// The transfer finished and the local file is complete.
    fn on_complete(&self);

    /// The transfer failed; `message` is ready for display.
    fn on_error(&self, message: &str);
}

/// Sink that reports through the tracing pipeline.
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn on_progress(&self, percent: u8) {
        tracing::debug!(percent, "downloading");
    }

    fn on_complete(&self) {
        tracing::info!("File download complete.");
    }

    fn on_error(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// Sink that records every event, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Progress(u8),
    Complete,
    Error(String),
}

impl RecordingProgress {
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().expect("it should be able to lock the recorded events").clone()
    }

    fn record(&self, event: ProgressEvent) {
        self.events
            .lock()
            .expect("it should be able to lock the recorded events")
            .push(event);
    }
}

impl ProgressSink for RecordingProgress {
    fn on_progress(&self, percent: u8) {
        self.record(ProgressEvent::Progress(percent));
    }

    fn on_complete(&self) {
        self.record(ProgressEvent::Complete);
    }

    fn on_error(&self, message: &str) {
        self.record(ProgressEvent::Error(message.to_string()));
    }
}
