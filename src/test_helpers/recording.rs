//! Notifier and opener doubles that record every call.

use parking_lot::Mutex;

use crate::models::ExportArtifact;
use crate::orchestration::{ArtifactOpener, Notifier};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Info(String),
    Success(String),
    Error(String),
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn info(&self, message: &str) {
        self.notifications
            .lock()
            .push(Notification::Info(message.to_string()));
    }

    fn success(&self, message: &str) {
        self.notifications
            .lock()
            .push(Notification::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.notifications
            .lock()
            .push(Notification::Error(message.to_string()));
    }
}

#[derive(Debug, Default)]
pub struct RecordingOpener {
    opened: Mutex<Vec<ExportArtifact>>,
}

impl RecordingOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<ExportArtifact> {
        self.opened.lock().clone()
    }
}

impl ArtifactOpener for RecordingOpener {
    fn open(&self, artifact: &ExportArtifact) {
        self.opened.lock().push(artifact.clone());
    }
}
