// Test Helpers Module - In-Process Doubles
//
// Scripted stand-ins for the export backend and the notification and
// retrieval collaborators, shared by unit tests and the integration suites
// under tests/.

pub mod recording;
pub mod scripted_backend;

pub use recording::{Notification, RecordingNotifier, RecordingOpener};
pub use scripted_backend::ScriptedBackend;
