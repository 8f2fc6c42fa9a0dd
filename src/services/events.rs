// Patcher Events
// Reporting channel injected into every component

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Receives progress events; the console front end and tests implement it
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &str, payload: Value);
}

/// Serialize `payload` and hand it to `sink` under `event`
pub fn emit_event<T: Serialize>(sink: &dyn EventSink, event: &str, payload: &T) {
    match serde_json::to_value(payload) {
        Ok(value) => sink.emit(event, value),
        Err(e) => log::warn!("Dropped {event} event: {e}"),
    }
}

/// Event name used for every [`PatchEvent`]
pub const PATCH_EVENT: &str = "patcher://event";

/// What a [`PatchEvent`] reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatchEventKind {
    /// Service descriptor downloaded
    Downloaded,
    /// An installation with a services file was found
    Detected,
    /// Upstream services.json stored as services2.json
    Refreshed,
    /// The service is already listed in a services file
    AlreadyPresent,
    /// The service was appended to a services file
    Patched,
    /// Something went wrong for one path
    Failed,
}

/// A structured progress event: kind, path and a message for the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchEvent {
    pub kind: PatchEventKind,
    pub path: Option<String>,
    pub message: String,
}

impl PatchEvent {
    pub fn new(kind: PatchEventKind, path: Option<&Path>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.map(|p| p.display().to_string()),
            message: message.into(),
        }
    }

    /// Decode a payload emitted under [`PATCH_EVENT`]
    pub fn from_payload(payload: Value) -> Option<Self> {
        serde_json::from_value(payload).ok()
    }
}

/// Emit a [`PatchEvent`] under [`PATCH_EVENT`]
pub fn emit_patch_event(
    sink: &dyn EventSink,
    kind: PatchEventKind,
    path: Option<&Path>,
    message: impl Into<String>,
) {
    emit_event(sink, PATCH_EVENT, &PatchEvent::new(kind, path, message));
}

/// Collects patch events in memory, for tests
#[cfg(test)]
#[derive(Default)]
pub struct RecordingEventSink {
    events: std::sync::Mutex<Vec<PatchEvent>>,
}

#[cfg(test)]
impl RecordingEventSink {
    pub fn events(&self) -> Vec<PatchEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<PatchEventKind> {
        self.events().into_iter().map(|e| e.kind).collect()
    }
}

#[cfg(test)]
impl EventSink for RecordingEventSink {
    fn emit(&self, event: &str, payload: Value) {
        if event != PATCH_EVENT {
            return;
        }
        if let (Some(event), Ok(mut events)) = (PatchEvent::from_payload(payload), self.events.lock()) {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_event_payload_shape() {
        let sink = RecordingEventSink::default();
        emit_patch_event(
            &sink,
            PatchEventKind::AlreadyPresent,
            Some(Path::new("/tmp/services.json")),
            "Glimesh already exists",
        );

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, PatchEventKind::AlreadyPresent);
        assert_eq!(events[0].path.as_deref(), Some("/tmp/services.json"));

        let value = serde_json::to_value(&events[0]).unwrap();
        assert_eq!(value["kind"], "already-present");
    }

    #[test]
    fn test_other_events_are_ignored_by_recorder() {
        let sink = RecordingEventSink::default();
        sink.emit("log://log", serde_json::json!({ "message": "hi" }));
        assert!(sink.events().is_empty());
    }
}
