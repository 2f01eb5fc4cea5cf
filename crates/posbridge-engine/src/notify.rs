//! # Notification Sinks
//!
//! Where user-visible notices go. The UI shell shows them as toasts; the
//! host writes them to the log.

use std::sync::Mutex;
use tracing::info;

use posbridge_core::ports::NotificationSink;

/// Reports notifications through `tracing` at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, message: &str) {
        info!(target: "posbridge::notify", %message, "Notification");
    }
}

/// Discards notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNotifier;

impl NotificationSink for NoOpNotifier {
    fn notify(&self, _message: &str) {}
}

/// Keeps every notification in memory, oldest first.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier_keeps_order() {
        let sink = RecordingNotifier::new();
        sink.notify("first");
        sink.notify("second");
        assert_eq!(sink.messages(), vec!["first", "second"]);
    }

    #[test]
    fn test_sinks_are_object_safe() {
        let sinks: Vec<Box<dyn NotificationSink>> =
            vec![Box::new(TracingNotifier), Box::new(NoOpNotifier)];
        for sink in &sinks {
            sink.notify("Payment approved: $1.00");
        }
    }
}
