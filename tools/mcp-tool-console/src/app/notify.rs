use parking_lot::Mutex;

/// User-facing transient error channel.
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// Keeps every message in memory. Used by `--json` runs and by tests that
/// count notifications.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.messages.lock().len()
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}
