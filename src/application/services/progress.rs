use std::sync::Mutex;

/// Receives progress notifications from the use cases
pub trait ProgressReporter: Send + Sync {
    /// A step is about to start
    fn step(&self, message: &str);

    /// Informational detail about the current step
    fn detail(&self, message: &str) {
        let _ = message;
    }

    /// Something was skipped or tolerated
    fn warn(&self, message: &str) {
        let _ = message;
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn step(&self, _message: &str) {}
}

/// Keeps every notification, for assertions
#[derive(Debug, Default)]
pub struct RecordedProgress {
    events: Mutex<Vec<String>>,
}

impl RecordedProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    fn push(&self, event: String) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ProgressReporter for RecordedProgress {
    fn step(&self, message: &str) {
        self.push(format!("step: {message}"));
    }

    fn detail(&self, message: &str) {
        self.push(format!("detail: {message}"));
    }

    fn warn(&self, message: &str) {
        self.push(format!("warn: {message}"));
    }
}
