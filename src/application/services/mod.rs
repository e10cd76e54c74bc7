pub mod progress;

pub use progress::{ProgressReporter, RecordedProgress, SilentProgress};
