pub mod console;
pub mod progress;
pub mod summary;

pub use progress::{ProgressEvent, ProgressSink};
