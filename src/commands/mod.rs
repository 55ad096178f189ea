pub mod daemon;
pub mod publish;
pub mod report;

// Re-export command functions for convenience
pub use daemon::daemon;
pub use publish::publish;
pub use report::{preview, schedule, status};
