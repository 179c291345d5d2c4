//! Installation run orchestration

pub mod cleanup;
pub mod detector;
pub mod engine;
pub mod preflight;
pub mod prompt;

pub use cleanup::{Cleanup, CleanupError, CleanupOptions, CleanupOutcome};
pub use detector::CompletionDetector;
pub use engine::{EventHandler, ExecutionEvent, InstallEngine};
pub use preflight::PreflightError;
pub use prompt::{Prompter, TerminalPrompter};
