//! Injected logging capability.
//!
//! The library never touches process-global logger state: components take
//! an `&dyn EventLog` whose lifetime is scoped to one command invocation,
//! so the engine stays safely callable from multiple concurrent callers.
//! Frontends that want real output install the `log` facade themselves and
//! inject [`StdLog`].

/// Sink for progress and diagnostic events emitted while generating
/// coverage.
pub trait EventLog: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards events to the `log` crate macros under the `blockcov` target.
#[derive(Debug, Default)]
pub struct StdLog;

impl EventLog for StdLog {
    fn info(&self, message: &str) {
        log::info!(target: "blockcov", "{message}");
    }

    fn warn(&self, message: &str) {
        log::warn!(target: "blockcov", "{message}");
    }

    fn error(&self, message: &str) {
        log::error!(target: "blockcov", "{message}");
    }
}

/// Discards all events. Useful for tests and embedding.
#[derive(Debug, Default)]
pub struct NullLog;

impl EventLog for NullLog {
    fn info(&self, _message: &str) {}

    fn warn(&self, _message: &str) {}

    fn error(&self, _message: &str) {}
}
