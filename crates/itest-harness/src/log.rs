/// Sink for human-facing progress and failure messages.
pub trait Logger {
    fn log(&self, message: &str);
}

impl<F> Logger for F
where
    F: Fn(&str),
{
    fn log(&self, message: &str) {
        self(message)
    }
}

/// Forwards every message to `tracing` at INFO level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, message: &str) {
        tracing::info!(target: "itest", "{message}");
    }
}
