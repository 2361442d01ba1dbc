//! Error types for capy-applet

/// Boxed error type carried by producers, line handlers and hooks.
///
/// Applet callbacks are user code; any error they raise is treated as the
/// task's terminal failure and tears the whole applet down.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Applet framework errors
#[derive(Debug, thiserror::Error)]
pub enum AppletError {
    #[error("executable not found: {0}")]
    ExecutableNotFound(String),

    #[error("empty command line")]
    EmptyCommandLine,

    #[error("invalid command line: {0}")]
    InvalidCommandLine(#[from] shell_words::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("task panicked: {0}")]
    TaskPanic(String),
}
