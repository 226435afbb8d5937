use thiserror::Error;

/// Errors surfaced by the engine.
///
/// Everything here is either a configuration problem, reported once by
/// [`create_generator`](crate::create_generator) before any token is
/// resolved, or a failure of a consumed collaborator such as an extractor.
/// Per-token problems never become an `AtomError`.
#[derive(Error, Debug)]
pub enum AtomError {
    #[error("Invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Preset cycle detected: {0}")]
    PresetCycle(String),

    #[error("Presets nested deeper than {0} levels")]
    PresetTooDeep(usize),

    #[error("Preset `{name}` failed to load: {message}")]
    PresetLoad { name: String, message: String },

    #[error("Theme must be an object, found {0}")]
    InvalidTheme(String),

    #[error("Layer names must not be empty")]
    EmptyLayerName,

    #[error("Extractor `{name}` failed: {message}")]
    Extractor { name: String, message: String },

    #[error("Logger error: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("Log file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by a rule, variant, shortcut, preflight or extractor
/// handler.
///
/// Handler failures are isolated: the engine logs them once and treats the
/// handler as having contributed nothing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HandlerError {
    pub message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// Create a type alias for convenience
pub type Result<T> = std::result::Result<T, AtomError>;
