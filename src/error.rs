//! Error types for gview.
//!
//! Every fallible library operation returns [`Result`]. Command handlers
//! bubble these errors up to the session, which renders them into the
//! history pane instead of aborting.

use crate::config::ConfigFileError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GviewError {
    /// Malformed or unsupported FITS data.
    #[error("{context}: {source}")]
    Fits {
        context: String,
        #[source]
        source: FitsErrorKind,
    },

    /// Missing or unusable world coordinate keywords.
    #[error("WCS error: {0}")]
    Wcs(String),

    /// Bad input to an interactive command. `context` is the full message.
    #[error("{context}")]
    Command {
        context: String,
        #[source]
        source: CommandErrorKind,
    },

    /// Star finding or fitting failed.
    #[error("{0}")]
    Analysis(String),

    #[error("{}: {message}", path.as_ref().map_or_else(|| "I/O error".to_string(), |p| p.display().to_string()))]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FitsErrorKind {
    #[error("not a FITS file (missing SIMPLE card)")]
    NotFits,

    #[error("header is missing the END card")]
    MissingEnd,

    #[error("missing required keyword {0}")]
    MissingKeyword(String),

    #[error("unsupported BITPIX value {0}")]
    UnsupportedBitpix(i64),

    #[error("invalid axis sizes {0:?}")]
    BadAxes(Vec<i64>),

    #[error("no image data found (NAXIS < 2 in every HDU)")]
    NoImage,

    #[error("data truncated: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("malformed card {keyword:?}: {message}")]
    BadCard { keyword: String, message: String },
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CommandErrorKind {
    #[error("usage: {0}")]
    Usage(String),

    #[error("invalid argument {arg:?}: {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("unknown name {0:?}")]
    UnknownName(String),

    #[error("command failed: {0}")]
    Failed(String),
}

pub type Result<T> = std::result::Result<T, GviewError>;

// ============================================================================
// Constructors
// ============================================================================

impl GviewError {
    pub fn fits(context: impl Into<String>, source: FitsErrorKind) -> Self {
        Self::Fits {
            context: context.into(),
            source,
        }
    }

    pub fn command(context: impl Into<String>, source: CommandErrorKind) -> Self {
        Self::Command {
            context: context.into(),
            source,
        }
    }

    /// `usage: <usage>`
    pub fn usage(usage: impl Into<String>) -> Self {
        let usage = usage.into();
        Self::command(format!("usage: {usage}"), CommandErrorKind::Usage(usage))
    }

    pub fn invalid_argument(arg: impl Into<String>, message: impl Into<String>) -> Self {
        let arg = arg.into();
        let message = message.into();
        Self::command(
            format!("invalid argument '{arg}': {message}"),
            CommandErrorKind::InvalidArgument { arg, message },
        )
    }

    /// `no such <what>: '<name>'`, e.g. for buffers and color maps.
    pub fn unknown_name(what: &str, name: impl Into<String>) -> Self {
        let name = name.into();
        Self::command(
            format!("no such {what}: '{name}'"),
            CommandErrorKind::UnknownName(name),
        )
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: Some(path.into()),
            message: source.to_string(),
            source,
        }
    }

    pub fn wcs(message: impl Into<String>) -> Self {
        Self::Wcs(message.into())
    }

    pub fn analysis(message: impl Into<String>) -> Self {
        Self::Analysis(message.into())
    }

    /// Prefix the message with `ctx`, outermost first.
    #[must_use]
    pub fn context(self, ctx: &str) -> Self {
        let chain = |inner: String| {
            if inner.is_empty() {
                ctx.to_string()
            } else {
                format!("{ctx}: {inner}")
            }
        };
        match self {
            Self::Fits { context, source } => Self::Fits {
                context: chain(context),
                source,
            },
            Self::Command { context, source } => Self::Command {
                context: chain(context),
                source,
            },
            Self::Io { path, message, source } => Self::Io {
                path,
                message: chain(message),
                source,
            },
            Self::Wcs(msg) => Self::Wcs(chain(msg)),
            Self::Analysis(msg) => Self::Analysis(chain(msg)),
            Self::Config(msg) => Self::Config(chain(msg)),
        }
    }
}

impl From<std::io::Error> for GviewError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<ConfigFileError> for GviewError {
    fn from(err: ConfigFileError) -> Self {
        Self::Config(err.to_string())
    }
}

/// `.context()` for any result whose error converts into [`GviewError`].
pub trait ErrorContext<T> {
    fn context(self, ctx: &str) -> Result<T>;

    fn with_context<C: AsRef<str>>(self, f: impl FnOnce() -> C) -> Result<T>;
}

impl<T, E: Into<GviewError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, ctx: &str) -> Result<T> {
        self.map_err(|e| e.into().context(ctx))
    }

    fn with_context<C: AsRef<str>>(self, f: impl FnOnce() -> C) -> Result<T> {
        self.map_err(|e| e.into().context(f().as_ref()))
    }
}
