use std::path::PathBuf;

use thiserror::Error;

/// Hint attached to every missing-input error.
pub const BUILD_DATA_HINT: &str =
    "run `build-data` first to generate vocabularies and trimmed embeddings";

/// Errors that can occur while setting up an NER training run.
#[derive(Debug, Error)]
pub enum NerError {
    /// A vocabulary, embeddings or dataset file does not exist.
    #[error("file not found: {}; {hint}", .path.display())]
    FileNotFound {
        /// The missing path.
        path: PathBuf,
        /// What the caller should do about it.
        hint: &'static str,
    },

    /// A token is absent from a vocabulary that does not allow unknowns.
    #[error("unknown token {token:?} is not allowed; check that tags match the model")]
    UnknownToken {
        /// The offending token.
        token: String,
    },

    /// The same token appears twice in a vocabulary file.
    #[error("duplicate token {token:?} on line {line} of {}", .path.display())]
    DuplicateToken {
        path: PathBuf,
        token: String,
        line: usize,
    },

    /// A blank line inside a vocabulary file would shift every later id.
    #[error("blank line {line} inside {}", .path.display())]
    BlankLine { path: PathBuf, line: usize },

    /// A character-level processor was requested without a character vocabulary.
    #[error("character features requested but no character vocabulary was given")]
    MissingCharVocab,

    /// The trimmed embeddings archive does not hold a usable matrix.
    #[error("invalid embeddings: {0}")]
    InvalidEmbeddings(String),

    /// An `.npz` archive could not be opened or written.
    #[error("npz archive error: {0}")]
    Npz(String),

    /// Resources were read before `Config::load` ran.
    #[error("config resources are not loaded; construct with load=true or call load()")]
    NotLoaded,

    /// A process-wide logger has already been installed.
    #[error("a global logger is already installed")]
    LoggerAlreadyInstalled,

    /// Settings could not be (de)serialized.
    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),

    /// Candle ML framework error.
    #[error("tensor error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl NerError {
    /// Build a [`NerError::FileNotFound`] pointing at the data build step.
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        NerError::FileNotFound {
            path: path.into(),
            hint: BUILD_DATA_HINT,
        }
    }

    /// Map an I/O error on `path` to `FileNotFound` when the file is absent.
    pub(crate) fn from_io(path: &std::path::Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            NerError::missing(path)
        } else {
            NerError::Io(err)
        }
    }
}

/// Result type alias for nerkit operations.
pub type Result<T> = std::result::Result<T, NerError>;
