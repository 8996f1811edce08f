//! # Run Logger
//!
//! Builds the `tracing` subscriber used during a training run: DEBUG and
//! above go to a log file with timestamps and levels, and to the console as
//! bare messages.
//!
//! A [`Logger`] is an owned value. Building one does not touch the global
//! dispatcher; events are routed to it with [`Logger::in_scope`] or, once
//! per process, [`Logger::install_global`].
//!
//! Two loggers created for the same path hold separate handles appending to
//! one file. An event reaches only the innermost active logger, so lines of
//! both end up interleaved in that file. Build one per run.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::Dispatch;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, Registry};

use crate::error::{NerError, Result};

/// A file + console `tracing` sink owned by its creator.
#[derive(Clone)]
pub struct Logger {
    dispatch: Dispatch,
    path: PathBuf,
}

impl Logger {
    /// Open (or create) `path` for appending and build the sink.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_console(path, std::io::stderr)
    }

    /// Like [`Logger::new`], with bare messages sent to `console`.
    pub fn with_console<P, W>(path: P, console: W) -> Result<Self>
    where
        P: AsRef<Path>,
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let path = path.as_ref().to_path_buf();
        let file: File = OpenOptions::new().create(true).append(true).open(&path)?;

        let file_layer = fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false);
        let console_layer = fmt::layer()
            .with_writer(console)
            .without_time()
            .with_level(false)
            .with_target(false);

        let subscriber = Registry::default()
            .with(LevelFilter::DEBUG)
            .with(console_layer)
            .with(file_layer);

        Ok(Self {
            dispatch: Dispatch::new(subscriber),
            path,
        })
    }

    /// Run `f` with this logger as the current thread's dispatcher.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Make this logger the process-wide default.
    ///
    /// # Errors
    /// [`NerError::LoggerAlreadyInstalled`] if any global dispatcher was
    /// set before, including by another `Logger`.
    pub fn install_global(&self) -> Result<()> {
        tracing::dispatcher::set_global_default(self.dispatch.clone())
            .map_err(|_| NerError::LoggerAlreadyInstalled)
    }

    /// The log file this logger appends to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger").field("path", &self.path).finish()
    }
}
