//! # nerkit Core
//!
//! Setup layer for a sequence-labeling (NER) training run: run settings,
//! vocabularies, token processing, pretrained embeddings and the run logger.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nerkit_core::{Config, Settings};
//!
//! let settings = Settings::for_output_dir("results/run1");
//! let config = Config::with_settings(settings, true).unwrap();
//!
//! let res = config.resources().unwrap();
//! let id = res.processing_tag.process("B-PER").unwrap().id();
//! assert!(id < res.ntags());
//! ```
pub mod config;
pub mod dataset;
pub mod embeddings;
pub mod error;
pub mod logging;
pub mod processing;
pub mod vocab;

// Re-export primary API
pub use config::{Config, LrMethod, Resources, Settings};
pub use dataset::{Dataset, Sentence};
pub use embeddings::Embeddings;
pub use error::{NerError, Result};
pub use logging::Logger;
pub use processing::{Processed, ProcessingOptions, Processor};
pub use vocab::{Vocabulary, UNK};
