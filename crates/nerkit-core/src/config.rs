//! # Run Configuration
//!
//! [`Settings`] holds the compiled-in paths and hyperparameters of a run.
//! [`Config`] is built once at startup from a `Settings`: it prepares the
//! output directory, owns the run [`Logger`] and, unless deferred, loads
//! the vocabularies, processors and pretrained embeddings.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::embeddings::Embeddings;
use crate::error::{NerError, Result};
use crate::logging::Logger;
use crate::processing::{ProcessingOptions, Processor};
use crate::vocab::Vocabulary;

/// Default word embedding size, matching the GloVe 6B 300d vectors.
pub const DIM_WORD: usize = 300;

/// Optimizer used by the trainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LrMethod {
    Adam,
    Adagrad,
    Sgd,
    Rmsprop,
}

impl LrMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LrMethod::Adam => "adam",
            LrMethod::Adagrad => "adagrad",
            LrMethod::Sgd => "sgd",
            LrMethod::Rmsprop => "rmsprop",
        }
    }
}

impl fmt::Display for LrMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LrMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "adam" => Ok(LrMethod::Adam),
            "adagrad" => Ok(LrMethod::Adagrad),
            "sgd" => Ok(LrMethod::Sgd),
            "rmsprop" => Ok(LrMethod::Rmsprop),
            other => Err(format!("unknown optimizer: {other}")),
        }
    }
}

/// Paths and hyperparameters of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    // general
    pub dir_output: PathBuf,
    pub dir_model: PathBuf,
    pub path_log: PathBuf,

    // embeddings
    pub dim_word: usize,
    pub dim_char: usize,
    /// GloVe vectors the trimmed file is built from.
    pub filename_glove: PathBuf,
    /// Trimmed embeddings, produced by `build-data`.
    pub filename_trimmed: PathBuf,
    pub use_pretrained: bool,

    // dataset
    pub filename_dev: PathBuf,
    pub filename_test: PathBuf,
    pub filename_train: PathBuf,
    /// Cap on sentences read per dataset file.
    pub max_iter: Option<usize>,

    // vocab, produced by `build-data`
    pub filename_words: PathBuf,
    pub filename_tags: PathBuf,
    pub filename_chars: PathBuf,

    // training
    pub train_embeddings: bool,
    pub nepochs: usize,
    pub dropout: f32,
    pub batch_size: usize,
    pub lr_method: LrMethod,
    pub lr: f32,
    pub lr_decay: f32,
    /// Gradient clipping threshold; `None` disables clipping.
    pub clip: Option<f32>,
    /// Early stopping patience in epochs.
    pub nepoch_no_imprv: usize,

    // model
    /// LSTM size over characters.
    pub hidden_size_char: usize,
    /// LSTM size over word embeddings.
    pub hidden_size_lstm: usize,
    pub use_crf: bool,
    pub use_chars: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let dir_output = PathBuf::from("results/test/");
        Self {
            dir_model: dir_output.join("model.weights"),
            path_log: dir_output.join("log.txt"),
            dir_output,

            dim_word: DIM_WORD,
            dim_char: 100,
            filename_glove: PathBuf::from(format!("../glove.6B/glove.6B.{DIM_WORD}d.txt")),
            filename_trimmed: PathBuf::from(format!("../glove.6B.{DIM_WORD}d.trimmed.npz")),
            use_pretrained: true,

            filename_dev: PathBuf::from("CoNLL2003/eng/eng.testa.iob"),
            filename_test: PathBuf::from("CoNLL2003/eng/eng.testb.iob"),
            filename_train: PathBuf::from("CoNLL2003/eng/eng.train.iob"),
            max_iter: None,

            filename_words: PathBuf::from("words.txt"),
            filename_tags: PathBuf::from("tags.txt"),
            filename_chars: PathBuf::from("chars.txt"),

            train_embeddings: false,
            nepochs: 15,
            dropout: 0.5,
            batch_size: 20,
            lr_method: LrMethod::Adam,
            lr: 0.001,
            lr_decay: 0.9,
            clip: None,
            nepoch_no_imprv: 3,

            hidden_size_char: 100,
            hidden_size_lstm: 300,
            use_crf: true,
            use_chars: true,
        }
    }
}

impl Settings {
    /// Default settings with outputs rooted at `dir`.
    pub fn for_output_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self::default().with_output_dir(dir)
    }

    /// Move the output directory, model directory and log file under `dir`.
    pub fn with_output_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        let dir = dir.as_ref();
        self.dir_output = dir.to_path_buf();
        self.dir_model = dir.join("model.weights");
        self.path_log = dir.join("log.txt");
        self
    }

    /// Set the three vocabulary files.
    pub fn with_vocab_files<P: AsRef<Path>>(mut self, words: P, tags: P, chars: P) -> Self {
        self.filename_words = words.as_ref().to_path_buf();
        self.filename_tags = tags.as_ref().to_path_buf();
        self.filename_chars = chars.as_ref().to_path_buf();
        self
    }

    /// Set the train, dev and test dataset files.
    pub fn with_dataset_files<P: AsRef<Path>>(mut self, train: P, dev: P, test: P) -> Self {
        self.filename_train = train.as_ref().to_path_buf();
        self.filename_dev = dev.as_ref().to_path_buf();
        self.filename_test = test.as_ref().to_path_buf();
        self
    }

    pub fn with_glove<P: AsRef<Path>>(mut self, glove: P, dim_word: usize) -> Self {
        self.filename_glove = glove.as_ref().to_path_buf();
        self.dim_word = dim_word;
        self
    }

    pub fn with_trimmed<P: AsRef<Path>>(mut self, trimmed: P) -> Self {
        self.filename_trimmed = trimmed.as_ref().to_path_buf();
        self
    }

    /// Enable or disable pretrained embeddings.
    pub fn with_pretrained(mut self, enabled: bool) -> Self {
        self.use_pretrained = enabled;
        self
    }

    /// Enable or disable character features.
    pub fn with_chars(mut self, enabled: bool) -> Self {
        self.use_chars = enabled;
        self
    }

    pub fn with_max_iter(mut self, max_iter: Option<usize>) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Read settings from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| NerError::from_io(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Everything `Config::load` reads from disk.
#[derive(Debug, Clone)]
pub struct Resources {
    pub vocab_words: Vocabulary,
    pub vocab_tags: Vocabulary,
    pub vocab_chars: Vocabulary,
    /// Maps input words to ids (and character ids if enabled).
    pub processing_word: Processor,
    /// Maps tags to ids; unseen tags are an error.
    pub processing_tag: Processor,
    /// Present only when `use_pretrained` is set.
    pub embeddings: Option<Embeddings>,
}

impl Resources {
    fn load(settings: &Settings) -> Result<Self> {
        // 1. vocabularies
        let vocab_words = Vocabulary::load(&settings.filename_words)?;
        let vocab_tags = Vocabulary::load(&settings.filename_tags)?;
        let vocab_chars = Vocabulary::load(&settings.filename_chars)?;

        // 2. processing functions
        let processing_word = Processor::new(
            vocab_words.clone(),
            Some(vocab_chars.clone()),
            ProcessingOptions::words(settings.use_chars),
        )?;
        let processing_tag = Processor::new(vocab_tags.clone(), None, ProcessingOptions::tags())?;

        // 3. pretrained embeddings
        let embeddings = if settings.use_pretrained {
            let embeddings = Embeddings::load_trimmed(&settings.filename_trimmed)?;
            if embeddings.rows() != vocab_words.len() {
                return Err(NerError::InvalidEmbeddings(format!(
                    "{} has {} rows but the word vocabulary has {} entries",
                    settings.filename_trimmed.display(),
                    embeddings.rows(),
                    vocab_words.len()
                )));
            }
            Some(embeddings)
        } else {
            None
        };

        Ok(Self {
            vocab_words,
            vocab_tags,
            vocab_chars,
            processing_word,
            processing_tag,
            embeddings,
        })
    }

    pub fn nwords(&self) -> usize {
        self.vocab_words.len()
    }

    pub fn ntags(&self) -> usize {
        self.vocab_tags.len()
    }

    pub fn nchars(&self) -> usize {
        self.vocab_chars.len()
    }
}

/// The run configuration handed to the trainer.
#[derive(Debug)]
pub struct Config {
    settings: Settings,
    logger: Logger,
    resources: Option<Resources>,
}

impl Config {
    /// Build a config from the default settings.
    pub fn new(load: bool) -> Result<Self> {
        Self::with_settings(Settings::default(), load)
    }

    /// Create the output directories, build the logger and, if `load` is
    /// set, read all resources.
    pub fn with_settings(settings: Settings, load: bool) -> Result<Self> {
        fs::create_dir_all(&settings.dir_output)?;
        fs::create_dir_all(&settings.dir_model)?;

        let logger = Logger::new(&settings.path_log)?;
        let mut config = Self {
            settings,
            logger,
            resources: None,
        };

        if load {
            config.load()?;
        }
        Ok(config)
    }

    /// Read vocabularies, build processors and load embeddings.
    ///
    /// Nothing is stored unless every step succeeds.
    pub fn load(&mut self) -> Result<()> {
        let settings = &self.settings;
        let resources = self.logger.in_scope(|| {
            match serde_json::to_string(settings) {
                Ok(json) => debug!("settings: {json}"),
                Err(e) => warn!("could not serialize settings: {e}"),
            }
            let resources = Resources::load(settings)?;
            info!(
                "loaded {} words, {} tags, {} chars",
                resources.nwords(),
                resources.ntags(),
                resources.nchars()
            );
            Ok::<_, NerError>(resources)
        })?;
        self.resources = Some(resources);
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Loaded resources, or [`NerError::NotLoaded`] if loading was deferred.
    pub fn resources(&self) -> Result<&Resources> {
        self.resources.as_ref().ok_or(NerError::NotLoaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.resources.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.dir_model, Path::new("results/test/model.weights"));
        assert_eq!(settings.path_log, Path::new("results/test/log.txt"));
        assert_eq!(
            settings.filename_trimmed,
            Path::new("../glove.6B.300d.trimmed.npz")
        );
        assert_eq!(settings.nepochs, 15);
        assert_eq!(settings.batch_size, 20);
        assert_eq!(settings.lr_method, LrMethod::Adam);
        assert_eq!(settings.clip, None);
        assert!(settings.use_crf && settings.use_chars && settings.use_pretrained);
    }

    #[test]
    fn test_output_dir_moves_derived_paths() {
        let settings = Settings::for_output_dir("runs/a");
        assert_eq!(settings.dir_output, Path::new("runs/a"));
        assert_eq!(settings.dir_model, Path::new("runs/a/model.weights"));
        assert_eq!(settings.path_log, Path::new("runs/a/log.txt"));
    }

    #[test]
    fn test_settings_json() {
        let settings = Settings::default().with_chars(false).with_max_iter(Some(10));
        let json = settings.to_json().unwrap();
        assert!(json.contains("\"lr_method\": \"adam\""));

        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_lr_method_from_str() {
        assert_eq!("SGD".parse::<LrMethod>().unwrap(), LrMethod::Sgd);
        assert_eq!(LrMethod::Rmsprop.to_string(), "rmsprop");
        assert!("momentum".parse::<LrMethod>().is_err());
    }
}
