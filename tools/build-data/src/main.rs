//! Data Build Tool
//!
//! Builds the word, tag and character vocabularies from the CoNLL
//! datasets and trims the GloVe vectors down to the word vocabulary.
//! `check` loads the result the way a training run would.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nerkit_core::dataset::{vocab_chars, vocab_words_and_tags};
use nerkit_core::embeddings::glove_vocab;
use nerkit_core::{Config, Dataset, Embeddings, Settings, Vocabulary, UNK};
use tracing::info;

/// CLI arguments
#[derive(Parser)]
#[command(name = "build-data")]
#[command(about = "Build vocabularies and trimmed embeddings for NER training")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// JSON settings file; compiled-in defaults when absent
    #[arg(short, long, env = "NERKIT_SETTINGS")]
    settings: Option<PathBuf>,

    /// Output directory for results and the run log
    #[arg(short, long, env = "NERKIT_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build vocabularies and trimmed embeddings (default)
    Build,
    /// Load the built files through `Config` and report their sizes
    Check,
    /// Print the effective settings as JSON
    Settings,
}

fn settings(cli: &Cli) -> Result<Settings> {
    let settings = match &cli.settings {
        Some(path) => Settings::from_json_file(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?,
        None => Settings::default(),
    };
    Ok(match &cli.output_dir {
        Some(dir) => settings.with_output_dir(dir),
        None => settings,
    })
}

/// Build the three vocabularies and the trimmed embeddings.
fn build(settings: &Settings) -> Result<()> {
    let datasets = [
        &settings.filename_train,
        &settings.filename_dev,
        &settings.filename_test,
    ]
    .into_iter()
    .map(|path| {
        Dataset::open(path, settings.max_iter)
            .with_context(|| format!("failed to read dataset {}", path.display()))
    })
    .collect::<Result<Vec<_>>>()?;

    let (words, tags) = vocab_words_and_tags(&datasets);
    info!("{} distinct words, {} tags", words.len(), tags.len());

    let glove = glove_vocab(&settings.filename_glove)
        .with_context(|| format!("failed to read {}", settings.filename_glove.display()))?;

    let mut vocab_words = Vocabulary::new();
    vocab_words.insert(UNK.to_string());
    for word in &words {
        let lower = word.to_lowercase();
        if glove.contains(&lower) {
            vocab_words.insert(lower);
        }
    }
    let vocab_tags = Vocabulary::from_tokens(tags);
    let vocab_chars = Vocabulary::from_tokens(vocab_chars(&words));

    vocab_words.write(&settings.filename_words)?;
    vocab_tags.write(&settings.filename_tags)?;
    vocab_chars.write(&settings.filename_chars)?;
    info!(
        "wrote {} words, {} tags, {} chars",
        vocab_words.len(),
        vocab_tags.len(),
        vocab_chars.len()
    );

    let embeddings =
        Embeddings::trim_glove(&settings.filename_glove, &vocab_words, settings.dim_word)?;
    embeddings.save_trimmed(&settings.filename_trimmed)?;
    info!(
        "saved {}x{} embeddings to {}",
        embeddings.rows(),
        embeddings.dim(),
        settings.filename_trimmed.display()
    );

    Ok(())
}

fn check(settings: Settings) -> Result<()> {
    let config = Config::with_settings(settings, true).context("failed to load config")?;
    let res = config.resources()?;
    config.logger().in_scope(|| {
        info!(
            "ok: {} words, {} tags, {} chars, embeddings: {}",
            res.nwords(),
            res.ntags(),
            res.nchars(),
            res.embeddings
                .as_ref()
                .map(|e| format!("{}x{}", e.rows(), e.dim()))
                .unwrap_or_else(|| "disabled".to_string())
        );
    });
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = settings(&cli)?;

    match cli.command.unwrap_or(Commands::Build) {
        Commands::Build => {
            let config = Config::with_settings(settings.clone(), false)
                .context("failed to prepare output directory")?;
            config.logger().in_scope(|| build(&settings))
        }
        Commands::Check => check(settings),
        Commands::Settings => {
            println!("{}", settings.to_json()?);
            Ok(())
        }
    }
}
