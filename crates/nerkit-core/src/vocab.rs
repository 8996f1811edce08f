//! # Vocabularies
//!
//! Dense token ↔ id tables loaded from one-token-per-line text files.
//! The id of a token is its line index, so ids always cover `0..len()`.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{NerError, Result};

/// Reserved token for out-of-vocabulary words.
pub const UNK: &str = "$UNK$";

/// A bijection between a finite token set and dense integer ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    token_to_id: HashMap<String, usize>,
    id_to_token: Vec<String>,
}

impl Vocabulary {
    /// Create an empty vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a vocabulary from tokens in insertion order.
    ///
    /// Repeated tokens keep the id of their first occurrence.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocab = Self::new();
        for token in tokens {
            vocab.insert(token.into());
        }
        vocab
    }

    /// Load a vocabulary file, one token per line.
    ///
    /// Line terminators are stripped but other whitespace is kept, so a
    /// literal space survives in a character vocabulary. Trailing blank
    /// lines are ignored; ids always equal line indices.
    ///
    /// # Errors
    /// * [`NerError::FileNotFound`] if `path` does not exist
    /// * [`NerError::BlankLine`] if a blank line precedes another token
    /// * [`NerError::DuplicateToken`] if a token repeats
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| NerError::from_io(path, e))?;
        let reader = BufReader::new(file);

        let mut vocab = Self::new();
        let mut blank = None;
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let token = line.strip_suffix('\r').unwrap_or(&line);
            if token.is_empty() {
                blank.get_or_insert(line_no + 1);
                continue;
            }
            if let Some(line) = blank {
                return Err(NerError::BlankLine {
                    path: path.to_path_buf(),
                    line,
                });
            }
            if vocab.contains(token) {
                return Err(NerError::DuplicateToken {
                    path: path.to_path_buf(),
                    token: token.to_string(),
                    line: line_no + 1,
                });
            }
            vocab.insert(token.to_string());
        }

        debug!("loaded {} tokens from {}", vocab.len(), path.display());
        Ok(vocab)
    }

    /// Write the vocabulary in id order, one token per line.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        for (i, token) in self.id_to_token.iter().enumerate() {
            if i > 0 {
                writer.write_all(b"\n")?;
            }
            writer.write_all(token.as_bytes())?;
        }
        writer.flush()?;

        debug!("wrote {} tokens to {}", self.len(), path.display());
        Ok(())
    }

    /// Insert `token` if absent and return its id.
    pub fn insert(&mut self, token: String) -> usize {
        if let Some(&id) = self.token_to_id.get(&token) {
            return id;
        }
        let id = self.id_to_token.len();
        self.token_to_id.insert(token.clone(), id);
        self.id_to_token.push(token);
        id
    }

    /// Look up the id of `token`.
    pub fn id(&self, token: &str) -> Option<usize> {
        self.token_to_id.get(token).copied()
    }

    /// Look up the token stored at `id`.
    pub fn token(&self, id: usize) -> Option<&str> {
        self.id_to_token.get(id).map(String::as_str)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.token_to_id.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_token.is_empty()
    }

    /// Iterate tokens in id order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.id_to_token.iter().map(String::as_str)
    }
}
