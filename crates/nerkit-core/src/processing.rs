//! # Token Processing
//!
//! Maps raw dataset tokens to vocabulary ids. A [`Processor`] is built once
//! per vocabulary and then applied to every token of every sentence.

use crate::error::{NerError, Result};
use crate::vocab::{Vocabulary, UNK};

/// Flags controlling how a [`Processor`] normalizes and looks up tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingOptions {
    /// Lowercase before the word lookup.
    pub lowercase: bool,
    /// Also emit character ids.
    pub use_chars: bool,
    /// Map out-of-vocabulary tokens to the reserved unknown id.
    pub allow_unknown: bool,
}

impl ProcessingOptions {
    /// Options for input words.
    pub fn words(use_chars: bool) -> Self {
        Self {
            lowercase: true,
            use_chars,
            allow_unknown: true,
        }
    }

    /// Options for output tags: exact match, unseen tags are an error.
    pub fn tags() -> Self {
        Self {
            lowercase: false,
            use_chars: false,
            allow_unknown: false,
        }
    }
}

/// Result of processing one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Processed {
    /// Word-level id only.
    Id(usize),
    /// Character ids of the raw token, paired with the word-level id.
    WithChars { chars: Vec<usize>, id: usize },
}

impl Processed {
    /// The word-level id regardless of shape.
    pub fn id(&self) -> usize {
        match self {
            Processed::Id(id) | Processed::WithChars { id, .. } => *id,
        }
    }

    pub fn chars(&self) -> Option<&[usize]> {
        match self {
            Processed::Id(_) => None,
            Processed::WithChars { chars, .. } => Some(chars),
        }
    }
}

/// Maps raw tokens to ids under a fixed set of [`ProcessingOptions`].
#[derive(Debug, Clone)]
pub struct Processor {
    vocab: Vocabulary,
    chars: Option<Vocabulary>,
    options: ProcessingOptions,
    unknown_id: usize,
}

impl Processor {
    /// Create a processor over `vocab`.
    ///
    /// The reserved unknown id is the id of [`UNK`] when the vocabulary
    /// has it, otherwise `vocab.len()`.
    ///
    /// # Errors
    /// [`NerError::MissingCharVocab`] if `options.use_chars` is set and
    /// `chars` is `None`.
    pub fn new(
        vocab: Vocabulary,
        chars: Option<Vocabulary>,
        options: ProcessingOptions,
    ) -> Result<Self> {
        if options.use_chars && chars.is_none() {
            return Err(NerError::MissingCharVocab);
        }
        let unknown_id = vocab.id(UNK).unwrap_or(vocab.len());
        Ok(Self {
            vocab,
            chars,
            options,
            unknown_id,
        })
    }

    /// Process one raw token.
    ///
    /// # Examples
    /// ```
    /// use nerkit_core::{Processed, ProcessingOptions, Processor, Vocabulary};
    ///
    /// let words = Vocabulary::from_tokens(["the", "cat", "$UNK$"]);
    /// let proc = Processor::new(words, None, ProcessingOptions::words(false)).unwrap();
    ///
    /// assert_eq!(proc.process("Cat").unwrap(), Processed::Id(1));
    /// assert_eq!(proc.process("dog").unwrap(), Processed::Id(2));
    /// ```
    pub fn process(&self, token: &str) -> Result<Processed> {
        let id = self.word_id(token)?;
        match (&self.chars, self.options.use_chars) {
            (Some(chars), true) => Ok(Processed::WithChars {
                chars: char_ids(chars, token),
                id,
            }),
            _ => Ok(Processed::Id(id)),
        }
    }

    fn word_id(&self, token: &str) -> Result<usize> {
        let lowered;
        let key = if self.options.lowercase {
            lowered = token.to_lowercase();
            lowered.as_str()
        } else {
            token
        };

        match self.vocab.id(key) {
            Some(id) => Ok(id),
            None if self.options.allow_unknown => Ok(self.unknown_id),
            None => Err(NerError::UnknownToken {
                token: key.to_string(),
            }),
        }
    }

    pub fn unknown_id(&self) -> usize {
        self.unknown_id
    }

    pub fn options(&self) -> ProcessingOptions {
        self.options
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }
}

/// Character ids of `token`; characters missing from `chars` are dropped.
fn char_ids(chars: &Vocabulary, token: &str) -> Vec<usize> {
    let mut buf = [0u8; 4];
    token
        .chars()
        .filter_map(|c| chars.id(c.encode_utf8(&mut buf)))
        .collect()
}
