//! Data loading for CoNLL/IOB-tagged sentences.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::error::{NerError, Result};

/// Document separator line in CoNLL files.
const DOCSTART: &str = "-DOCSTART-";

/// A single sentence: parallel word and tag columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sentence {
    pub words: Vec<String>,
    pub tags: Vec<String>,
}

impl Sentence {
    pub fn new(words: Vec<String>, tags: Vec<String>) -> Self {
        Self { words, tags }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// The sentences of one CoNLL file.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    sentences: Vec<Sentence>,
}

impl Dataset {
    /// Read at most `max_iter` sentences from `path`.
    ///
    /// Columns are whitespace-separated: the first is the word, the last the
    /// tag. Blank lines and `-DOCSTART-` lines end a sentence.
    pub fn open<P: AsRef<Path>>(path: P, max_iter: Option<usize>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| NerError::from_io(path, e))?;
        let reader = BufReader::new(file);

        let limit = max_iter.unwrap_or(usize::MAX);
        let mut sentences = Vec::new();
        let mut current = Sentence::default();

        for line in reader.lines() {
            if sentences.len() >= limit {
                break;
            }
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line.starts_with(DOCSTART) {
                if !current.is_empty() {
                    sentences.push(std::mem::take(&mut current));
                }
                continue;
            }

            let columns: Vec<&str> = line.split_whitespace().collect();
            if columns.len() < 2 {
                continue;
            }
            current.words.push(columns[0].to_string());
            current.tags.push(columns[columns.len() - 1].to_string());
        }

        // Don't forget the last sentence
        if !current.is_empty() && sentences.len() < limit {
            sentences.push(current);
        }

        debug!("read {} sentences from {}", sentences.len(), path.display());
        Ok(Self { sentences })
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sentence> {
        self.sentences.iter()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Sentence;
    type IntoIter = std::slice::Iter<'a, Sentence>;

    fn into_iter(self) -> Self::IntoIter {
        self.sentences.iter()
    }
}

/// Collect the word and tag sets of several datasets.
///
/// Sets are sorted so vocabularies built from them are reproducible.
pub fn vocab_words_and_tags<'a, I>(datasets: I) -> (BTreeSet<String>, BTreeSet<String>)
where
    I: IntoIterator<Item = &'a Dataset>,
{
    let mut words = BTreeSet::new();
    let mut tags = BTreeSet::new();
    for dataset in datasets {
        for sentence in dataset {
            words.extend(sentence.words.iter().cloned());
            tags.extend(sentence.tags.iter().cloned());
        }
    }
    (words, tags)
}

/// Collect every character used by `words`.
pub fn vocab_chars<'a, I>(words: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    words
        .into_iter()
        .flat_map(|w| w.chars())
        .map(String::from)
        .collect()
}
