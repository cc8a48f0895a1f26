use std::{collections::HashSet, fs, path::Path};

use crate::error::Result;

/// Words never counted towards the cloud. Loaded once, then only read.
#[derive(Clone, Debug, Default)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let stopwords = Self::parse(&content);
        log::info!("Loaded {} stopwords from {}", stopwords.len(), path.display());

        Ok(stopwords)
    }

    /// One word per line, surrounding whitespace trimmed, blank lines skipped.
    pub fn parse(content: &str) -> Self {
        content.lines().map(str::trim).collect()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for StopWords {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        StopWords {
            words: iter
                .into_iter()
                .filter(|word| !word.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}
