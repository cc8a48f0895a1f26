use std::{collections::HashMap, sync::Arc};

use jieba_rs::Jieba;

use crate::{
    error::{Error, Result},
    stopwords::StopWords,
};

/// Splits text into word tokens, in order.
pub trait Segmenter: Send + Sync {
    fn segment<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a>;
}

impl Segmenter for Jieba {
    fn segment<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        Box::new(self.cut(text, true).into_iter())
    }
}

impl<S: Segmenter + ?Sized> Segmenter for Box<S> {
    fn segment<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        (**self).segment(text)
    }
}

/// Splits on whitespace only. Enough for space delimited input.
#[derive(Clone, Copy, Debug, Default)]
pub struct WhitespaceSegmenter;

impl Segmenter for WhitespaceSegmenter {
    fn segment<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        Box::new(text.split_whitespace())
    }
}

/// Occurrence counts, ranked by count descending. Ties keep first-seen order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrequencyTable {
    entries: Vec<(String, usize)>,
    total: usize,
}

impl FrequencyTable {
    pub fn entries(&self) -> &[(String, usize)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of tokens counted, repeats included.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn count(&self, word: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(w, _)| w == word)
            .map(|(_, count)| *count)
    }

    /// Counts divided by the top count, at most `max_words` entries.
    pub fn normalized(&self, max_words: usize) -> Vec<(&str, f32)> {
        let max_freq = match self.entries.first() {
            Some((_, count)) => *count as f32,
            None => return vec![],
        };

        let mut normalized_freqs: Vec<(&str, f32)> = self
            .entries
            .iter()
            .map(|(word, count)| (word.as_str(), *count as f32 / max_freq))
            .collect();

        if max_words > 0 {
            normalized_freqs.truncate(max_words);
        }

        normalized_freqs
    }
}

pub struct Tokenizer<S = Jieba> {
    segmenter: S,
    stopwords: Arc<StopWords>,
    //单字默认丢弃
    pub min_word_length: usize,
    pub min_tokens: usize,
}

impl Default for Tokenizer<Jieba> {
    fn default() -> Self {
        Tokenizer::new(Jieba::new())
    }
}

impl<S: Segmenter> Tokenizer<S> {
    pub fn new(segmenter: S) -> Self {
        Tokenizer {
            segmenter,
            stopwords: Arc::new(StopWords::default()),
            min_word_length: 2,
            min_tokens: 5,
        }
    }

    pub fn with_segmenter<T: Segmenter>(self, segmenter: T) -> Tokenizer<T> {
        Tokenizer {
            segmenter,
            stopwords: self.stopwords,
            min_word_length: self.min_word_length,
            min_tokens: self.min_tokens,
        }
    }

    pub fn with_stopwords(mut self, stopwords: Arc<StopWords>) -> Self {
        self.stopwords = stopwords;
        self
    }

    pub fn with_min_word_length(mut self, size: usize) -> Self {
        self.min_word_length = size;
        self
    }

    pub fn with_min_tokens(mut self, count: usize) -> Self {
        self.min_tokens = count;
        self
    }

    fn tokenize<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.segmenter
            .segment(text)
            .filter(move |word| word.chars().count() >= self.min_word_length)
            .filter(move |word| !self.stopwords.contains(word))
    }

    /// Counts the qualifying tokens of already normalized text.
    ///
    /// Fails with [`Error::InsufficientVocabulary`] when fewer than
    /// `min_tokens` tokens survive filtering.
    pub fn aggregate(&self, text: &str) -> Result<FrequencyTable> {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut counted: Vec<(&str, usize)> = Vec::new();
        let mut total = 0;

        for word in self.tokenize(text) {
            total += 1;
            match positions.get(word) {
                Some(&i) => counted[i].1 += 1,
                None => {
                    positions.insert(word, counted.len());
                    counted.push((word, 1));
                }
            }
        }

        if total < self.min_tokens {
            return Err(Error::InsufficientVocabulary { found: total });
        }

        // sort_by is stable, equal counts stay in first-seen order
        counted.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(FrequencyTable {
            entries: counted
                .into_iter()
                .map(|(word, count)| (word.to_string(), count))
                .collect(),
            total,
        })
    }
}
