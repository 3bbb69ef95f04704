use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::ConfigError;

/// The words a drawer can be asked to draw. Never empty.
#[derive(Debug, Clone)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    pub fn new(words: Vec<String>) -> Result<Self, ConfigError> {
        let words: Vec<String> = words
            .into_iter()
            .map(|word| word.trim().to_string())
            .filter(|word| !word.is_empty())
            .collect();
        if words.is_empty() {
            return Err(ConfigError::EmptyWordList);
        }
        Ok(Self { words })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Picks a random word, avoiding `previous` unless it is the only word.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R, previous: Option<&str>) -> &str {
        let candidates: Vec<&str> = self
            .words
            .iter()
            .map(String::as_str)
            .filter(|word| Some(*word) != previous)
            .collect();
        candidates
            .choose(rng)
            .copied()
            .unwrap_or(self.words[0].as_str())
    }
}
