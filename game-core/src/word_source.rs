use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use game_types::{GameError, VocabularySummary, WORD_LENGTH};
use rand::seq::IndexedRandom;
use tracing::{info, warn};

/// Used when the configured word list cannot be read at all
pub const FALLBACK_WORDS: [&str; 5] = ["PLATO", "PRADO", "PLACA", "BRAZO", "CAMPO"];

/// Anything that can hand over the raw word list.
pub trait WordListProvider: Send + Sync {
    fn fetch(&self) -> Result<Vec<String>>;
}

/// One word per line; blank lines and `#` comments are skipped.
pub struct FileWordList {
    path: PathBuf,
}

impl FileWordList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl WordListProvider for FileWordList {
    fn fetch(&self) -> Result<Vec<String>> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read word list {}", self.path.display()))?;

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect())
    }
}

pub struct StaticWordList {
    words: Vec<String>,
}

impl StaticWordList {
    pub fn new(words: &[&str]) -> Self {
        Self {
            words: words.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl WordListProvider for StaticWordList {
    fn fetch(&self) -> Result<Vec<String>> {
        Ok(self.words.clone())
    }
}

struct Vocabulary {
    words: Vec<String>,
    index: HashSet<String>,
}

impl Vocabulary {
    fn from_raw(raw: Vec<String>) -> Self {
        let mut words = Vec::new();
        let mut index = HashSet::new();

        for word in raw {
            let word = word.trim().to_uppercase();
            if !is_playable(&word) {
                continue;
            }
            if index.insert(word.clone()) {
                words.push(word);
            }
        }

        Self { words, index }
    }
}

fn is_playable(word: &str) -> bool {
    word.chars().count() == WORD_LENGTH && word.chars().all(char::is_alphabetic)
}

/// Process-wide vocabulary. The provider is consulted at most once; after
/// that the cached list is served until the process exits.
pub struct WordSource {
    provider: Box<dyn WordListProvider>,
    vocabulary: OnceLock<Vocabulary>,
}

impl WordSource {
    pub fn new(provider: impl WordListProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            vocabulary: OnceLock::new(),
        }
    }

    pub fn from_words(words: &[&str]) -> Self {
        Self::new(StaticWordList::new(words))
    }

    pub fn is_loaded(&self) -> bool {
        self.vocabulary.get().is_some()
    }

    fn vocabulary(&self) -> &Vocabulary {
        self.vocabulary.get_or_init(|| {
            let raw = match self.provider.fetch() {
                Ok(words) => words,
                Err(e) => {
                    warn!("Failed to load word list, using fallback words: {:#}", e);
                    FALLBACK_WORDS.iter().map(|w| w.to_string()).collect()
                }
            };

            let vocabulary = Vocabulary::from_raw(raw);
            info!("Loaded {} playable words", vocabulary.words.len());
            vocabulary
        })
    }

    pub fn words(&self) -> &[String] {
        &self.vocabulary().words
    }

    pub fn random_word(&self) -> Result<String, GameError> {
        self.words()
            .choose(&mut rand::rng())
            .cloned()
            .ok_or(GameError::EmptyVocabulary)
    }

    /// Case-insensitive membership test
    pub fn is_valid_word(&self, candidate: &str) -> bool {
        self.vocabulary()
            .index
            .contains(&candidate.trim().to_uppercase())
    }

    pub fn summary(&self, sample_size: usize) -> VocabularySummary {
        let words = self.words();
        VocabularySummary {
            total_words: words.len(),
            sample: words.iter().take(sample_size).cloned().collect(),
        }
    }
}
