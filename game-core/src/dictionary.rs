use anyhow::{Result, anyhow};
use game_types::Language;
use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::{debug, info, warn};

/// Supplies candidate words per language.
pub trait WordSource: Send + Sync {
    /// Every known word of `language` whose character count lies in `lengths`.
    fn words_of_length(&self, language: Language, lengths: RangeInclusive<usize>) -> Vec<&str>;

    fn is_available(&self, language: Language) -> bool;
}

/// In-memory word lists, loaded once per language at startup.
#[derive(Debug, Default)]
pub struct Dictionary {
    words_by_language: HashMap<Language, Vec<String>>,
}

impl Dictionary {
    /// Create a dictionary holding a single language
    pub fn from_word_list(language: Language, word_list: &str) -> Self {
        Self::default().with_word_list(language, word_list)
    }

    /// Add (or replace) the words of one language
    pub fn with_word_list(mut self, language: Language, word_list: &str) -> Self {
        let words = parse_word_list(word_list);
        debug!("Parsed {} '{}' words", words.len(), language);
        self.words_by_language.insert(language, words);
        self
    }

    /// Load `words-<code>.txt` for every language from a directory.
    ///
    /// A missing or unreadable file only disables that language. Fails when
    /// no language could be loaded at all.
    pub fn load_directory<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut dictionary = Self::default();

        for language in Language::ALL {
            let path = dir.join(format!("words-{}.txt", language.code()));
            match std::fs::read_to_string(&path) {
                Ok(contents) => {
                    dictionary = dictionary.with_word_list(language, &contents);
                    info!(
                        "Loaded {} '{}' words from {}",
                        dictionary.word_count(language),
                        language,
                        path.display()
                    );
                }
                Err(e) => {
                    warn!(
                        "Language '{}' unavailable, cannot read {}: {}",
                        language,
                        path.display(),
                        e
                    );
                }
            }
        }

        if dictionary.words_by_language.is_empty() {
            return Err(anyhow!("No word list could be loaded from {}", dir.display()));
        }

        Ok(dictionary)
    }

    pub fn word_count(&self, language: Language) -> usize {
        self.words_by_language
            .get(&language)
            .map_or(0, |words| words.len())
    }

    pub fn languages(&self) -> Vec<Language> {
        Language::ALL
            .into_iter()
            .filter(|language| self.words_by_language.contains_key(language))
            .collect()
    }
}

impl WordSource for Dictionary {
    fn words_of_length(&self, language: Language, lengths: RangeInclusive<usize>) -> Vec<&str> {
        self.words_by_language
            .get(&language)
            .map(|words| {
                words
                    .iter()
                    .filter(|word| lengths.contains(&word.chars().count()))
                    .map(String::as_str)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn is_available(&self, language: Language) -> bool {
        self.words_by_language.contains_key(&language)
    }
}

fn parse_word_list(word_list: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    word_list
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_lowercase)
        .filter(|word| seen.insert(word.clone()))
        .collect()
}
