use game_types::{GameError, Language};
use rand::RngCore;
use rand::seq::SliceRandom;
use std::ops::RangeInclusive;
use tracing::debug;

use crate::WordSource;

pub struct WordSelector;

impl WordSelector {
    /// Draw `count` distinct words where no word is a prefix of another.
    ///
    /// Candidates are visited in a random order and accepted greedily, which
    /// yields the same distribution as redrawing uniformly until a
    /// non-conflicting word comes up, but always terminates. A corpus that
    /// cannot satisfy the request is reported as `InsufficientWords`.
    pub fn select(
        source: &dyn WordSource,
        language: Language,
        count: usize,
        lengths: RangeInclusive<usize>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<String>, GameError> {
        if !source.is_available(language) {
            return Err(GameError::LanguageUnavailable {
                language: language.code().to_string(),
            });
        }

        let mut candidates = source.words_of_length(language, lengths);
        if candidates.len() < count {
            return Err(GameError::InsufficientWords {
                requested: count,
                available: candidates.len(),
            });
        }

        candidates.shuffle(rng);

        let mut selected: Vec<String> = Vec::with_capacity(count);
        for candidate in candidates {
            if selected.len() == count {
                break;
            }
            if !conflicts(&selected, candidate) {
                selected.push(candidate.to_string());
            }
        }

        if selected.len() < count {
            return Err(GameError::InsufficientWords {
                requested: count,
                available: selected.len(),
            });
        }

        debug!("Selected {} '{}' words", selected.len(), language);
        Ok(selected)
    }
}

/// A candidate conflicts when it prefixes, or is prefixed by, an accepted word.
fn conflicts(selected: &[String], candidate: &str) -> bool {
    selected
        .iter()
        .any(|word| word.starts_with(candidate) || candidate.starts_with(word.as_str()))
}
