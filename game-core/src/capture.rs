use game_types::{GameError, GameMode as GameModeKind, PlayerName, WordView};
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::effects::display_form;
use crate::{ClaimEffect, GameMode, PlayerScore, RoundSetup, WordSelector, WordSource};

/// One word of the shared pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub label: String,
    pub display: String,
    /// Set once, by the first successful claim of the round
    pub claimant: Option<PlayerName>,
}

impl Word {
    pub fn new(label: String, display: String) -> Self {
        Self {
            label,
            display,
            claimant: None,
        }
    }

    fn view(&self) -> WordView {
        WordView {
            label: self.label.clone(),
            display: self.display.clone(),
            claimant: self.claimant.clone(),
        }
    }
}

/// Players race to type words from a shared pool; each word goes to the
/// first player who types it. The round ends when no word is left.
pub struct CaptureMode {
    source: Arc<dyn WordSource>,
    /// Words by label, used to keep track of who captured what
    words: HashMap<String, Word>,
    /// Selection order, so views are stable across broadcasts
    order: Vec<String>,
    available: usize,
}

impl CaptureMode {
    pub fn new(source: Arc<dyn WordSource>) -> Self {
        Self {
            source,
            words: HashMap::new(),
            order: Vec::new(),
            available: 0,
        }
    }

    pub fn available_words(&self) -> usize {
        self.available
    }

    pub fn word(&self, label: &str) -> Option<&Word> {
        self.words.get(label)
    }
}

impl GameMode for CaptureMode {
    fn kind(&self) -> GameModeKind {
        GameModeKind::Capture
    }

    fn seed_round(
        &mut self,
        setup: &RoundSetup<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<(), GameError> {
        let count = setup.words_per_player as usize * setup.participants.len();
        let labels = WordSelector::select(
            self.source.as_ref(),
            setup.language,
            count,
            setup.word_length.range(),
            rng,
        )?;

        self.words.clear();
        self.order.clear();
        for label in labels {
            let display = display_form(setup.word_effect, &label, rng);
            self.order.push(label.clone());
            self.words.insert(label.clone(), Word::new(label, display));
        }
        self.available = self.words.len();

        debug!("Round {} seeded with {} words", setup.round, self.available);
        Ok(())
    }

    fn handle_claim(
        &mut self,
        player: &str,
        label: &str,
        scores: &mut [PlayerScore],
    ) -> ClaimEffect {
        if self.is_round_over() {
            return ClaimEffect::Ignored;
        }

        // Ensure that the word exists and is still available
        let Some(word) = self.words.get_mut(label) else {
            return ClaimEffect::Ignored;
        };
        if word.claimant.is_some() {
            return ClaimEffect::Ignored;
        }

        word.claimant = Some(player.to_string());
        if let Some(score) = scores.iter_mut().find(|s| s.player == player) {
            score.increment_points();
        }
        self.available -= 1;

        if self.is_round_over() {
            ClaimEffect::RoundComplete
        } else {
            ClaimEffect::Claimed
        }
    }

    fn is_round_over(&self) -> bool {
        self.available == 0
    }

    fn words(&self) -> Vec<WordView> {
        self.order
            .iter()
            .filter_map(|label| self.words.get(label))
            .map(Word::view)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dictionary;
    use game_types::{Language, WordEffect, WordLength};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn seeded_mode(participants: &[PlayerName], words_per_player: u32) -> CaptureMode {
        let dictionary = Dictionary::from_word_list(
            Language::En,
            "apple\nbread\nchair\ndance\neagle\nflame\ngrape\nhouse\nirony\njelly",
        );
        let mut mode = CaptureMode::new(Arc::new(dictionary));
        let setup = RoundSetup {
            round: 1,
            language: Language::En,
            word_length: WordLength::Standard,
            word_effect: WordEffect::Reverse,
            words_per_player,
            participants,
        };
        mode.seed_round(&setup, &mut StdRng::seed_from_u64(11)).unwrap();
        mode
    }

    fn players() -> Vec<PlayerName> {
        vec!["alice".to_string(), "bob".to_string()]
    }

    fn scores() -> Vec<PlayerScore> {
        players().into_iter().map(PlayerScore::new).collect()
    }

    #[test]
    fn test_pool_scales_with_participants() {
        let mode = seeded_mode(&players(), 3);
        assert_eq!(mode.available_words(), 6);
        assert_eq!(mode.words().len(), 6);

        for word in mode.words() {
            assert!(word.claimant.is_none());
            assert_eq!(word.display, word.label.chars().rev().collect::<String>());
        }
    }

    #[test]
    fn test_claim_is_exclusive() {
        let mut mode = seeded_mode(&players(), 2);
        let mut scores = scores();
        let label = mode.words()[0].label.clone();

        assert_eq!(mode.handle_claim("alice", &label, &mut scores), ClaimEffect::Claimed);
        assert_eq!(mode.handle_claim("bob", &label, &mut scores), ClaimEffect::Ignored);

        assert_eq!(mode.word(&label).unwrap().claimant.as_deref(), Some("alice"));
        assert_eq!(scores[0].points, 1);
        assert_eq!(scores[1].points, 0);
        assert_eq!(mode.available_words(), 3);
    }

    #[test]
    fn test_unknown_label_ignored() {
        let mut mode = seeded_mode(&players(), 1);
        let mut scores = scores();

        assert_eq!(mode.handle_claim("alice", "zzzzz", &mut scores), ClaimEffect::Ignored);
        assert_eq!(mode.available_words(), 2);
        assert_eq!(scores[0].points, 0);
    }

    #[test]
    fn test_last_claim_completes_round_once() {
        let mut mode = seeded_mode(&players(), 1);
        let mut scores = scores();
        let labels: Vec<String> = mode.words().into_iter().map(|w| w.label).collect();

        assert_eq!(mode.handle_claim("alice", &labels[0], &mut scores), ClaimEffect::Claimed);
        assert_eq!(mode.handle_claim("bob", &labels[1], &mut scores), ClaimEffect::RoundComplete);
        assert!(mode.is_round_over());

        // Replays after the end change nothing
        assert_eq!(mode.handle_claim("bob", &labels[1], &mut scores), ClaimEffect::Ignored);
        assert_eq!(scores[1].points, 1);
    }

    #[test]
    fn test_reseed_clears_previous_round() {
        let mut mode = seeded_mode(&players(), 1);
        let mut scores = scores();
        for word in mode.words() {
            mode.handle_claim("alice", &word.label, &mut scores);
        }
        assert!(mode.is_round_over());

        let participants = players();
        let setup = RoundSetup {
            round: 2,
            language: Language::En,
            word_length: WordLength::Standard,
            word_effect: WordEffect::None,
            words_per_player: 2,
            participants: &participants,
        };
        mode.seed_round(&setup, &mut StdRng::seed_from_u64(12)).unwrap();

        assert_eq!(mode.available_words(), 4);
        assert!(mode.words().iter().all(|w| w.claimant.is_none()));
    }

    #[test]
    fn test_seed_failure_reports_insufficient_words() {
        let dictionary = Dictionary::from_word_list(Language::En, "apple\nbread");
        let mut mode = CaptureMode::new(Arc::new(dictionary));
        let participants = players();
        let setup = RoundSetup {
            round: 1,
            language: Language::En,
            word_length: WordLength::Standard,
            word_effect: WordEffect::None,
            words_per_player: 2,
            participants: &participants,
        };

        let result = mode.seed_round(&setup, &mut StdRng::seed_from_u64(0));
        assert!(matches!(result, Err(GameError::InsufficientWords { requested: 4, available: 2 })));
    }
}
