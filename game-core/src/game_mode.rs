use game_types::{
    GameError, GameMode as GameModeKind, Language, PlayerName, WordEffect, WordLength, WordView,
};
use rand::RngCore;

use crate::PlayerScore;

/// Round parameters handed to a mode when it seeds its pool.
#[derive(Debug, Clone)]
pub struct RoundSetup<'a> {
    pub round: u32,
    pub language: Language,
    pub word_length: WordLength,
    pub word_effect: WordEffect,
    pub words_per_player: u32,
    pub participants: &'a [PlayerName],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimEffect {
    /// Unknown or already claimed word, nothing changed
    Ignored,
    Claimed,
    /// The claim took the last available word
    RoundComplete,
}

/// Mode-specific rules driven by the session state machine.
///
/// Every method runs inside the session's exclusive region, so
/// implementations mutate freely through `&mut self`.
pub trait GameMode: Send {
    fn kind(&self) -> GameModeKind;

    /// Prepare the pool of a new round.
    fn seed_round(
        &mut self,
        setup: &RoundSetup<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<(), GameError>;

    fn handle_claim(
        &mut self,
        player: &str,
        label: &str,
        scores: &mut [PlayerScore],
    ) -> ClaimEffect;

    fn is_round_over(&self) -> bool;

    /// Current ownership view of the pool.
    fn words(&self) -> Vec<WordView>;

    fn is_game_over(&self, round: u32, rounds: u32) -> bool {
        round >= rounds
    }
}

impl<M: GameMode + ?Sized> GameMode for Box<M> {
    fn kind(&self) -> GameModeKind {
        (**self).kind()
    }

    fn seed_round(
        &mut self,
        setup: &RoundSetup<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<(), GameError> {
        (**self).seed_round(setup, rng)
    }

    fn handle_claim(
        &mut self,
        player: &str,
        label: &str,
        scores: &mut [PlayerScore],
    ) -> ClaimEffect {
        (**self).handle_claim(player, label, scores)
    }

    fn is_round_over(&self) -> bool {
        (**self).is_round_over()
    }

    fn words(&self) -> Vec<WordView> {
        (**self).words()
    }

    fn is_game_over(&self, round: u32, rounds: u32) -> bool {
        (**self).is_game_over(round, rounds)
    }
}
