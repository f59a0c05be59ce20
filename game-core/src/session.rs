use chrono::{DateTime, Utc};
use game_types::{
    GameDescriptor, GameError, Language, PlayerName, SessionId, SessionPhase, WordEffect,
    WordLength, WordView,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

use crate::{ClaimEffect, GameMode, PlayerScore, RoundSetup, ScoreLedger, SessionEvent};

/// Settings chosen by the creator when declaring a game.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub creator: PlayerName,
    pub rounds: u32,
    pub language: Language,
    pub words_per_player: u32,
    pub word_length: WordLength,
    pub word_effect: WordEffect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    StillPlaying,
    RoundOver,
    GameOver,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClaimResult {
    /// The claim took a word
    pub accepted: bool,
    pub outcome: RoundOutcome,
    /// Snapshot to broadcast, absent when nothing changed
    pub event: Option<SessionEvent>,
}

/// One running game, from lobby to game over.
///
/// A session is not synchronised by itself: the host keeps each one behind
/// its own lock, and every method here is a short critical section.
pub struct Session<M: GameMode> {
    descriptor: GameDescriptor,
    phase: SessionPhase,
    /// 1-based, 0 until the first countdown
    round: u32,
    round_start: Option<DateTime<Utc>>,
    scores: Vec<PlayerScore>,
    mode: M,
    rng: StdRng,
    last_activity: SystemTime,
}

impl<M: GameMode> Session<M> {
    pub fn new(id: SessionId, settings: SessionSettings, mode: M) -> Result<Self, GameError> {
        let creator = validate_name(&settings.creator)?;
        if settings.rounds == 0 {
            return Err(GameError::InvalidSettings {
                reason: "a game needs at least one round".to_string(),
            });
        }
        if settings.words_per_player == 0 {
            return Err(GameError::InvalidSettings {
                reason: "each player needs at least one word".to_string(),
            });
        }

        let descriptor = GameDescriptor {
            id,
            creator: creator.clone(),
            mode: mode.kind(),
            rounds: settings.rounds,
            language: settings.language,
            words_per_player: settings.words_per_player,
            word_length: settings.word_length,
            word_effect: settings.word_effect,
            players: vec![creator],
        };

        Ok(Self {
            descriptor,
            phase: SessionPhase::Lobby,
            round: 0,
            round_start: None,
            scores: Vec::new(),
            mode,
            rng: StdRng::from_entropy(),
            last_activity: SystemTime::now(),
        })
    }

    /// Use a fixed random seed for word selection and effects.
    pub fn seeded(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn join(&mut self, name: &str) -> Result<(), GameError> {
        self.ensure_lobby()?;
        let name = validate_name(name)?;
        if self.descriptor.players.contains(&name) {
            return Err(GameError::UsedName { name });
        }

        debug!("Player {} joined game {}", name, self.descriptor.id);
        self.descriptor.players.push(name);
        self.touch();
        Ok(())
    }

    pub fn leave(&mut self, name: &str) -> Result<(), GameError> {
        self.ensure_lobby()?;
        let position = self
            .descriptor
            .players
            .iter()
            .position(|p| p == name)
            .ok_or(GameError::NotInSession)?;

        self.descriptor.players.remove(position);
        self.touch();
        Ok(())
    }

    /// Enter `Countdown`, either from the lobby (fixing the participant
    /// list) or from the end of a round that is not the last one.
    pub fn begin_countdown(&mut self, min_players: usize) -> Result<SessionEvent, GameError> {
        match self.phase {
            SessionPhase::Lobby => {
                let actual = self.descriptor.players.len();
                if actual < min_players.max(1) {
                    return Err(GameError::NotEnoughPlayers {
                        required: min_players.max(1),
                        actual,
                    });
                }
                self.scores = self
                    .descriptor
                    .players
                    .iter()
                    .map(|p| PlayerScore::new(p.as_str()))
                    .collect();
                self.round = 1;
            }
            SessionPhase::RoundOver => {
                self.round += 1;
                for score in &mut self.scores {
                    score.reset_round();
                }
            }
            _ => return Err(self.invalid_transition("start a countdown")),
        }

        self.set_phase(SessionPhase::Countdown);
        Ok(SessionEvent::CountdownStarted {
            game_id: self.descriptor.id,
            round: self.round,
            rounds: self.descriptor.rounds,
        })
    }

    /// Countdown expired: seed the round and open play.
    ///
    /// A pool that cannot be seeded aborts the session.
    pub fn start_play(&mut self) -> Result<SessionEvent, GameError> {
        if self.phase != SessionPhase::Countdown {
            return Err(self.invalid_transition("start playing"));
        }

        let setup = RoundSetup {
            round: self.round,
            language: self.descriptor.language,
            word_length: self.descriptor.word_length,
            word_effect: self.descriptor.word_effect,
            words_per_player: self.descriptor.words_per_player,
            participants: &self.descriptor.players,
        };
        if let Err(e) = self.mode.seed_round(&setup, &mut self.rng) {
            warn!("Aborting game {}: {}", self.descriptor.id, e);
            self.set_phase(SessionPhase::Aborted);
            return Err(e);
        }

        self.round_start = Some(Utc::now());
        self.set_phase(SessionPhase::Playing);
        Ok(SessionEvent::RoundStarted {
            words: self.mode.words(),
        })
    }

    /// Attempt to take `label` for `player`. Claims outside `Playing`, from
    /// non-participants, or on unknown or taken words change nothing.
    pub fn claim(&mut self, player: &str, label: &str) -> ClaimResult {
        if self.phase != SessionPhase::Playing || !self.is_participant(player) {
            return self.ignored();
        }

        match self.mode.handle_claim(player, label, &mut self.scores) {
            ClaimEffect::Ignored => self.ignored(),
            ClaimEffect::Claimed => {
                self.touch();
                ClaimResult {
                    accepted: true,
                    outcome: RoundOutcome::StillPlaying,
                    event: Some(SessionEvent::WordsUpdated {
                        words: self.mode.words(),
                    }),
                }
            }
            ClaimEffect::RoundComplete => {
                let event = self.finish_round(Utc::now());
                ClaimResult {
                    accepted: true,
                    outcome: self.outcome(),
                    event: Some(event),
                }
            }
        }
    }

    /// Stop the session from any non-terminal state.
    pub fn abort(&mut self, reason: &str) -> Option<SessionEvent> {
        if self.phase.is_terminal() {
            return None;
        }

        info!("Game {} aborted: {}", self.descriptor.id, reason);
        self.set_phase(SessionPhase::Aborted);
        Some(SessionEvent::Aborted {
            reason: reason.to_string(),
        })
    }

    fn finish_round(&mut self, now: DateTime<Utc>) -> SessionEvent {
        let round_start = self.round_start.unwrap_or(now);
        let rankings = ScoreLedger::update_after_round(&mut self.scores, round_start, now);
        let game_over = self.mode.is_game_over(self.round, self.descriptor.rounds);

        self.set_phase(if game_over {
            SessionPhase::GameOver
        } else {
            SessionPhase::RoundOver
        });

        if let Some(winner) = rankings.by_round.first() {
            info!(
                "Round {}/{} of game {} won by {}",
                self.round, self.descriptor.rounds, self.descriptor.id, winner.player
            );
        }

        SessionEvent::RoundEnded {
            words: self.mode.words(),
            round_scores: rankings.by_round.iter().map(PlayerScore::round_view).collect(),
            game_scores: rankings.by_game.iter().map(PlayerScore::game_view).collect(),
            manager: self.descriptor.creator.clone(),
            game_over,
        }
    }

    fn ignored(&self) -> ClaimResult {
        ClaimResult {
            accepted: false,
            outcome: self.outcome(),
            event: None,
        }
    }

    pub fn outcome(&self) -> RoundOutcome {
        match self.phase {
            SessionPhase::GameOver => RoundOutcome::GameOver,
            SessionPhase::RoundOver => RoundOutcome::RoundOver,
            _ => RoundOutcome::StillPlaying,
        }
    }

    fn ensure_lobby(&self) -> Result<(), GameError> {
        if self.phase == SessionPhase::Lobby {
            Ok(())
        } else {
            Err(GameError::SessionNotInLobby {
                current_state: self.phase.to_string(),
            })
        }
    }

    fn invalid_transition(&self, action: &str) -> GameError {
        GameError::InvalidTransition {
            action: action.to_string(),
            current_state: self.phase.to_string(),
        }
    }

    fn set_phase(&mut self, phase: SessionPhase) {
        debug!("Game {}: {} -> {}", self.descriptor.id, self.phase, phase);
        self.phase = phase;
        self.touch();
    }

    fn touch(&mut self) {
        self.last_activity = SystemTime::now();
    }

    pub fn id(&self) -> SessionId {
        self.descriptor.id
    }

    pub fn descriptor(&self) -> &GameDescriptor {
        &self.descriptor
    }

    pub fn creator(&self) -> &str {
        &self.descriptor.creator
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn participants(&self) -> &[PlayerName] {
        &self.descriptor.players
    }

    pub fn is_participant(&self, player: &str) -> bool {
        self.descriptor.players.iter().any(|p| p == player)
    }

    pub fn scores(&self) -> &[PlayerScore] {
        &self.scores
    }

    pub fn score(&self, player: &str) -> Option<&PlayerScore> {
        self.scores.iter().find(|s| s.player == player)
    }

    pub fn words(&self) -> Vec<WordView> {
        self.mode.words()
    }

    pub fn mode(&self) -> &M {
        &self.mode
    }

    pub fn round_ranking(&self) -> Vec<PlayerScore> {
        ScoreLedger::rank_round(&self.scores)
    }

    pub fn game_ranking(&self) -> Vec<PlayerScore> {
        ScoreLedger::rank_game(&self.scores)
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed().unwrap_or(Duration::ZERO)
    }

    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.idle_for() > timeout
    }
}

/// Names are trimmed; blank names are rejected.
pub fn validate_name(name: &str) -> Result<PlayerName, GameError> {
    let name = name.trim();
    if name.is_empty() {
        Err(GameError::IncorrectName)
    } else {
        Ok(name.to_string())
    }
}
