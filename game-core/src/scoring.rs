use chrono::{DateTime, Utc};
use game_types::{GameScore, PlayerName, RoundScore};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Running statistics of one participant, kept for the whole session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub player: PlayerName,
    /// Words claimed in the current round
    pub points: u32,
    /// Throughput of the last completed round
    pub words_per_min: f64,
    /// Rounds won so far
    pub victories: u32,
    pub best_words_per_min: f64,
    pub latest_victory: Option<DateTime<Utc>>,
}

impl PlayerScore {
    pub fn new(player: impl Into<PlayerName>) -> Self {
        Self {
            player: player.into(),
            points: 0,
            words_per_min: 0.0,
            victories: 0,
            best_words_per_min: 0.0,
            latest_victory: None,
        }
    }

    pub fn increment_points(&mut self) {
        self.points += 1;
    }

    /// Throughput of the round that started at `round_start` and ended at `now`
    pub fn update_words_per_min(&mut self, round_start: DateTime<Utc>, now: DateTime<Utc>) {
        let elapsed_ms = (now - round_start).num_milliseconds().max(1) as f64;
        self.words_per_min = f64::from(self.points) * 60_000.0 / elapsed_ms;
        self.best_words_per_min = self.best_words_per_min.max(self.words_per_min);
    }

    pub fn record_victory(&mut self, at: DateTime<Utc>) {
        self.victories += 1;
        self.latest_victory = Some(at);
    }

    pub fn reset_round(&mut self) {
        self.points = 0;
        self.words_per_min = 0.0;
    }

    pub fn round_view(&self) -> RoundScore {
        RoundScore {
            player: self.player.clone(),
            points: self.points,
            words_per_min: self.words_per_min,
        }
    }

    pub fn game_view(&self) -> GameScore {
        GameScore {
            player: self.player.clone(),
            victories: self.victories,
            best_words_per_min: self.best_words_per_min,
        }
    }
}

/// Round and game orderings computed at a round boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Rankings {
    pub by_round: Vec<PlayerScore>,
    pub by_game: Vec<PlayerScore>,
}

pub struct ScoreLedger;

impl ScoreLedger {
    /// Close a round: compute throughput, credit the round winner and rank
    /// everybody for the round and for the game.
    pub fn update_after_round(
        scores: &mut [PlayerScore],
        round_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Rankings {
        for score in scores.iter_mut() {
            score.update_words_per_min(round_start, now);
        }

        let winner = scores
            .iter()
            .min_by(|a, b| Self::compare_round(a, b))
            .map(|score| score.player.clone());

        if let Some(winner) = winner {
            if let Some(score) = scores.iter_mut().find(|s| s.player == winner) {
                score.record_victory(now);
            }
        }

        Rankings {
            by_round: Self::rank_round(scores),
            by_game: Self::rank_game(scores),
        }
    }

    /// Most points first, then higher throughput, then player name.
    pub fn compare_round(a: &PlayerScore, b: &PlayerScore) -> Ordering {
        b.points
            .cmp(&a.points)
            .then_with(|| b.words_per_min.total_cmp(&a.words_per_min))
            .then_with(|| a.player.cmp(&b.player))
    }

    /// Most round wins first, then best throughput, then whoever reached
    /// their record earliest, then player name.
    pub fn compare_game(a: &PlayerScore, b: &PlayerScore) -> Ordering {
        b.victories
            .cmp(&a.victories)
            .then_with(|| b.best_words_per_min.total_cmp(&a.best_words_per_min))
            .then_with(|| match (a.latest_victory, b.latest_victory) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| a.player.cmp(&b.player))
    }

    pub fn rank_round(scores: &[PlayerScore]) -> Vec<PlayerScore> {
        let mut ranked = scores.to_vec();
        ranked.sort_by(Self::compare_round);
        ranked
    }

    pub fn rank_game(scores: &[PlayerScore]) -> Vec<PlayerScore> {
        let mut ranked = scores.to_vec();
        ranked.sort_by(Self::compare_game);
        ranked
    }
}
