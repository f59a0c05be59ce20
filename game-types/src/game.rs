use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use ts_rs::TS;

pub type SessionId = u64;
pub type PlayerName = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum GameMode {
    Capture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Language {
    En,
    Fr,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Fr];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Length class of the words drawn for a round, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum WordLength {
    Short,
    Standard,
    Long,
}

impl WordLength {
    pub fn range(&self) -> RangeInclusive<usize> {
        match self {
            WordLength::Short => 3..=5,
            WordLength::Standard => 5..=8,
            WordLength::Long => 8..=12,
        }
    }
}

/// Cosmetic transformation of the displayed form of a word. Matching always
/// uses the untouched label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum WordEffect {
    /// "history" stays "history"
    None,
    /// one letter masked, "history" becomes "hist_ry"
    Hidden,
    /// "history" becomes "yrotsih"
    Reverse,
    /// letters shuffled, "history" becomes "shyriot"
    Anagram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SessionPhase {
    Lobby,
    Countdown,
    Playing,
    RoundOver,
    GameOver,
    Aborted,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lobby => "lobby",
            Self::Countdown => "countdown",
            Self::Playing => "playing",
            Self::RoundOver => "round_over",
            Self::GameOver => "game_over",
            Self::Aborted => "aborted",
        }
    }

    /// No further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::GameOver | Self::Aborted)
    }

    /// Participants are fixed and the game is under way.
    pub fn is_started(&self) -> bool {
        !matches!(self, Self::Lobby)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lobby-visible description of a declared game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameDescriptor {
    pub id: SessionId,
    pub creator: PlayerName,
    pub mode: GameMode,
    pub rounds: u32,
    pub language: Language,
    pub words_per_player: u32,
    pub word_length: WordLength,
    pub word_effect: WordEffect,
    pub players: Vec<PlayerName>,
}

/// One word of the round pool as shown to players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WordView {
    pub label: String,
    pub display: String,
    pub claimant: Option<PlayerName>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoundScore {
    pub player: PlayerName,
    pub points: u32,
    pub words_per_min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameScore {
    pub player: PlayerName,
    pub victories: u32,
    pub best_words_per_min: f64,
}
