use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{
    GameDescriptor, GameMode, GameScore, Language, PlayerName, RoundScore, SessionId, WordEffect,
    WordLength, WordView,
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClientMessage {
    Connect { name: String },
    DeclareGame {
        mode: GameMode,
        rounds: u32,
        language: Language,
        words_per_player: u32,
        word_length: WordLength,
        word_effect: WordEffect,
    },
    JoinGame { game_id: SessionId },
    LeaveGame,
    StartGame,
    ClaimWord { label: String },
    StartNextRound,
    Heartbeat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ServerMessage {
    Connected { name: PlayerName },
    IncorrectName,
    UsedName,
    GamesList { games: Vec<GameDescriptor> },
    CountdownStarted { game_id: SessionId, round: u32, rounds: u32, seconds: u64 },
    RoundStarted { words: Vec<WordView> },
    WordsUpdated { words: Vec<WordView> },
    RoundEnded {
        words: Vec<WordView>,
        round_scores: Vec<RoundScore>,
        game_scores: Vec<GameScore>,
        manager: PlayerName,
        game_over: bool,
    },
    GameAborted { reason: String },
    Error { message: String },
}
