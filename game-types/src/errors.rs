use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::SessionId;

/// Rejections reported synchronously to the caller. Session state is left
/// untouched whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, thiserror::Error)]
#[ts(export)]
pub enum GameError {
    #[error("Player name is empty or blank")]
    IncorrectName,
    #[error("Player name {name} is already in use")]
    UsedName { name: String },
    #[error("Game {game_id} not found")]
    SessionNotFound { game_id: SessionId },
    #[error("Game is no longer in the lobby (current state: {current_state})")]
    SessionNotInLobby { current_state: String },
    #[error("Only the game creator can do that")]
    NotSessionCreator,
    #[error("Need at least {required} players, have {actual}")]
    NotEnoughPlayers { required: usize, actual: usize },
    #[error("Game is full ({max} players)")]
    SessionFull { max: usize },
    #[error("Player {name} is already in game {game_id}")]
    AlreadyInSession { name: String, game_id: SessionId },
    #[error("Player is not in a game")]
    NotInSession,
    #[error("Invalid game settings: {reason}")]
    InvalidSettings { reason: String },
    #[error("Language {language} is not available")]
    LanguageUnavailable { language: String },
    #[error("Not enough distinct words: requested {requested}, available {available}")]
    InsufficientWords { requested: usize, available: usize },
    #[error("Cannot {action} while {current_state}")]
    InvalidTransition { action: String, current_state: String },
}
