use game_types::{GameScore, PlayerName, RoundScore, ServerMessage, SessionId, WordView};
use std::time::Duration;

/// Snapshot emitted by a session after a state change, to be delivered to
/// every participant.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    CountdownStarted {
        game_id: SessionId,
        round: u32,
        rounds: u32,
    },
    RoundStarted {
        words: Vec<WordView>,
    },
    WordsUpdated {
        words: Vec<WordView>,
    },
    RoundEnded {
        words: Vec<WordView>,
        round_scores: Vec<RoundScore>,
        game_scores: Vec<GameScore>,
        manager: PlayerName,
        game_over: bool,
    },
    Aborted {
        reason: String,
    },
}

impl SessionEvent {
    /// Wire form of the event. The countdown length is a host setting, so
    /// it is supplied here rather than carried by the session.
    pub fn into_message(self, countdown: Duration) -> ServerMessage {
        match self {
            SessionEvent::CountdownStarted {
                game_id,
                round,
                rounds,
            } => ServerMessage::CountdownStarted {
                game_id,
                round,
                rounds,
                seconds: countdown.as_secs(),
            },
            SessionEvent::RoundStarted { words } => ServerMessage::RoundStarted { words },
            SessionEvent::WordsUpdated { words } => ServerMessage::WordsUpdated { words },
            SessionEvent::RoundEnded {
                words,
                round_scores,
                game_scores,
                manager,
                game_over,
            } => ServerMessage::RoundEnded {
                words,
                round_scores,
                game_scores,
                manager,
                game_over,
            },
            SessionEvent::Aborted { reason } => ServerMessage::GameAborted { reason },
        }
    }

    pub fn is_round_end(&self) -> bool {
        matches!(self, SessionEvent::RoundEnded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_message_carries_duration() {
        let event = SessionEvent::CountdownStarted {
            game_id: 7,
            round: 2,
            rounds: 3,
        };
        assert_eq!(
            event.into_message(Duration::from_secs(5)),
            ServerMessage::CountdownStarted {
                game_id: 7,
                round: 2,
                rounds: 3,
                seconds: 5
            }
        );
    }

    #[test]
    fn test_abort_maps_to_game_aborted() {
        let event = SessionEvent::Aborted {
            reason: "All players disconnected".to_string(),
        };
        assert!(!event.is_round_end());
        assert!(matches!(
            event.into_message(Duration::ZERO),
            ServerMessage::GameAborted { reason } if reason == "All players disconnected"
        ));
    }
}
