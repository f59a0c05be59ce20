use game_types::SessionPhase;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownReason {
    /// Declared but never started
    StaleLobby,
    /// Running but nobody has acted for too long
    Inactive,
    /// Game over or aborted, kept long enough for late readers
    Finished,
}

pub struct SessionCleanup {
    pub lobby_timeout: Duration,       // 30 minutes without activity
    pub finished_retention: Duration,  // 5 minutes after game over
}

impl Default for SessionCleanup {
    fn default() -> Self {
        Self {
            lobby_timeout: Duration::from_secs(1800),
            finished_retention: Duration::from_secs(300),
        }
    }
}

impl SessionCleanup {
    pub fn new(lobby_timeout: Duration, finished_retention: Duration) -> Self {
        Self {
            lobby_timeout,
            finished_retention,
        }
    }

    /// Decide whether a session in `phase`, idle for `idle`, should be torn down
    pub fn teardown_reason(&self, phase: SessionPhase, idle: Duration) -> Option<TeardownReason> {
        match phase {
            SessionPhase::GameOver | SessionPhase::Aborted if idle > self.finished_retention => {
                Some(TeardownReason::Finished)
            }
            SessionPhase::Lobby if idle > self.lobby_timeout => Some(TeardownReason::StaleLobby),
            SessionPhase::Countdown | SessionPhase::Playing | SessionPhase::RoundOver
                if idle > self.lobby_timeout =>
            {
                Some(TeardownReason::Inactive)
            }
            _ => None,
        }
    }
}
