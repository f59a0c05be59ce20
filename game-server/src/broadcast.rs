use game_types::{PlayerName, ServerMessage};

/// Delivers messages to the live connections of players.
///
/// Delivery is best-effort: a player without a live connection is skipped
/// and never prevents delivery to the others.
pub trait BroadcastGateway: Send + Sync {
    fn send(&self, recipients: &[PlayerName], message: &ServerMessage);

    /// Names of every player with a live connection
    fn connected_players(&self) -> Vec<PlayerName>;
}
