use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use game_core::validate_name;
use game_types::{GameError, PlayerName, ServerMessage};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::broadcast::BroadcastGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub name: Option<PlayerName>,
    pub connected_at: Instant,
    pub last_activity: Instant,
    pub sender: mpsc::UnboundedSender<ServerMessage>,
}

impl Connection {
    pub fn new(id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let now = Instant::now();

        let connection = Self {
            id,
            name: None,
            connected_at: now,
            last_activity: now,
            sender,
        };

        (connection, receiver)
    }

    pub fn update_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .map_err(|_| "Connection closed".to_string())
    }

    pub fn is_inactive(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }
}

/// Live websocket connections and the player name each one registered.
#[derive(Default)]
pub struct ConnectionManager {
    connections: DashMap<ConnectionId, Connection>,
    name_to_connection: DashMap<PlayerName, ConnectionId>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_connection(&self, id: ConnectionId) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (conn, receiver) = Connection::new(id);
        self.connections.insert(id, conn);
        receiver
    }

    /// Drop a connection, returning the name it had registered
    pub fn remove_connection(&self, id: ConnectionId) -> Option<PlayerName> {
        let name = self
            .connections
            .remove(&id)
            .and_then(|(_, conn)| conn.name)?;
        self.name_to_connection.remove_if(&name, |_, conn_id| *conn_id == id);
        Some(name)
    }

    pub fn get_connection(&self, id: ConnectionId) -> Option<Connection> {
        self.connections.get(&id).map(|conn| conn.clone())
    }

    pub fn player_name(&self, id: ConnectionId) -> Option<PlayerName> {
        self.connections.get(&id).and_then(|conn| conn.name.clone())
    }

    /// Bind a player name to a connection. Names are unique among live
    /// connections and cannot be changed once set.
    pub fn register_name(&self, id: ConnectionId, name: &str) -> Result<PlayerName, GameError> {
        let name = validate_name(name)?;

        match self.player_name(id) {
            Some(current) if current == name => return Ok(name),
            Some(current) => return Err(GameError::UsedName { name: current }),
            None => {}
        }
        if !self.connections.contains_key(&id) {
            return Err(GameError::NotInSession);
        }

        match self.name_to_connection.entry(name.clone()) {
            Entry::Occupied(_) => return Err(GameError::UsedName { name }),
            Entry::Vacant(entry) => {
                entry.insert(id);
            }
        }

        if let Some(mut connection) = self.connections.get_mut(&id) {
            connection.name = Some(name.clone());
        }
        Ok(name)
    }

    pub fn update_activity(&self, id: ConnectionId) {
        if let Some(mut connection) = self.connections.get_mut(&id) {
            connection.update_activity();
        }
    }

    pub fn send_to_connection(
        &self,
        id: ConnectionId,
        message: ServerMessage,
    ) -> Result<(), String> {
        match self.connections.get(&id) {
            Some(connection) => connection.send_message(message),
            None => Err("Connection not found".to_string()),
        }
    }

    pub fn send_to_player(&self, name: &str, message: ServerMessage) -> Result<(), String> {
        let connection_id = self
            .name_to_connection
            .get(name)
            .map(|id| *id)
            .ok_or_else(|| "Player not connected".to_string())?;
        self.send_to_connection(connection_id, message)
    }

    pub fn inactive_connections(&self, timeout: Duration) -> Vec<ConnectionId> {
        self.connections
            .iter()
            .filter(|conn| conn.is_inactive(timeout))
            .map(|conn| conn.id)
            .collect()
    }

    // Test helper methods
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn named_connection_count(&self) -> usize {
        self.name_to_connection.len()
    }
}

impl BroadcastGateway for ConnectionManager {
    fn send(&self, recipients: &[PlayerName], message: &ServerMessage) {
        for name in recipients {
            if let Err(e) = self.send_to_player(name, message.clone()) {
                debug!("Skipping delivery to {}: {}", name, e);
            }
        }
    }

    fn connected_players(&self) -> Vec<PlayerName> {
        self.name_to_connection
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_creation_and_removal() {
        let manager = ConnectionManager::new();
        let conn_id = ConnectionId::new();

        let _receiver = manager.create_connection(conn_id);
        assert_eq!(manager.connection_count(), 1);

        manager.remove_connection(conn_id);
        assert_eq!(manager.connection_count(), 0);
    }

    #[test]
    fn test_name_registration_rules() {
        let manager = ConnectionManager::new();
        let conn_id1 = ConnectionId::new();
        let conn_id2 = ConnectionId::new();
        let _receiver1 = manager.create_connection(conn_id1);
        let _receiver2 = manager.create_connection(conn_id2);

        assert_eq!(manager.register_name(conn_id1, "   "), Err(GameError::IncorrectName));
        assert_eq!(manager.register_name(conn_id1, " alice ").unwrap(), "alice");
        assert_eq!(
            manager.register_name(conn_id2, "alice"),
            Err(GameError::UsedName {
                name: "alice".to_string()
            })
        );
        // Re-sending the same name is harmless
        assert!(manager.register_name(conn_id1, "alice").is_ok());
        assert_eq!(manager.named_connection_count(), 1);
    }

    #[test]
    fn test_name_released_on_disconnect() {
        let manager = ConnectionManager::new();
        let conn_id = ConnectionId::new();
        let _receiver = manager.create_connection(conn_id);
        manager.register_name(conn_id, "alice").unwrap();

        assert_eq!(manager.remove_connection(conn_id), Some("alice".to_string()));
        assert_eq!(manager.named_connection_count(), 0);

        let conn_id2 = ConnectionId::new();
        let _receiver2 = manager.create_connection(conn_id2);
        assert!(manager.register_name(conn_id2, "alice").is_ok());
    }

    #[test]
    fn test_message_sending_to_nonexistent_connection() {
        let manager = ConnectionManager::new();

        let result = manager.send_to_connection(
            ConnectionId::new(),
            ServerMessage::Error {
                message: "test".to_string(),
            },
        );

        assert_eq!(result.unwrap_err(), "Connection not found");
    }

    #[test]
    fn test_message_sending_after_connection_close() {
        let manager = ConnectionManager::new();
        let conn_id = ConnectionId::new();

        let receiver = manager.create_connection(conn_id);
        drop(receiver);

        let result = manager.send_to_connection(conn_id, ServerMessage::UsedName);
        assert_eq!(result.unwrap_err(), "Connection closed");
    }

    #[test]
    fn test_broadcast_skips_unreachable_players() {
        let manager = ConnectionManager::new();
        let alice = ConnectionId::new();
        let bob = ConnectionId::new();
        let carol = ConnectionId::new();

        let mut alice_rx = manager.create_connection(alice);
        let bob_rx = manager.create_connection(bob);
        let mut carol_rx = manager.create_connection(carol);
        manager.register_name(alice, "alice").unwrap();
        manager.register_name(bob, "bob").unwrap();
        manager.register_name(carol, "carol").unwrap();
        drop(bob_rx);

        let recipients: Vec<PlayerName> = ["alice", "bob", "ghost", "carol"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        manager.send(&recipients, &ServerMessage::UsedName);

        assert_eq!(alice_rx.try_recv().unwrap(), ServerMessage::UsedName);
        assert_eq!(carol_rx.try_recv().unwrap(), ServerMessage::UsedName);
    }

    #[tokio::test]
    async fn test_activity_tracking_and_timeout() {
        let manager = ConnectionManager::new();
        let conn_id = ConnectionId::new();
        let _receiver = manager.create_connection(conn_id);

        let short_timeout = Duration::from_millis(10);
        assert!(manager.inactive_connections(short_timeout).is_empty());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(manager.inactive_connections(short_timeout), vec![conn_id]);

        manager.update_activity(conn_id);
        assert!(manager.inactive_connections(short_timeout).is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_name_registration() {
        let manager = std::sync::Arc::new(ConnectionManager::new());
        let mut handles = Vec::new();

        for _ in 0..20 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                let conn_id = ConnectionId::new();
                let receiver = manager.create_connection(conn_id);
                let result = manager.register_name(conn_id, "popular");
                (result.is_ok(), receiver)
            }));
        }

        let mut winners = 0;
        let mut receivers = Vec::new();
        for handle in handles {
            let (won, receiver) = handle.await.unwrap();
            if won {
                winners += 1;
            }
            receivers.push(receiver);
        }
        assert_eq!(winners, 1);
    }
}
