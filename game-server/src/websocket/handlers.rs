use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::registry::SessionRegistry;
use crate::websocket::connection::{ConnectionId, ConnectionManager};
use game_core::SessionSettings;
use game_types::{ClientMessage, GameError, PlayerName, ServerMessage, SessionId};

#[derive(Clone)]
pub struct MessageHandler {
    connection_id: ConnectionId,
    connection_manager: Arc<ConnectionManager>,
    registry: Arc<SessionRegistry>,
}

impl MessageHandler {
    pub fn new(
        connection_id: ConnectionId,
        connection_manager: Arc<ConnectionManager>,
        registry: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            connection_id,
            connection_manager,
            registry,
        }
    }

    pub async fn handle_message(&self, message: ClientMessage) -> Result<(), String> {
        self.connection_manager.update_activity(self.connection_id);

        match message {
            ClientMessage::Connect { name } => self.handle_connect(&name),
            message => match self.connection_manager.player_name(self.connection_id) {
                Some(player) => self.handle_player_message(player, message).await,
                None => self.send_error("Connect with a name first"),
            },
        }
    }

    /// Release the player's name and tell the registry they are gone.
    pub async fn handle_disconnect(&self) {
        info!("Handling disconnect for connection {}", self.connection_id);

        if let Some(player) = self.connection_manager.remove_connection(self.connection_id) {
            self.registry.handle_disconnect(&player).await;
        }
    }

    async fn handle_player_message(
        &self,
        player: PlayerName,
        message: ClientMessage,
    ) -> Result<(), String> {
        match message {
            ClientMessage::Connect { .. } => Ok(()),
            ClientMessage::DeclareGame {
                mode,
                rounds,
                language,
                words_per_player,
                word_length,
                word_effect,
            } => {
                let settings = SessionSettings {
                    creator: player,
                    rounds,
                    language,
                    words_per_player,
                    word_length,
                    word_effect,
                };
                self.reply(self.registry.declare(mode, settings).map(|_| ()))
            }
            ClientMessage::JoinGame { game_id } => self.handle_join_game(&player, game_id).await,
            ClientMessage::LeaveGame => self.reply(self.registry.leave(&player).await),
            ClientMessage::StartGame => self.reply(self.registry.start(&player).await),
            ClientMessage::ClaimWord { label } => {
                // Late or unknown claims are expected while rounds change over
                let result = self.registry.claim(&player, &label).await;
                if !result.accepted {
                    debug!("Claim of {:?} by {} changed nothing", label, player);
                }
                Ok(())
            }
            ClientMessage::StartNextRound => self.reply(self.registry.next_round(&player).await),
            ClientMessage::Heartbeat => Ok(()),
        }
    }

    fn handle_connect(&self, name: &str) -> Result<(), String> {
        match self.connection_manager.register_name(self.connection_id, name) {
            Ok(name) => {
                info!("Connection {} registered as {}", self.connection_id, name);
                self.send_message(ServerMessage::Connected { name: name.clone() })?;
                self.registry.send_lobby_to(&name);
                Ok(())
            }
            Err(GameError::IncorrectName) => self.send_message(ServerMessage::IncorrectName),
            Err(GameError::UsedName { name }) => {
                warn!("Connection {} asked for taken name {}", self.connection_id, name);
                self.send_message(ServerMessage::UsedName)
            }
            Err(e) => self.send_error(&e.to_string()),
        }
    }

    async fn handle_join_game(&self, player: &str, game_id: SessionId) -> Result<(), String> {
        match self.registry.join(game_id, player).await {
            Err(GameError::UsedName { .. }) => self.send_message(ServerMessage::UsedName),
            result => self.reply(result),
        }
    }

    fn reply(&self, result: Result<(), GameError>) -> Result<(), String> {
        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                debug!("Rejected request from {}: {}", self.connection_id, e);
                self.send_error(&e.to_string())
            }
        }
    }

    fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.connection_manager
            .send_to_connection(self.connection_id, message)
    }

    pub fn send_error(&self, error_message: &str) -> Result<(), String> {
        self.send_message(ServerMessage::Error {
            message: error_message.to_string(),
        })
    }
}
