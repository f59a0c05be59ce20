#![allow(dead_code)]

use game_core::{Dictionary, SessionSettings};
use game_server::broadcast::BroadcastGateway;
use game_server::registry::{RegistrySettings, SessionRegistry};
use game_types::{
    Language, PlayerName, ServerMessage, SessionId, SessionPhase, WordEffect, WordLength, WordView,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Prefix-free five letter words
pub const TEST_WORDS: &str = "apple\nbread\nchair\ndance\neagle\nflame\ngrape\nhouse\nirony\njelly\nkoala\nlemon\nmango\nnoble\nocean\npiano\nquilt\nriver\nsugar\ntiger";

/// Gateway that records every delivery to a connected player
#[derive(Default)]
pub struct RecordingGateway {
    connected: Mutex<Vec<PlayerName>>,
    delivered: Mutex<Vec<(PlayerName, ServerMessage)>>,
}

impl RecordingGateway {
    pub fn connect(&self, name: &str) {
        self.connected.lock().unwrap().push(name.to_string());
    }

    pub fn disconnect(&self, name: &str) {
        self.connected.lock().unwrap().retain(|p| p != name);
    }

    pub fn messages_for(&self, name: &str) -> Vec<ServerMessage> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .filter(|(player, _)| player == name)
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Messages for `name` other than lobby listings
    pub fn game_messages_for(&self, name: &str) -> Vec<ServerMessage> {
        self.messages_for(name)
            .into_iter()
            .filter(|message| !matches!(message, ServerMessage::GamesList { .. }))
            .collect()
    }

    /// Words of the most recent round `name` saw start
    pub fn round_words(&self, name: &str) -> Vec<WordView> {
        self.messages_for(name)
            .into_iter()
            .rev()
            .find_map(|message| match message {
                ServerMessage::RoundStarted { words } => Some(words),
                _ => None,
            })
            .expect("No round started for player")
    }

    pub fn clear(&self) {
        self.delivered.lock().unwrap().clear();
    }
}

impl BroadcastGateway for RecordingGateway {
    fn send(&self, recipients: &[PlayerName], message: &ServerMessage) {
        let connected = self.connected.lock().unwrap();
        let mut delivered = self.delivered.lock().unwrap();
        for recipient in recipients {
            if connected.contains(recipient) {
                delivered.push((recipient.clone(), message.clone()));
            }
        }
    }

    fn connected_players(&self) -> Vec<PlayerName> {
        self.connected.lock().unwrap().clone()
    }
}

/// Test setup that provides all necessary components
pub struct TestSetup {
    pub gateway: Arc<RecordingGateway>,
    pub registry: Arc<SessionRegistry>,
}

impl TestSetup {
    /// Registry with no countdown delay over the test words
    pub fn new() -> Self {
        Self::with_settings(RegistrySettings {
            countdown: Duration::ZERO,
            ..RegistrySettings::default()
        })
    }

    pub fn with_settings(settings: RegistrySettings) -> Self {
        Self::with_words(TEST_WORDS, settings)
    }

    pub fn with_words(words: &str, settings: RegistrySettings) -> Self {
        let gateway = Arc::new(RecordingGateway::default());
        let dictionary = Dictionary::from_word_list(Language::En, words);
        let registry = Arc::new(SessionRegistry::new(
            Arc::new(dictionary),
            gateway.clone(),
            settings,
        ));
        Self { gateway, registry }
    }

    /// Connects every player, declares a game for the first and joins the rest
    pub async fn create_game(
        &self,
        players: &[&str],
        rounds: u32,
        words_per_player: u32,
    ) -> SessionId {
        for player in players {
            self.gateway.connect(player);
        }

        let id = self
            .registry
            .declare(
                game_types::GameMode::Capture,
                create_settings(players[0], rounds, words_per_player),
            )
            .unwrap();
        for player in &players[1..] {
            self.registry.join(id, player).await.unwrap();
        }
        id
    }

    /// Declares, joins and starts a game, returning once play is open
    pub async fn create_started_game(
        &self,
        players: &[&str],
        rounds: u32,
        words_per_player: u32,
    ) -> SessionId {
        let id = self.create_game(players, rounds, words_per_player).await;
        self.registry.start(players[0]).await.unwrap();
        self.wait_for_phase(id, SessionPhase::Playing).await;
        id
    }

    /// Poll until the session reaches `phase`
    pub async fn wait_for_phase(&self, id: SessionId, phase: SessionPhase) {
        let reached = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if self.registry.phase(id).await == Some(phase) {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;

        assert!(
            reached.is_ok(),
            "Game {} never reached {:?}, stuck in {:?}",
            id,
            phase,
            self.registry.phase(id).await
        );
    }

    /// Claim every unclaimed word, spreading claims over `players`
    pub async fn finish_round(&self, players: &[&str]) {
        let words = self.gateway.round_words(players[0]);
        for (i, word) in words.iter().enumerate() {
            let player = players[i % players.len()];
            self.registry.claim(player, &word.label).await;
        }
    }
}

pub fn create_settings(creator: &str, rounds: u32, words_per_player: u32) -> SessionSettings {
    SessionSettings {
        creator: creator.to_string(),
        rounds,
        language: Language::En,
        words_per_player,
        word_length: WordLength::Standard,
        word_effect: WordEffect::None,
    }
}
