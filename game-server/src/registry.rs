use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use game_core::{
    CaptureMode, ClaimResult, GameMode, RoundOutcome, Session, SessionCleanup, SessionEvent,
    SessionSettings, WordSource, validate_name,
};
use game_types::{
    GameDescriptor, GameError, GameMode as GameModeKind, PlayerName, ServerMessage, SessionId,
    SessionPhase,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::broadcast::BroadcastGateway;
use crate::config::Config;

type BoxedSession = Session<Box<dyn GameMode>>;

#[derive(Debug, Clone)]
pub struct RegistrySettings {
    pub countdown: Duration,
    pub min_players: usize,
    pub max_players: usize,
    pub max_rounds: u32,
    pub max_words_per_player: u32,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            countdown: Duration::from_secs(5),
            min_players: 1,
            max_players: 16,
            max_rounds: 20,
            max_words_per_player: 20,
        }
    }
}

impl From<&Config> for RegistrySettings {
    fn from(config: &Config) -> Self {
        Self {
            countdown: config.countdown(),
            min_players: config.min_players_per_game,
            max_players: config.max_players_per_game,
            max_rounds: config.max_rounds,
            max_words_per_player: config.max_words_per_player,
        }
    }
}

struct SlotState {
    session: BoxedSession,
    countdown: Option<JoinHandle<()>>,
}

/// One session behind its own lock. Nothing else shares this lock.
struct SessionSlot {
    state: Mutex<SlotState>,
}

/// Shared tables that outlive a single call, cloned into countdown tasks.
#[derive(Clone)]
struct Notifier {
    gateway: Arc<dyn BroadcastGateway>,
    lobby: Arc<DashMap<SessionId, GameDescriptor>>,
    player_sessions: Arc<DashMap<PlayerName, SessionId>>,
    countdown: Duration,
}

impl Notifier {
    /// Deliver to participants still routed to this session
    fn send_event(&self, session: &BoxedSession, event: SessionEvent) {
        let id = session.id();
        let recipients: Vec<PlayerName> = session
            .participants()
            .iter()
            .filter(|p| {
                self.player_sessions
                    .get(p.as_str())
                    .is_some_and(|session_id| *session_id == id)
            })
            .cloned()
            .collect();
        let message = event.into_message(self.countdown);
        self.gateway.send(&recipients, &message);
    }

    /// Mirror the session into the lobby catalog while it accepts players
    fn sync_catalog(&self, session: &BoxedSession) {
        if session.phase() == SessionPhase::Lobby {
            self.lobby.insert(session.id(), session.descriptor().clone());
        } else {
            self.lobby.remove(&session.id());
        }
    }

    /// Free the participants of a finished session to join another one
    fn release_players(&self, session: &BoxedSession) {
        let id = session.id();
        for player in session.participants() {
            self.player_sessions.remove_if(player, |_, session_id| *session_id == id);
        }
    }

    fn lobby_games(&self) -> Vec<GameDescriptor> {
        let mut games: Vec<GameDescriptor> =
            self.lobby.iter().map(|entry| entry.value().clone()).collect();
        games.sort_by_key(|game| game.id);
        games
    }

    fn is_browsing(&self, player: &str) -> bool {
        match self.player_sessions.get(player) {
            Some(id) => self.lobby.contains_key(id.value()),
            None => true,
        }
    }

    fn broadcast_lobby(&self) {
        let recipients: Vec<PlayerName> = self
            .gateway
            .connected_players()
            .into_iter()
            .filter(|player| self.is_browsing(player))
            .collect();
        if recipients.is_empty() {
            return;
        }

        let message = ServerMessage::GamesList {
            games: self.lobby_games(),
        };
        self.gateway.send(&recipients, &message);
    }
}

/// Lobby catalog and running sessions.
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Arc<SessionSlot>>,
    next_id: AtomicU64,
    source: Arc<dyn WordSource>,
    notifier: Notifier,
    settings: RegistrySettings,
}

impl SessionRegistry {
    pub fn new(
        source: Arc<dyn WordSource>,
        gateway: Arc<dyn BroadcastGateway>,
        settings: RegistrySettings,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            next_id: AtomicU64::new(1),
            source,
            notifier: Notifier {
                gateway,
                lobby: Arc::new(DashMap::new()),
                player_sessions: Arc::new(DashMap::new()),
                countdown: settings.countdown,
            },
            settings,
        }
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    /// Open a new session in the lobby with its creator as first participant.
    pub fn declare(
        &self,
        mode: GameModeKind,
        settings: SessionSettings,
    ) -> Result<SessionId, GameError> {
        let creator = validate_name(&settings.creator)?;
        self.ensure_free(&creator)?;
        self.validate_settings(&settings)?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let session = Session::new(id, settings, self.create_mode(mode))?;

        match self.notifier.player_sessions.entry(creator.clone()) {
            Entry::Occupied(entry) => {
                return Err(GameError::AlreadyInSession {
                    name: creator,
                    game_id: *entry.get(),
                });
            }
            Entry::Vacant(entry) => {
                entry.insert(id);
            }
        }

        self.notifier.sync_catalog(&session);
        self.sessions.insert(
            id,
            Arc::new(SessionSlot {
                state: Mutex::new(SlotState {
                    session,
                    countdown: None,
                }),
            }),
        );

        info!("Game {} declared by {}", id, creator);
        self.notifier.broadcast_lobby();
        Ok(id)
    }

    pub async fn join(&self, id: SessionId, player: &str) -> Result<(), GameError> {
        let player = validate_name(player)?;
        let slot = self.slot(id)?;

        match self.notifier.player_sessions.entry(player.clone()) {
            Entry::Occupied(entry) => {
                return Err(GameError::AlreadyInSession {
                    name: player,
                    game_id: *entry.get(),
                });
            }
            Entry::Vacant(entry) => {
                entry.insert(id);
            }
        }

        let result = {
            let mut state = slot.state.lock().await;
            let joined = if state.session.phase() != SessionPhase::Lobby {
                Err(GameError::SessionNotInLobby {
                    current_state: state.session.phase().to_string(),
                })
            } else if state.session.participants().len() >= self.settings.max_players {
                Err(GameError::SessionFull {
                    max: self.settings.max_players,
                })
            } else {
                state.session.join(&player)
            };
            if joined.is_ok() {
                self.notifier.sync_catalog(&state.session);
            }
            joined
        };

        match result {
            Ok(()) => {
                info!("Player {} joined game {}", player, id);
                self.notifier.broadcast_lobby();
                Ok(())
            }
            Err(e) => {
                self.notifier
                    .player_sessions
                    .remove_if(&player, |_, session_id| *session_id == id);
                Err(e)
            }
        }
    }

    /// Leave the current session. A creator leaving its lobby closes it;
    /// leaving a started session only stops deliveries to the player.
    pub async fn leave(&self, player: &str) -> Result<(), GameError> {
        let id = self.session_of(player).ok_or(GameError::NotInSession)?;
        let slot = self.slot(id)?;

        {
            let mut state = slot.state.lock().await;
            match state.session.phase() {
                SessionPhase::Lobby if state.session.creator() == player => {
                    self.close(&mut state, "Game creator left");
                    self.sessions.remove(&id);
                }
                SessionPhase::Lobby => {
                    state.session.leave(player)?;
                    self.notifier.sync_catalog(&state.session);
                    self.notifier
                        .player_sessions
                        .remove_if(player, |_, session_id| *session_id == id);
                }
                _ => {
                    self.notifier
                        .player_sessions
                        .remove_if(player, |_, session_id| *session_id == id);
                    if !state.session.phase().is_terminal()
                        && self.attached_count(&state.session) == 0
                    {
                        self.close(&mut state, "All players left");
                    }
                }
            }
        }

        info!("Player {} left game {}", player, id);
        self.notifier.broadcast_lobby();
        Ok(())
    }

    /// Creator only: fix the participant list and start the first countdown.
    pub async fn start(&self, player: &str) -> Result<(), GameError> {
        let id = self.session_of(player).ok_or(GameError::NotInSession)?;
        let slot = self.slot(id)?;

        {
            let mut state = slot.state.lock().await;
            if state.session.creator() != player {
                return Err(GameError::NotSessionCreator);
            }
            if state.session.phase() != SessionPhase::Lobby {
                return Err(GameError::SessionNotInLobby {
                    current_state: state.session.phase().to_string(),
                });
            }
            let event = state.session.begin_countdown(self.settings.min_players)?;
            self.notifier.sync_catalog(&state.session);
            self.notifier.send_event(&state.session, event);
            self.schedule_countdown(&slot, &mut state);
        }

        info!("Game {} started by {}", id, player);
        self.notifier.broadcast_lobby();
        Ok(())
    }

    /// Creator only: move from the end of a round to the next countdown.
    pub async fn next_round(&self, player: &str) -> Result<(), GameError> {
        let id = self.session_of(player).ok_or(GameError::NotInSession)?;
        let slot = self.slot(id)?;

        let mut state = slot.state.lock().await;
        if state.session.creator() != player {
            return Err(GameError::NotSessionCreator);
        }
        if state.session.phase() != SessionPhase::RoundOver {
            return Err(GameError::InvalidTransition {
                action: "start the next round".to_string(),
                current_state: state.session.phase().to_string(),
            });
        }

        let event = state.session.begin_countdown(self.settings.min_players)?;
        self.notifier.send_event(&state.session, event);
        self.schedule_countdown(&slot, &mut state);
        Ok(())
    }

    /// Claim a word in the player's session. Stale claims, including those
    /// from players already released by a finished game, are ignored.
    pub async fn claim(&self, player: &str, label: &str) -> ClaimResult {
        let Some((id, slot)) = self
            .session_of(player)
            .and_then(|id| self.slot(id).ok().map(|slot| (id, slot)))
        else {
            return ClaimResult {
                accepted: false,
                outcome: RoundOutcome::StillPlaying,
                event: None,
            };
        };

        let result = {
            let mut state = slot.state.lock().await;
            let result = state.session.claim(player, label);
            if let Some(event) = result.event.clone() {
                if event.is_round_end() {
                    debug!("Round {} of game {} ended", state.session.round(), id);
                }
                self.notifier.send_event(&state.session, event);
            }
            if result.outcome == RoundOutcome::GameOver && result.accepted {
                info!("Game {} is over", id);
                self.notifier.release_players(&state.session);
            }
            result
        };

        if result.outcome == RoundOutcome::GameOver && result.accepted {
            self.notifier.broadcast_lobby();
        }
        result
    }

    /// Stop a session from outside, cancelling any pending countdown.
    pub async fn abort(&self, id: SessionId, reason: &str) -> Result<bool, GameError> {
        let slot = self.slot(id)?;
        let aborted = {
            let mut state = slot.state.lock().await;
            self.close(&mut state, reason)
        };
        if aborted {
            self.notifier.broadcast_lobby();
        }
        Ok(aborted)
    }

    /// Called once the player's connection is gone.
    pub async fn handle_disconnect(&self, player: &str) {
        let Some(id) = self.session_of(player) else {
            return;
        };
        let Ok(slot) = self.slot(id) else {
            self.notifier.player_sessions.remove(player);
            return;
        };

        {
            let mut state = slot.state.lock().await;
            match state.session.phase() {
                SessionPhase::Lobby if state.session.creator() == player => {
                    self.close(&mut state, "Game creator disconnected");
                    self.sessions.remove(&id);
                }
                SessionPhase::Lobby => {
                    if state.session.leave(player).is_ok() {
                        self.notifier.sync_catalog(&state.session);
                    }
                    self.notifier
                        .player_sessions
                        .remove_if(player, |_, session_id| *session_id == id);
                }
                phase if phase.is_terminal() => {}
                _ => {
                    let connected = self.notifier.gateway.connected_players();
                    let anyone_left = state.session.participants().iter().any(|p| {
                        p != player && connected.contains(p) && self.is_attached(p, id)
                    });
                    if !anyone_left {
                        self.close(&mut state, "All players disconnected");
                    }
                }
            }
        }

        self.notifier.broadcast_lobby();
    }

    /// Games that can still be joined, ordered by id.
    pub fn lobby_games(&self) -> Vec<GameDescriptor> {
        self.notifier.lobby_games()
    }

    pub async fn phase(&self, id: SessionId) -> Option<SessionPhase> {
        let slot = self.slot(id).ok()?;
        let state = slot.state.lock().await;
        Some(state.session.phase())
    }

    pub async fn descriptor(&self, id: SessionId) -> Option<GameDescriptor> {
        let slot = self.slot(id).ok()?;
        let state = slot.state.lock().await;
        Some(state.session.descriptor().clone())
    }

    pub fn session_of(&self, player: &str) -> Option<SessionId> {
        self.notifier.player_sessions.get(player).map(|id| *id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Send the lobby list to a single player
    pub fn send_lobby_to(&self, player: &str) {
        let message = ServerMessage::GamesList {
            games: self.lobby_games(),
        };
        self.notifier.gateway.send(&[player.to_string()], &message);
    }

    /// Tear down stale, stalled and finished sessions. Returns how many went.
    pub async fn cleanup(&self, policy: &SessionCleanup) -> usize {
        let slots: Vec<(SessionId, Arc<SessionSlot>)> = self
            .sessions
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut removed = 0;
        for (id, slot) in slots {
            let mut state = slot.state.lock().await;
            let phase = state.session.phase();
            let Some(reason) = policy.teardown_reason(phase, state.session.idle_for()) else {
                continue;
            };

            info!("Cleaning up game {} ({:?})", id, reason);
            self.close(&mut state, "Game expired");
            self.notifier.release_players(&state.session);
            self.sessions.remove(&id);
            removed += 1;
        }

        if removed > 0 {
            self.notifier.broadcast_lobby();
        }
        removed
    }

    fn create_mode(&self, kind: GameModeKind) -> Box<dyn GameMode> {
        match kind {
            GameModeKind::Capture => Box::new(CaptureMode::new(self.source.clone())),
        }
    }

    fn validate_settings(&self, settings: &SessionSettings) -> Result<(), GameError> {
        if settings.rounds > self.settings.max_rounds {
            return Err(GameError::InvalidSettings {
                reason: format!("at most {} rounds", self.settings.max_rounds),
            });
        }
        if settings.words_per_player > self.settings.max_words_per_player {
            return Err(GameError::InvalidSettings {
                reason: format!(
                    "at most {} words per player",
                    self.settings.max_words_per_player
                ),
            });
        }
        if !self.source.is_available(settings.language) {
            return Err(GameError::LanguageUnavailable {
                language: settings.language.to_string(),
            });
        }
        Ok(())
    }

    fn ensure_free(&self, player: &str) -> Result<(), GameError> {
        match self.session_of(player) {
            Some(game_id) => Err(GameError::AlreadyInSession {
                name: player.to_string(),
                game_id,
            }),
            None => Ok(()),
        }
    }

    fn slot(&self, id: SessionId) -> Result<Arc<SessionSlot>, GameError> {
        self.sessions
            .get(&id)
            .map(|slot| slot.clone())
            .ok_or(GameError::SessionNotFound { game_id: id })
    }

    fn is_attached(&self, player: &str, id: SessionId) -> bool {
        self.notifier
            .player_sessions
            .get(player)
            .is_some_and(|routed| *routed == id)
    }

    /// Participants still routed to this session
    fn attached_count(&self, session: &BoxedSession) -> usize {
        session
            .participants()
            .iter()
            .filter(|p| self.is_attached(p, session.id()))
            .count()
    }

    /// Abort under the slot lock: cancel the timer, notify and free players.
    fn close(&self, state: &mut SlotState, reason: &str) -> bool {
        if let Some(handle) = state.countdown.take() {
            handle.abort();
        }
        let Some(event) = state.session.abort(reason) else {
            return false;
        };
        self.notifier.send_event(&state.session, event);
        self.notifier.release_players(&state.session);
        self.notifier.sync_catalog(&state.session);
        true
    }

    fn schedule_countdown(&self, slot: &Arc<SessionSlot>, state: &mut SlotState) {
        if let Some(previous) = state.countdown.take() {
            previous.abort();
        }

        let slot = slot.clone();
        let notifier = self.notifier.clone();
        let delay = self.settings.countdown;
        let round = state.session.round();

        state.countdown = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let mut state = slot.state.lock().await;
            state.countdown = None;
            if state.session.phase() != SessionPhase::Countdown || state.session.round() != round {
                debug!("Stale countdown for game {} ignored", state.session.id());
                return;
            }

            match state.session.start_play() {
                Ok(event) => notifier.send_event(&state.session, event),
                Err(e) => {
                    warn!("Game {} could not start round {}: {}", state.session.id(), round, e);
                    notifier.send_event(
                        &state.session,
                        SessionEvent::Aborted {
                            reason: e.to_string(),
                        },
                    );
                    notifier.release_players(&state.session);
                    drop(state);
                    notifier.broadcast_lobby();
                }
            }
        }));
    }
}
