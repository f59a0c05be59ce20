use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub words_directory: String,
    pub countdown_seconds: u64,
    pub min_players_per_game: usize,
    pub max_players_per_game: usize,
    pub max_rounds: u32,
    pub max_words_per_player: u32,
    pub lobby_timeout_minutes: u64,
    pub finished_retention_minutes: u64,
    pub connection_timeout_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", 8080)?,
            words_directory: env::var("WORDS_DIRECTORY")
                .unwrap_or_else(|_| "./shared/words".to_string()),
            countdown_seconds: parse_var("COUNTDOWN_SECONDS", 5)?,
            min_players_per_game: parse_var("MIN_PLAYERS_PER_GAME", 1)?,
            max_players_per_game: parse_var("MAX_PLAYERS_PER_GAME", 16)?,
            max_rounds: parse_var("MAX_ROUNDS", 20)?,
            max_words_per_player: parse_var("MAX_WORDS_PER_PLAYER", 20)?,
            lobby_timeout_minutes: parse_var("LOBBY_TIMEOUT_MINUTES", 30)?,
            finished_retention_minutes: parse_var("FINISHED_RETENTION_MINUTES", 5)?,
            connection_timeout_seconds: parse_var("CONNECTION_TIMEOUT_SECONDS", 300)?,
        })
    }

    pub fn countdown(&self) -> Duration {
        Duration::from_secs(self.countdown_seconds)
    }

    pub fn lobby_timeout(&self) -> Duration {
        Duration::from_secs(self.lobby_timeout_minutes * 60)
    }

    pub fn finished_retention(&self) -> Duration {
        Duration::from_secs(self.finished_retention_minutes * 60)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_seconds)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", name, value)),
        Err(_) => Ok(default),
    }
}
