#![allow(dead_code)]

use game_core::{CaptureMode, Dictionary, Session, SessionSettings};
use game_types::{Language, WordEffect, WordLength};
use std::sync::Arc;

/// Prefix-free five letter words, enough for large pools
pub const TEST_WORDS: &str = "apple\nbread\nchair\ndance\neagle\nflame\ngrape\nhouse\nirony\njelly\nkoala\nlemon\nmango\nnoble\nocean\npiano\nquilt\nriver\nsugar\ntiger\numbra\nvivid\nwaltz\nxenon\nyacht\nzebra";

/// Creates a test dictionary with a known set of words
pub fn create_test_dictionary() -> Arc<Dictionary> {
    Arc::new(Dictionary::from_word_list(Language::En, TEST_WORDS))
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

/// Creates a lobby session with the creator plus the other players joined
pub fn create_session_with_players(
    players: &[&str],
    rounds: u32,
    words_per_player: u32,
) -> Session<CaptureMode> {
    let mut session = Session::new(
        1,
        create_settings(players[0], rounds, words_per_player),
        CaptureMode::new(create_test_dictionary()),
    )
    .unwrap()
    .seeded(17);

    for player in &players[1..] {
        session.join(player).unwrap();
    }
    session
}

/// Moves a lobby session into its first round of play
pub fn start_first_round(session: &mut Session<CaptureMode>) {
    session.begin_countdown(1).unwrap();
    session.start_play().unwrap();
}

/// Labels of the current pool, in selection order
pub fn pool_labels(session: &Session<CaptureMode>) -> Vec<String> {
    session.words().into_iter().map(|w| w.label).collect()
}

/// Labels nobody has claimed yet
pub fn unclaimed_labels(session: &Session<CaptureMode>) -> Vec<String> {
    session
        .words()
        .into_iter()
        .filter(|w| w.claimant.is_none())
        .map(|w| w.label)
        .collect()
}
