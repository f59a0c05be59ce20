pub mod capture;
pub mod cleanup;
pub mod dictionary;
pub mod effects;
pub mod game_events;
pub mod game_mode;
pub mod scoring;
pub mod session;
pub mod word_selection;

// Re-export main components
pub use capture::*;
pub use cleanup::*;
pub use dictionary::*;
pub use game_events::*;
pub use game_mode::*;
pub use scoring::*;
pub use session::*;
pub use word_selection::*;
