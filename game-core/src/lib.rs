pub mod feedback;
pub mod game_state;
pub mod linking;
pub mod statistics;
pub mod word_source;

// Re-export main components
pub use feedback::*;
pub use game_state::*;
pub use linking::*;
pub use statistics::*;
pub use word_source::*;
