pub mod errors;
pub mod game;
pub mod history;
pub mod identity;
pub mod link;
pub mod messages;

// Re-export all types
pub use errors::*;
pub use game::*;
pub use history::*;
pub use identity::*;
pub use link::*;
pub use messages::*;
