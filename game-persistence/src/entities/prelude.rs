pub use super::game_history::Entity as GameHistory;
pub use super::games::Entity as Games;
pub use super::link_pins::Entity as LinkPins;
pub use super::linked_accounts::Entity as LinkedAccounts;
