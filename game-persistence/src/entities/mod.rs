pub mod prelude;

pub mod game_history;
pub mod games;
pub mod link_pins;
pub mod linked_accounts;
