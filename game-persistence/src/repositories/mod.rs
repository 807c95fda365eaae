pub mod game_repository;
pub mod history_repository;
pub mod link_repository;

pub use game_repository::GameRepository;
pub use history_repository::HistoryRepository;
pub use link_repository::LinkRepository;
