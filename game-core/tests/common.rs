use chrono::{DateTime, Duration, TimeZone, Utc};
use game_core::{Game, WordSource};
use game_types::HistoryEntry;

pub const TEST_WORDS: [&str; 8] = [
    "plato", "prado", "placa", "brazo", "campo", "llama", "salto", "jumbo",
];

/// Creates a test WordSource with a known set of words
pub fn create_test_source() -> WordSource {
    WordSource::from_words(&TEST_WORDS)
}

/// Creates a game with a specific target word
pub fn create_game_with_word(word: &str) -> Game {
    Game::new("test-player", word, None)
}

/// Plays every guess in order, stopping at the first rejected one
pub fn play(game: &mut Game, guesses: &[&str]) {
    for guess in guesses {
        if game.apply_guess(guess).is_err() {
            break;
        }
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
}

/// Plays one finished game per outcome ('W' or 'L'), a day apart, and
/// returns their history snapshots oldest first.
pub fn history_from_outcomes(outcomes: &str) -> Vec<HistoryEntry> {
    outcomes
        .chars()
        .enumerate()
        .map(|(i, outcome)| {
            let started = base_time() + Duration::days(i as i64);
            let mut game = Game::new_at("test-player", "plato", None, started);
            if outcome == 'W' {
                game.apply_guess_at("prado", started).unwrap();
                game.apply_guess_at("plato", started).unwrap();
            } else {
                for _ in 0..6 {
                    game.apply_guess_at("prado", started).unwrap();
                }
            }
            game.history_entry(started + Duration::minutes(4)).unwrap()
        })
        .collect()
}
