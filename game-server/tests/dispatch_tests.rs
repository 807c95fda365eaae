mod test_helpers;

use game_core::{WordListProvider, WordSource};
use game_types::{Command, Identity};
use test_helpers::*;

/// A word store that blows up instead of answering
struct ExplodingWordList;

impl WordListProvider for ExplodingWordList {
    fn fetch(&self) -> anyhow::Result<Vec<String>> {
        panic!("word store exploded");
    }
}

#[tokio::test]
async fn test_handler_panic_becomes_internal_error() {
    let setup = TestServerSetup::with_word_source(WordSource::new(ExplodingWordList)).await;

    let response = setup.dispatcher.dispatch(Command::Palabras).await;
    assert_eq!(response["success"], false);
    assert_eq!(response["error"], "Internal server error");
    assert!(!response["error"].as_str().unwrap().contains("exploded"));

    // The dispatcher keeps serving after a panic
    let response = setup.dispatcher.dispatch(Command::Health).await;
    assert_eq!(response["success"], true);
}

#[tokio::test]
async fn test_health_keeps_report_message() {
    let setup = TestServerSetup::new().await;

    let response = setup.dispatcher.dispatch(Command::Health).await;
    assert_eq!(response["success"], true);
    assert_eq!(response["message"], "Wordle service is running");
    assert_eq!(response["version"], env!("CARGO_PKG_VERSION"));
    assert!(!response["features"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_palabras_reports_vocabulary() {
    let setup = TestServerSetup::new().await;

    let response = setup.dispatcher.dispatch(Command::Palabras).await;
    assert_eq!(response["success"], true);
    assert_eq!(response["totalWords"], TEST_WORDS.len());
    assert_eq!(response["message"], format!("{} words available", TEST_WORDS.len()));
}

#[tokio::test]
async fn test_domain_errors_are_reported_not_raised() {
    let setup = TestServerSetup::new().await;

    let response = setup
        .dispatcher
        .dispatch(Command::Current {
            identity: Identity::fallback("nobody"),
        })
        .await;
    assert_eq!(response["success"], false);
    assert!(response.get("availableActions").is_none());
}
