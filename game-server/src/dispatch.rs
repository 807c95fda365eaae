use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use futures_util::FutureExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, error};

use crate::game_manager::GameManager;
use crate::link_manager::LinkManager;
use game_types::{Command, GameError, GameStatus, GuessReport, HealthReport, HistoryQuery, Identity};

/// Request parameters after query and body have been merged
pub type Params = HashMap<String, String>;

const VOCABULARY_SAMPLE_SIZE: usize = 10;

const USAGE_EXAMPLES: [&str; 5] = [
    "/api/wordle?action=start&userId=player-1",
    "/api/wordle?action=guess&userId=player-1&guess=PLATO",
    "/api/wordle?action=history&userId=player-1&filter=won&limit=10",
    "/api/wordle?action=monthly-stats&userId=player-1&year=2024&month=5",
    "/api/wordle?action=validate-pin&userId=amzn1.ask.account.X&pin=1234",
];

fn param<'a>(params: &'a Params, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn required<'a>(params: &'a Params, name: &str) -> Result<&'a str, GameError> {
    param(params, name).ok_or_else(|| GameError::missing(name))
}

fn parse_number<T: std::str::FromStr>(params: &Params, name: &str) -> Result<Option<T>, GameError> {
    param(params, name)
        .map(|value| value.parse::<T>().map_err(|_| GameError::invalid(name, value)))
        .transpose()
}

/// Enum parameters use the same spelling as their JSON form
fn parse_enum<T: DeserializeOwned>(params: &Params, name: &str) -> Result<Option<T>, GameError> {
    param(params, name)
        .map(|value| {
            serde_json::from_value(Value::String(value.to_string()))
                .map_err(|_| GameError::invalid(name, value))
        })
        .transpose()
}

/// RFC 3339 timestamp, or a bare `YYYY-MM-DD` date. A bare date used as an
/// upper bound covers that whole day.
fn parse_date(
    params: &Params,
    name: &str,
    end_of_day: bool,
) -> Result<Option<DateTime<Utc>>, GameError> {
    let Some(value) = param(params, name) else {
        return Ok(None);
    };

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(timestamp.with_timezone(&Utc)));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| GameError::invalid(name, value))?;
    let time = if end_of_day {
        date.and_hms_nano_opt(23, 59, 59, 999_999_999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };

    time.map(|t| Some(t.and_utc()))
        .ok_or_else(|| GameError::invalid(name, value))
}

fn parse_history_query(params: &Params) -> Result<HistoryQuery, GameError> {
    let defaults = HistoryQuery::default();

    Ok(HistoryQuery {
        limit: parse_number(params, "limit")?.unwrap_or(defaults.limit),
        offset: parse_number(params, "offset")?.unwrap_or(defaults.offset),
        sort_by: parse_enum(params, "sortBy")?.unwrap_or(defaults.sort_by),
        sort_order: parse_enum(params, "sortOrder")?.unwrap_or(defaults.sort_order),
        filter: parse_enum(params, "filter")?.unwrap_or(defaults.filter),
        date_from: parse_date(params, "dateFrom", false)?,
        date_to: parse_date(params, "dateTo", true)?,
    })
}

/// Turn an action name plus parameters into a validated `Command`.
pub fn parse_command(params: &Params, identity: Option<Identity>) -> Result<Command, GameError> {
    let action = required(params, "action")?;
    let identity_required = || identity.clone().ok_or_else(|| GameError::missing("userId"));

    let command = match action {
        "start" => Command::Start {
            identity: identity_required()?,
            secondary_hint: param(params, "secondaryUserId").map(str::to_string),
        },
        "guess" => Command::Guess {
            identity: identity_required()?,
            guess: required(params, "guess")?.to_string(),
        },
        "current" => Command::Current {
            identity: identity_required()?,
        },
        "reset" => Command::Reset {
            identity: identity_required()?,
            secondary_hint: param(params, "secondaryUserId").map(str::to_string),
        },
        "stats" => Command::Stats {
            identity: identity_required()?,
        },
        "history" => Command::History {
            identity: identity_required()?,
            query: parse_history_query(params)?,
        },
        "monthly-stats" => {
            let now = Utc::now();
            Command::MonthlyStats {
                identity: identity_required()?,
                year: parse_number(params, "year")?.unwrap_or(now.year()),
                month: parse_number(params, "month")?.unwrap_or(now.month()),
            }
        }
        "generate-pin" => Command::GeneratePin {
            identity: identity_required()?,
        },
        "validate-pin" => {
            let pin = required(params, "pin")?.to_string();
            let secondary_identity = param(params, "secondaryUserId")
                .map(str::to_string)
                .or_else(|| identity.as_ref().map(|identity| identity.id.clone()))
                .ok_or_else(|| GameError::missing("secondaryUserId"))?;
            Command::ValidatePin {
                pin,
                secondary_identity,
            }
        }
        "unlink" => Command::Unlink {
            identity: identity_required()?,
        },
        "link-status" => Command::LinkStatus {
            identity: identity_required()?,
        },
        "cleanup-pins" => Command::CleanupPins,
        "health" => Command::Health,
        "palabras" => Command::Palabras,
        other => {
            return Err(GameError::UnknownAction {
                action: other.to_string(),
            });
        }
    };

    Ok(command)
}

/// `{ "success": false, "error": ... }`, plus the action list when the
/// caller did not say what to do.
pub fn error_response(err: &GameError) -> Value {
    let mut body = json!({
        "success": false,
        "error": err.client_message(),
    });

    let wants_usage = match err {
        GameError::UnknownAction { .. } => true,
        GameError::MissingParameter { name } => name == "action",
        _ => false,
    };

    if wants_usage {
        body["availableActions"] = json!(Command::ACTIONS);
        body["usage"] = json!(USAGE_EXAMPLES);
    }

    body
}

fn success_response(payload: impl Serialize, message: impl Into<String>) -> Result<Value, GameError> {
    let payload = serde_json::to_value(payload).map_err(|e| GameError::Internal {
        message: format!("Failed to serialize response: {}", e),
    })?;

    let mut body = match payload {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };
    body.insert("success".to_string(), Value::Bool(true));
    // A payload's own message wins
    body.entry("message")
        .or_insert_with(|| Value::String(message.into()));

    Ok(Value::Object(body))
}

fn guess_message(report: &GuessReport) -> String {
    match report.game_status {
        GameStatus::Won => format!(
            "Congratulations! You guessed the word in {} attempts",
            report.attempts.len()
        ),
        GameStatus::Lost => format!(
            "Game over. The word was {}",
            report.target_word.as_deref().unwrap_or_default()
        ),
        GameStatus::Playing => format!("{} attempts left", report.attempts_left),
    }
}

fn status_message(status: GameStatus) -> &'static str {
    match status {
        GameStatus::Playing => "Game in progress",
        GameStatus::Won => "You won this game. Start a new one to keep playing",
        GameStatus::Lost => "You lost this game. Start a new one to keep playing",
    }
}

/// Routes every `Command` to the manager that owns it. Never fails: errors
/// and panics become `success: false` bodies.
pub struct Dispatcher {
    games: Arc<GameManager>,
    links: Arc<LinkManager>,
}

impl Dispatcher {
    pub fn new(games: Arc<GameManager>, links: Arc<LinkManager>) -> Self {
        Self { games, links }
    }

    pub async fn dispatch(&self, command: Command) -> Value {
        let action = command.name();

        match AssertUnwindSafe(self.execute(command)).catch_unwind().await {
            Ok(Ok(body)) => body,
            Ok(Err(err)) => {
                if err.is_infrastructure() {
                    error!("Action {} failed: {}", action, err);
                } else {
                    debug!("Action {} rejected: {}", action, err);
                }
                error_response(&err)
            }
            Err(_) => {
                error!("Handler for action {} panicked", action);
                error_response(&GameError::Internal {
                    message: format!("handler for {} panicked", action),
                })
            }
        }
    }

    async fn effective_id(&self, identity: &Identity) -> Result<String, GameError> {
        self.links.effective_identity(&identity.id).await
    }

    /// The caller's own id is remembered on the game when play was redirected
    /// to a linked identity.
    fn linked_identity(
        identity: &Identity,
        effective: &str,
        secondary_hint: Option<String>,
    ) -> Option<String> {
        secondary_hint.or_else(|| (identity.id != effective).then(|| identity.id.clone()))
    }

    async fn execute(&self, command: Command) -> Result<Value, GameError> {
        match command {
            Command::Start {
                identity,
                secondary_hint,
            } => {
                let user_id = self.effective_id(&identity).await?;
                let linked = Self::linked_identity(&identity, &user_id, secondary_hint);
                let outcome = self.games.start_game(&user_id, linked).await?;
                let message = if outcome.resumed {
                    "Continuing your game in progress"
                } else {
                    "New game started. Guess the 5-letter word!"
                };
                success_response(outcome, message)
            }
            Command::Guess { identity, guess } => {
                let user_id = self.effective_id(&identity).await?;
                let report = self.games.guess_word(&user_id, &guess).await?;
                let message = guess_message(&report);
                success_response(report, message)
            }
            Command::Current { identity } => {
                let user_id = self.effective_id(&identity).await?;
                let view = self.games.current_game(&user_id).await?;
                let message = status_message(view.game_status);
                success_response(json!({ "game": view }), message)
            }
            Command::Reset {
                identity,
                secondary_hint,
            } => {
                let user_id = self.effective_id(&identity).await?;
                let linked = Self::linked_identity(&identity, &user_id, secondary_hint);
                let outcome = self.games.reset_game(&user_id, linked).await?;
                success_response(outcome, "Game reset. New game started")
            }
            Command::Stats { identity } => {
                let user_id = self.effective_id(&identity).await?;
                let stats = self.games.user_stats(&user_id).await?;
                success_response(
                    json!({ "stats": stats, "userId": user_id }),
                    "Statistics loaded",
                )
            }
            Command::History { identity, query } => {
                let user_id = self.effective_id(&identity).await?;
                let page = self.games.history(&user_id, &query).await?;
                let message = format!("{} games found", page.total);
                success_response(page, message)
            }
            Command::MonthlyStats {
                identity,
                year,
                month,
            } => {
                let user_id = self.effective_id(&identity).await?;
                let stats = self.games.monthly_stats(&user_id, year, month).await?;
                let message = format!("Statistics for {}-{:02}", year, month);
                success_response(stats, message)
            }
            Command::GeneratePin { identity } => {
                let issued = self.links.generate_pin(&identity).await?;
                let message = format!(
                    "Tell your voice assistant the PIN {} within {} minutes",
                    issued.pin,
                    issued.expires_in_seconds / 60
                );
                success_response(issued, message)
            }
            Command::ValidatePin {
                pin,
                secondary_identity,
            } => {
                let link = self
                    .links
                    .validate_pin_and_link(&pin, &secondary_identity)
                    .await?;
                success_response(link, "Accounts linked successfully")
            }
            Command::Unlink { identity } => {
                let summary = self.links.unlink(&identity).await?;
                success_response(summary, "Accounts unlinked")
            }
            Command::LinkStatus { identity } => {
                let status = self.links.link_status(&identity.id).await?;
                let message = if status.linked {
                    "Account is linked"
                } else {
                    "Account is not linked"
                };
                success_response(status, message)
            }
            Command::CleanupPins => {
                let removed = self.links.cleanup_expired_pins().await?;
                success_response(
                    json!({ "removed": removed }),
                    format!("{} expired PINs removed", removed),
                )
            }
            Command::Health => success_response(health_report(), "Service is healthy"),
            Command::Palabras => {
                let summary = self.games.vocabulary_summary(VOCABULARY_SAMPLE_SIZE);
                let message = format!("{} words available", summary.total_words);
                success_response(summary, message)
            }
        }
    }
}

pub fn health_report() -> HealthReport {
    HealthReport {
        message: "Wordle service is running".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        features: [
            "wordle-game",
            "persistent-games",
            "statistics",
            "history",
            "monthly-stats",
            "account-linking",
        ]
        .iter()
        .map(|feature| feature.to_string())
        .collect(),
    }
}
