use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{HistoryQuery, Identity};

/// Every action the service understands, with its parameters already validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Command {
    Start {
        identity: Identity,
        secondary_hint: Option<String>,
    },
    Guess {
        identity: Identity,
        guess: String,
    },
    Current {
        identity: Identity,
    },
    Reset {
        identity: Identity,
        secondary_hint: Option<String>,
    },
    Stats {
        identity: Identity,
    },
    History {
        identity: Identity,
        query: HistoryQuery,
    },
    MonthlyStats {
        identity: Identity,
        year: i32,
        month: u32,
    },
    GeneratePin {
        identity: Identity,
    },
    ValidatePin {
        pin: String,
        secondary_identity: String,
    },
    Unlink {
        identity: Identity,
    },
    LinkStatus {
        identity: Identity,
    },
    CleanupPins,
    Health,
    Palabras,
}

impl Command {
    pub const ACTIONS: [&'static str; 14] = [
        "start",
        "guess",
        "current",
        "reset",
        "stats",
        "history",
        "monthly-stats",
        "generate-pin",
        "validate-pin",
        "unlink",
        "link-status",
        "cleanup-pins",
        "health",
        "palabras",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Command::Start { .. } => "start",
            Command::Guess { .. } => "guess",
            Command::Current { .. } => "current",
            Command::Reset { .. } => "reset",
            Command::Stats { .. } => "stats",
            Command::History { .. } => "history",
            Command::MonthlyStats { .. } => "monthly-stats",
            Command::GeneratePin { .. } => "generate-pin",
            Command::ValidatePin { .. } => "validate-pin",
            Command::Unlink { .. } => "unlink",
            Command::LinkStatus { .. } => "link-status",
            Command::CleanupPins => "cleanup-pins",
            Command::Health => "health",
            Command::Palabras => "palabras",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub message: String,
    pub timestamp: String, // ISO 8601 string
    pub version: String,
    pub features: Vec<String>,
}
