use crate::engines::generation::Genome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One historical price sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    /// Maps a desired position (1 long, -1 exit, 0 flat) to an action.
    pub fn from_position(position: i8) -> Option<Self> {
        match position {
            1 => Some(Self::Buy),
            -1 => Some(Self::Sell),
            _ => None,
        }
    }
}

/// One-shot trade notification published by a generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub action: TradeAction,
    pub price: f64,
    pub generation: u64,
}

/// Externally visible projection of the shared state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub running: bool,
    pub generation: u64,
    pub best_fitness: Option<f64>,
    pub best_genome: Option<Genome>,
    pub last_trade: Option<TradeSignal>,
}

/// Response of `start` and `stop`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlResponse {
    pub message: String,
    pub status: RunState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateDataResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl From<&crate::error::GaError> for ErrorResponse {
    fn from(err: &crate::error::GaError) -> Self {
        Self {
            error: err.to_string(),
            code: err.status_code(),
        }
    }
}
