use super::validator::DataValidator;
use crate::error::{GaError, Result};
use crate::types::Bar;
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kline record as submitted by callers; `time` is epoch seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kline {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Kline {
    pub fn to_bar(&self) -> Result<Bar> {
        let time = Utc.timestamp_opt(self.time, 0).single().ok_or_else(|| {
            GaError::InvalidData(format!("time {} is not a valid epoch timestamp", self.time))
        })?;

        Ok(Bar {
            time,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        })
    }
}

/// Parse an `update_data` payload (`{"klines": [...]}`) into bars.
///
/// Only decodes and reports anomalies; rejecting unusable values is left to
/// [`DataValidator::validate_bars`] where the series is built.
pub fn parse_update_payload(payload: &Value) -> Result<Vec<Bar>> {
    let klines = match payload.get("klines") {
        Some(Value::Null) | None => return Err(GaError::MissingKlines),
        Some(klines) => klines,
    };

    let klines = Vec::<Kline>::deserialize(klines)
        .map_err(|e| GaError::InvalidData(e.to_string()))?;
    if klines.is_empty() {
        return Err(GaError::InvalidData("klines contains no records".to_string()));
    }

    let bars = klines
        .iter()
        .map(Kline::to_bar)
        .collect::<Result<Vec<_>>>()?;

    let anomalies = DataValidator::ohlc_anomalies(&bars);
    if !anomalies.is_empty() {
        log::warn!(
            "{} bars with inconsistent OHLC values, first: {}",
            anomalies.len(),
            anomalies[0]
        );
    }
    let unordered = DataValidator::out_of_order(&bars);
    if !unordered.is_empty() {
        log::warn!("Timestamps do not ascend at rows {:?}", unordered);
    }

    Ok(bars)
}
