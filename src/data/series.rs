use crate::error::Result;
use crate::types::Bar;
use polars::prelude::*;
use std::sync::Arc;

/// Time-ascending bar history with a columnar view for vectorized evaluation.
///
/// Built once and never mutated; clones share the same storage, so a clone
/// taken by the evolution loop stays valid while the store swaps in a new
/// series.
#[derive(Debug, Clone)]
pub struct HistoricalSeries {
    bars: Arc<[Bar]>,
    frame: DataFrame,
}

impl Default for HistoricalSeries {
    fn default() -> Self {
        Self {
            bars: Arc::from(Vec::new()),
            frame: DataFrame::empty(),
        }
    }
}

impl HistoricalSeries {
    pub fn from_bars(bars: Vec<Bar>) -> Result<Self> {
        let time: Vec<i64> = bars.iter().map(|b| b.time.timestamp_millis()).collect();
        let open: Vec<f64> = bars.iter().map(|b| b.open).collect();
        let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let low: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let volume: Vec<f64> = bars.iter().map(|b| b.volume).collect();

        let frame = df! {
            "time" => time,
            "open" => open,
            "high" => high,
            "low" => low,
            "close" => close,
            "volume" => volume,
        }?;

        Ok(Self {
            bars: Arc::from(bars),
            frame,
        })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Columnar view: time (epoch ms), open, high, low, close, volume
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bar(ts: i64, close: f64) -> Bar {
        Bar {
            time: Utc.timestamp_opt(ts, 0).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10.0,
        }
    }

    #[test]
    fn test_frame_matches_bars() {
        let series = HistoricalSeries::from_bars(vec![bar(60, 100.0), bar(120, 101.0)]).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.frame().height(), 2);
        let close = series.frame().column("close").unwrap().f64().unwrap();
        assert_eq!(close.get(1), Some(101.0));
        let time = series.frame().column("time").unwrap().i64().unwrap();
        assert_eq!(time.get(0), Some(60_000));
        assert_eq!(series.last_close(), Some(101.0));
    }

    #[test]
    fn test_default_is_empty() {
        let series = HistoricalSeries::default();
        assert!(series.is_empty());
        assert_eq!(series.last_close(), None);
    }

    #[test]
    fn test_clone_shares_bars() {
        let series = HistoricalSeries::from_bars(vec![bar(60, 100.0)]).unwrap();
        let snapshot = series.clone();
        assert!(std::ptr::eq(series.bars().as_ptr(), snapshot.bars().as_ptr()));
    }
}
