use crate::functions::traits::{Indicator, VectorizedIndicator};
use anyhow::{bail, Result};
use polars::prelude::*;

// --- SMA ---
pub struct SMA {
    pub period: usize,
}

impl SMA {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for SMA {
    fn alias(&self) -> &'static str {
        "SMA"
    }
    fn ui_name(&self) -> &'static str {
        "Simple Moving Average"
    }
    fn value_range(&self) -> Option<(f64, f64)> {
        None
    }
    fn warmup_bars(&self) -> usize {
        self.period.saturating_sub(1)
    }
}

impl VectorizedIndicator for SMA {
    fn calculate_vectorized(&self, series: Expr) -> Result<Expr> {
        if self.period == 0 {
            bail!("SMA: period must be positive");
        }

        // Full window required: the first period-1 values stay null
        let options = RollingOptionsFixedWindow {
            window_size: self.period,
            min_periods: self.period,
            ..Default::default()
        };

        Ok(series.rolling_mean(options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_calculation() {
        let df = df! {
            "close" => &[1.0, 2.0, 3.0, 4.0, 5.0],
        }
        .unwrap();

        let expr = SMA::new(3).calculate_vectorized(col("close")).unwrap();
        let result_df = df.lazy().select([expr.alias("sma")]).collect().unwrap();
        let values = result_df.column("sma").unwrap().f64().unwrap();

        // First two values are null (insufficient data)
        assert_eq!(values.get(0), None);
        assert_eq!(values.get(1), None);
        assert_eq!(values.get(2), Some(2.0));
        assert_eq!(values.get(3), Some(3.0));
        assert_eq!(values.get(4), Some(4.0));
    }

    #[test]
    fn test_sma_window_longer_than_data_is_all_null() {
        let df = df! {
            "close" => &[1.0, 2.0, 3.0],
        }
        .unwrap();

        let expr = SMA::new(5).calculate_vectorized(col("close")).unwrap();
        let result_df = df.lazy().select([expr.alias("sma")]).collect().unwrap();
        assert_eq!(result_df.column("sma").unwrap().null_count(), 3);
    }

    #[test]
    fn test_zero_period_is_an_error() {
        assert!(SMA::new(0).calculate_vectorized(col("close")).is_err());
        assert_eq!(SMA::new(0).warmup_bars(), 0);
        assert_eq!(SMA::new(20).warmup_bars(), 19);
    }
}
