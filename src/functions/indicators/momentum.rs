use crate::functions::traits::{Indicator, VectorizedIndicator};
use anyhow::{bail, Result};
use polars::prelude::*;

/// Relative Strength Index with Wilder smoothing
pub struct RSI {
    pub period: usize,
}

impl RSI {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    fn smoothed_ma(&self, series: Expr) -> Expr {
        series.ewm_mean(EWMOptions {
            alpha: 1.0 / self.period as f64,
            adjust: false,
            min_periods: self.period,
            ..Default::default()
        })
    }
}

impl Indicator for RSI {
    fn alias(&self) -> &'static str {
        "RSI"
    }
    fn ui_name(&self) -> &'static str {
        "Relative Strength Index"
    }
    fn value_range(&self) -> Option<(f64, f64)> {
        Some((0.0, 100.0))
    }
    fn warmup_bars(&self) -> usize {
        self.period.saturating_sub(1)
    }
}

impl VectorizedIndicator for RSI {
    fn calculate_vectorized(&self, series: Expr) -> Result<Expr> {
        if self.period == 0 {
            bail!("RSI: period must be positive");
        }

        // Step 1: price changes; the first bar has none
        let delta = series.clone() - series.shift(lit(1));

        // Step 2: gains and losses, a missing change counts as zero
        let gains = when(delta.clone().gt(lit(0.0)))
            .then(delta.clone())
            .otherwise(lit(0.0));
        let losses = when(delta.clone().lt(lit(0.0)))
            .then(lit(0.0) - delta)
            .otherwise(lit(0.0));

        // Step 3: Wilder averages
        let avg_gains = self.smoothed_ma(gains);
        let avg_losses = self.smoothed_ma(losses);

        // Step 4: RS and RSI, saturating at 100 when there are no losses
        let rs = avg_gains / avg_losses.clone();
        let rsi = when(avg_losses.eq(lit(0.0)))
            .then(lit(100.0))
            .otherwise(lit(100.0) - (lit(100.0) / (lit(1.0) + rs)));

        Ok(rsi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rsi_values(closes: &[f64], period: usize) -> Vec<Option<f64>> {
        let df = df! { "close" => closes }.unwrap();
        let expr = RSI::new(period).calculate_vectorized(col("close")).unwrap();
        let out = df.lazy().select([expr.alias("rsi")]).collect().unwrap();
        out.column("rsi").unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn test_rsi_rising_prices_saturate() {
        let values = rsi_values(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);

        assert_eq!(values[0], None);
        assert_eq!(values[1], None);
        assert_eq!(values[2], Some(100.0));
        assert_eq!(values[4], Some(100.0));
    }

    #[test]
    fn test_rsi_wilder_smoothing() {
        // alpha = 0.5
        // gains:  0, 1, 0, 1  -> ewm 0, 0.5, 0.25, 0.625
        // losses: 0, 0, 1, 0  -> ewm 0, 0,   0.5,  0.25
        let values = rsi_values(&[10.0, 11.0, 10.0, 11.0], 2);

        assert_eq!(values[0], None);
        assert_eq!(values[1], Some(100.0));
        assert!((values[2].unwrap() - 100.0 / 3.0).abs() < 1e-9);
        assert!((values[3].unwrap() - (100.0 - 100.0 / 3.5)).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_falling_prices_bottom_out() {
        let values = rsi_values(&[5.0, 4.0, 3.0, 2.0, 1.0], 2);
        assert_eq!(values[4], Some(0.0));
    }

    #[test]
    fn test_rsi_metadata() {
        let rsi = RSI::new(14);
        assert_eq!(rsi.alias(), "RSI");
        assert_eq!(rsi.value_range(), Some((0.0, 100.0)));
        assert_eq!(rsi.warmup_bars(), 13);
        assert!(RSI::new(0).calculate_vectorized(col("close")).is_err());
    }
}
