use anyhow::Result;
use polars::prelude::*;

/// Base trait for all indicators
pub trait Indicator: Send + Sync {
    /// Display name
    fn ui_name(&self) -> &'static str;

    /// Short alias used in logs
    fn alias(&self) -> &'static str;

    /// Expected value range
    fn value_range(&self) -> Option<(f64, f64)>;

    /// Bars consumed before the first non-null output
    fn warmup_bars(&self) -> usize;
}

/// Trait for vectorized indicators (used in backtesting)
pub trait VectorizedIndicator: Indicator {
    /// Calculate over an entire input column using Polars expressions
    fn calculate_vectorized(&self, series: Expr) -> Result<Expr>;
}
