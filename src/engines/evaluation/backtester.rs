use crate::{
    data::HistoricalSeries,
    engines::generation::Genome,
    error::{GaError, Result},
    functions::{
        indicators::{RSI, SMA},
        traits::{Indicator, VectorizedIndicator},
    },
    types::{TradeAction, TradeSignal},
};
use polars::prelude::*;
use std::panic::{self, AssertUnwindSafe};

/// Outcome of backtesting one genome
#[derive(Debug, Clone, PartialEq)]
pub struct FitnessResult {
    /// Terminal equity multiple, `f64::NEG_INFINITY` when invalid
    pub fitness: f64,
    /// Desired position per bar: 1 long, -1 exit, 0 flat
    pub positions: Vec<i8>,
}

impl FitnessResult {
    pub fn invalid() -> Self {
        Self {
            fitness: f64::NEG_INFINITY,
            positions: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.fitness.is_finite()
    }

    pub fn final_position(&self) -> i8 {
        self.positions.last().copied().unwrap_or(0)
    }

    /// Trade signal implied by the final desired position, if any
    pub fn trade_signal(&self, price: f64, generation: u64) -> Option<TradeSignal> {
        TradeAction::from_position(self.final_position()).map(|action| TradeSignal {
            action,
            price,
            generation,
        })
    }
}

/// Vectorized long/flat crossover backtest with next-bar execution.
///
/// Long when the fast average is above the slow average and RSI is below
/// `rsi_high`; exit (-1) when the fast average is below the slow one. The
/// position is applied one bar after the signal, no costs are charged.
pub struct FitnessEvaluator;

impl FitnessEvaluator {
    /// Fails soft: any problem yields [`FitnessResult::invalid`].
    pub fn evaluate(genome: &Genome, series: &HistoricalSeries) -> FitnessResult {
        if series.len() <= genome.slow_window as usize || !genome.is_ordered() {
            return FitnessResult::invalid();
        }

        match panic::catch_unwind(AssertUnwindSafe(|| Self::run(genome, series.frame()))) {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                log::debug!("Genome {:?} scored invalid: {}", genome, e);
                FitnessResult::invalid()
            }
            Err(_) => {
                log::warn!("Backtest of genome {:?} panicked, scoring it invalid", genome);
                FitnessResult::invalid()
            }
        }
    }

    fn run(genome: &Genome, data: &DataFrame) -> Result<FitnessResult> {
        let close = col("close");

        let fast = SMA::new(genome.fast_window as usize);
        let slow = SMA::new(genome.slow_window as usize);
        let rsi = RSI::new(genome.rsi_window as usize);
        let with_indicators = data
            .clone()
            .lazy()
            .select([
                close.clone(),
                indicator_column(&fast, close.clone(), "ma_fast")?,
                indicator_column(&slow, close.clone(), "ma_slow")?,
                indicator_column(&rsi, close.clone(), "rsi")?,
            ])
            .collect()?;

        let height = with_indicators.height();
        if with_indicators.column("ma_fast")?.null_count() == height
            || with_indicators.column("ma_slow")?.null_count() == height
        {
            return Err(GaError::BacktestError("moving averages are undefined".to_string()));
        }

        let long = col("ma_fast")
            .gt(col("ma_slow"))
            .and(col("rsi").lt(lit(genome.rsi_high as f64)));
        let exit = col("ma_fast").lt(col("ma_slow"));
        let position = when(long)
            .then(lit(1.0))
            .when(exit)
            .then(lit(-1.0))
            .otherwise(lit(0.0));

        let returns = col("close") / col("close").shift(lit(1)) - lit(1.0);
        // Yesterday's position earns today's return
        let strategy_returns = (col("returns") * col("position").shift(lit(1))).fill_null(lit(0.0));

        let result = with_indicators
            .lazy()
            .with_columns([position.alias("position"), returns.alias("returns")])
            .with_column(strategy_returns.alias("strategy_returns"))
            .with_column((lit(1.0) + col("strategy_returns")).cum_prod(false).alias("equity"))
            .collect()?;

        let equity = result.column("equity")?.f64()?;
        let fitness = match equity.get(equity.len().saturating_sub(1)) {
            Some(value) if value.is_finite() => value,
            other => {
                return Err(GaError::BacktestError(format!(
                    "final equity is not finite: {:?}",
                    other
                )))
            }
        };

        let positions = result
            .column("position")?
            .f64()?
            .into_iter()
            .map(|p| p.unwrap_or(0.0) as i8)
            .collect();

        Ok(FitnessResult { fitness, positions })
    }
}

fn indicator_column(indicator: &dyn VectorizedIndicator, input: Expr, name: &str) -> Result<Expr> {
    indicator
        .calculate_vectorized(input)
        .map(|expr| expr.alias(name))
        .map_err(|e| {
            let name = format!("{} ({})", indicator.ui_name(), indicator.alias());
            GaError::IndicatorError(format!("{}: {}", name, e))
        })
}
