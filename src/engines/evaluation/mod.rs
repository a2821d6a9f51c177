pub mod backtester;

pub use backtester::{FitnessEvaluator, FitnessResult};
