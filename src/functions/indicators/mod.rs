pub mod momentum;
pub mod trend;

pub use momentum::RSI;
pub use trend::SMA;
