pub mod klines;
pub mod series;
pub mod validator;

pub use klines::{parse_update_payload, Kline};
pub use series::HistoricalSeries;
pub use validator::DataValidator;
