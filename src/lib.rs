pub mod config;
pub mod data;
pub mod engines;
pub mod error;
pub mod functions;
pub mod services;
pub mod types;

pub use error::{GaError, Result};
pub use services::GaService;
