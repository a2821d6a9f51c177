pub mod api;
pub mod evolution_runner;
pub(crate) mod state;

pub use api::{GaService, ProgressFactory};
