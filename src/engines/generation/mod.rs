pub mod evolution_engine;
pub mod genome;
pub mod operators;
pub mod progress;

pub use evolution_engine::{EvaluatedPopulation, EvolutionEngine};
pub use genome::{Gene, GeneBounds, Genome};
pub use progress::{LogProgressCallback, ProgressCallback};
