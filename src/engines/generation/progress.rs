use crate::types::TradeSignal;

/// Hooks the background evolution loop calls as it goes
pub trait ProgressCallback: Send {
    fn on_generation_start(&mut self, generation: u64, bars: usize);
    fn on_generation_complete(
        &mut self,
        generation: u64,
        best_fitness: f64,
        all_time_best: f64,
        signal: Option<&TradeSignal>,
    );
    fn on_population_reseeded(&mut self, generation: u64);
    fn on_insufficient_data(&mut self, bars: usize, required: usize);
}

pub struct LogProgressCallback;

impl ProgressCallback for LogProgressCallback {
    fn on_generation_start(&mut self, generation: u64, bars: usize) {
        log::info!("--- Starting generation {} on {} bars ---", generation, bars);
    }

    fn on_generation_complete(
        &mut self,
        generation: u64,
        best_fitness: f64,
        all_time_best: f64,
        signal: Option<&TradeSignal>,
    ) {
        log::info!(
            "Generation {} complete. Best fitness: {:.4}, all-time best: {:.4}",
            generation, best_fitness, all_time_best
        );
        if let Some(signal) = signal {
            log::info!(
                "Trade signal for generation {}: {:?} at {:.2}",
                signal.generation, signal.action, signal.price
            );
        }
    }

    fn on_population_reseeded(&mut self, generation: u64) {
        log::warn!(
            "No genome in generation {} produced a valid fitness, reseeding the population",
            generation
        );
    }

    fn on_insufficient_data(&mut self, bars: usize, required: usize) {
        log::info!(
            "Historical data has {} bars, {} required. Skipping generation",
            bars, required
        );
    }
}
