use crate::config::{AppConfig, ScheduleConfig};
use crate::engines::generation::{EvolutionEngine, ProgressCallback};
use crate::error::{GaError, Result};
use crate::services::state::{GenerationStart, SharedState, WorkerHandle};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Spawn the background evolution loop for `run_id`
pub(crate) fn spawn_worker(
    state: Arc<SharedState>,
    run_id: u64,
    config: AppConfig,
    progress: Box<dyn ProgressCallback>,
) -> Result<WorkerHandle> {
    let (done_tx, done_rx) = channel::<()>();

    let handle = thread::Builder::new()
        .name(format!("ga-evolution-{}", run_id))
        .spawn(move || {
            // Dropped when this closure returns or unwinds
            let _done = done_tx;
            EvolutionRunner::new(state, run_id, config, progress).run();
        })
        .map_err(|e| GaError::Worker(format!("Failed to spawn evolution thread: {}", e)))?;

    Ok(WorkerHandle::new(handle, done_rx))
}

/// One run of the generational loop. Owns its engine; touches shared state
/// only at checkpoints, each of which first confirms the run is still current.
struct EvolutionRunner {
    state: Arc<SharedState>,
    run_id: u64,
    schedule: ScheduleConfig,
    engine: EvolutionEngine,
    progress: Box<dyn ProgressCallback>,
}

impl EvolutionRunner {
    fn new(
        state: Arc<SharedState>,
        run_id: u64,
        config: AppConfig,
        progress: Box<dyn ProgressCallback>,
    ) -> Self {
        log::info!(
            "Evolution thread started (run {}). Population: {}, parents: {}, mutation rate: {}",
            run_id,
            config.evolution.population_size,
            config.evolution.num_parents,
            config.evolution.mutation_rate
        );

        Self {
            state,
            run_id,
            schedule: config.schedule,
            engine: EvolutionEngine::new(config.evolution),
            progress,
        }
    }

    fn run(mut self) {
        while self.step() {}
        log::info!("Detected stop signal. Exiting evolution loop (run {}).", self.run_id);
    }

    /// One generation attempt; false once the run is over
    fn step(&mut self) -> bool {
        let start = self
            .state
            .lock()
            .begin_generation(self.run_id, self.schedule.min_bars);
        let (generation, series) = match start {
            GenerationStart::Ready { generation, series } => (generation, series),
            GenerationStart::Insufficient { bars } => {
                self.progress.on_insufficient_data(bars, self.schedule.min_bars);
                return self
                    .state
                    .wait_while_current(self.run_id, self.schedule.insufficient_data_backoff());
            }
            GenerationStart::Stopped => return false,
        };

        self.progress.on_generation_start(generation, series.len());
        let evaluated = self.engine.evaluate(&series);
        log::debug!(
            "Generation {}: {}/{} genomes valid",
            generation,
            evaluated.valid_count(),
            evaluated.genomes.len()
        );

        let Some((best_genome, best_result)) = evaluated.best() else {
            self.progress.on_population_reseeded(generation);
            self.engine.reseed();
            return self.skip_generation(self.schedule.reseed_pause());
        };

        let signal = series
            .last_close()
            .and_then(|price| best_result.trade_signal(price, generation));

        let published =
            self.state
                .lock()
                .publish(self.run_id, best_genome, best_result.fitness, signal);
        let Some(all_time_best) = published else {
            return false;
        };
        self.progress.on_generation_complete(
            generation,
            best_result.fitness,
            all_time_best,
            signal.as_ref(),
        );

        self.engine.breed(&evaluated);

        self.state
            .wait_while_current(self.run_id, self.schedule.generation_interval())
    }

    /// The attempt does not count: roll the counter back, then pause
    fn skip_generation(&self, pause: Duration) -> bool {
        if !self.state.lock().rollback_generation(self.run_id) {
            return false;
        }
        self.state.wait_while_current(self.run_id, pause)
    }
}
