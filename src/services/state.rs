use crate::data::HistoricalSeries;
use crate::engines::generation::Genome;
use crate::types::{RunState, TradeSignal};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

/// Join handle of the background worker plus a channel that disconnects
/// when the worker's closure returns (or unwinds).
pub(crate) struct WorkerHandle {
    handle: JoinHandle<()>,
    done: Receiver<()>,
}

impl WorkerHandle {
    pub(crate) fn new(handle: JoinHandle<()>, done: Receiver<()>) -> Self {
        Self { handle, done }
    }

    /// Wait up to `timeout` for the worker to exit. Returns false if it is
    /// still running; the thread is then left to finish on its own.
    pub(crate) fn join_timeout(self, timeout: Duration) -> bool {
        match self.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if self.handle.join().is_err() {
                    log::error!("Evolution worker panicked");
                }
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
        }
    }
}

/// Outcome of [`StoreInner::begin_generation`]
pub(crate) enum GenerationStart {
    Stopped,
    Insufficient { bars: usize },
    Ready {
        generation: u64,
        series: HistoricalSeries,
    },
}

/// Everything the service and the worker share. Only reachable through the
/// [`SharedState`] lock.
pub(crate) struct StoreInner {
    running: bool,
    /// Incremented by every start; a worker only acts while its id is current
    run_id: u64,
    generation: u64,
    best_fitness: Option<f64>,
    best_genome: Option<Genome>,
    last_trade: Option<TradeSignal>,
    series: HistoricalSeries,
    worker: Option<WorkerHandle>,
}

impl StoreInner {
    fn new() -> Self {
        Self {
            running: false,
            run_id: 0,
            generation: 0,
            best_fitness: None,
            best_genome: None,
            last_trade: None,
            series: HistoricalSeries::default(),
            worker: None,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn is_current(&self, run_id: u64) -> bool {
        self.running && self.run_id == run_id
    }

    /// Reset the search state and open a new run. The series is kept.
    pub(crate) fn begin_run(&mut self) -> u64 {
        self.generation = 0;
        self.best_fitness = None;
        self.best_genome = None;
        self.last_trade = None;
        self.running = true;
        self.run_id += 1;
        self.run_id
    }

    /// Undo `begin_run` when the worker could not be launched
    pub(crate) fn abort_run(&mut self) {
        self.running = false;
    }

    /// Clear the run flag; returns whether a run was active
    pub(crate) fn request_stop(&mut self) -> bool {
        std::mem::replace(&mut self.running, false)
    }

    pub(crate) fn set_worker(&mut self, worker: WorkerHandle) {
        if self.worker.replace(worker).is_some() {
            log::debug!("Detached a previous evolution worker that had not been joined");
        }
    }

    pub(crate) fn take_worker(&mut self) -> Option<WorkerHandle> {
        self.worker.take()
    }

    /// Status projection; a pending trade signal is handed out once.
    pub(crate) fn take_status(&mut self) -> RunState {
        RunState {
            running: self.running,
            generation: self.generation,
            best_fitness: self.best_fitness,
            best_genome: self.best_genome,
            last_trade: self.last_trade.take(),
        }
    }

    pub(crate) fn replace_series(&mut self, series: HistoricalSeries) {
        self.series = series;
    }

    /// Checkpoint at the top of a generation attempt. Clears the mailbox,
    /// then either counts the generation and hands out a snapshot of the
    /// series, or reports that the series is too short without counting.
    pub(crate) fn begin_generation(&mut self, run_id: u64, min_bars: usize) -> GenerationStart {
        if !self.is_current(run_id) {
            return GenerationStart::Stopped;
        }
        self.last_trade = None;
        if self.series.len() < min_bars {
            return GenerationStart::Insufficient {
                bars: self.series.len(),
            };
        }
        self.generation += 1;
        GenerationStart::Ready {
            generation: self.generation,
            series: self.series.clone(),
        }
    }

    /// The attempt did not count as a generation. Applies to any attempt of
    /// `run_id`, even one interrupted by `stop`; returns whether the run is
    /// still current.
    pub(crate) fn rollback_generation(&mut self, run_id: u64) -> bool {
        if self.run_id != run_id {
            return false;
        }
        self.generation = self.generation.saturating_sub(1);
        self.is_current(run_id)
    }

    /// Checkpoint before publishing: record the generation's best and its
    /// trade signal. Returns the all-time best fitness, or `None` when the
    /// run is no longer current and nothing was written.
    pub(crate) fn publish(
        &mut self,
        run_id: u64,
        genome: Genome,
        fitness: f64,
        signal: Option<TradeSignal>,
    ) -> Option<f64> {
        if !self.is_current(run_id) {
            return None;
        }

        if self.best_fitness.map_or(true, |best| fitness > best) {
            log::info!(
                "New global best found in generation {}! Fitness: {:.4}, genome: {:?}",
                self.generation, fitness, genome
            );
            self.best_fitness = Some(fitness);
            self.best_genome = Some(genome);
        }
        if signal.is_some() {
            self.last_trade = signal;
        }

        self.best_fitness
    }
}

/// The single lock around all shared state, plus the condition variable the
/// worker sleeps on between generations.
pub(crate) struct SharedState {
    inner: Mutex<StoreInner>,
    wake: Condvar,
}

impl SharedState {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner::new()),
            wake: Condvar::new(),
        }
    }

    /// A panic elsewhere never leaves the store half-written, so a poisoned
    /// lock is recovered rather than propagated.
    pub(crate) fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wake a sleeping worker so it re-checks its run
    pub(crate) fn notify(&self) {
        self.wake.notify_all();
    }

    /// Sleep up to `timeout` unless the run stops first. Returns whether the
    /// run is still current afterwards.
    pub(crate) fn wait_while_current(&self, run_id: u64, timeout: Duration) -> bool {
        let guard = self.lock();
        let (guard, _) = self
            .wake
            .wait_timeout_while(guard, timeout, |state| state.is_current(run_id))
            .unwrap_or_else(PoisonError::into_inner);
        guard.is_current(run_id)
    }
}
