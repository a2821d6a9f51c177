use crate::config::AppConfig;
use crate::data::{parse_update_payload, DataValidator, HistoricalSeries};
use crate::engines::generation::{LogProgressCallback, ProgressCallback};
use crate::error::{GaError, Result};
use crate::services::evolution_runner::spawn_worker;
use crate::services::state::SharedState;
use crate::types::{Bar, ControlResponse, ErrorResponse, RunState, UpdateDataResponse};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Builds the progress sink handed to each new worker
pub type ProgressFactory = Arc<dyn Fn() -> Box<dyn ProgressCallback> + Send + Sync>;

/// Control surface of the optimizer: start, stop, poll and feed it data.
///
/// All methods take `&self` and may be called from any thread. At most one
/// background worker is active per service.
pub struct GaService {
    state: Arc<SharedState>,
    config: AppConfig,
    progress: ProgressFactory,
}

impl GaService {
    pub fn new(config: AppConfig) -> Self {
        Self::with_progress(
            config,
            Arc::new(|| Box::new(LogProgressCallback) as Box<dyn ProgressCallback>),
        )
    }

    pub fn with_progress(config: AppConfig, progress: ProgressFactory) -> Self {
        Self {
            state: Arc::new(SharedState::new()),
            config,
            progress,
        }
    }

    /// Start a run unless one is already active. A fresh run resets the
    /// generation counter and all-time best but keeps the loaded series.
    pub fn start(&self) -> Result<ControlResponse> {
        let mut state = self.state.lock();

        if state.is_running() {
            log::info!("Start requested but the GA is already running");
            return Ok(ControlResponse {
                message: "Genetic Algorithm already running.".to_string(),
                status: state.take_status(),
            });
        }

        let run_id = state.begin_run();
        let worker = match spawn_worker(
            Arc::clone(&self.state),
            run_id,
            self.config.clone(),
            (self.progress)(),
        ) {
            Ok(worker) => worker,
            Err(e) => {
                state.abort_run();
                log::error!("{}", e);
                return Err(e);
            }
        };
        state.set_worker(worker);
        let status = state.take_status();
        drop(state);

        log::info!("Genetic Algorithm started (run {})", run_id);
        Ok(ControlResponse {
            message: "Genetic Algorithm started.".to_string(),
            status,
        })
    }

    /// Signal the worker to stop and wait a bounded time for it to exit.
    /// A generation still being evaluated may finish in the background, but
    /// it can no longer write to the shared state.
    pub fn stop(&self) -> ControlResponse {
        let worker = {
            let mut state = self.state.lock();
            if state.request_stop() {
                log::info!("Stop signal sent to the evolution loop");
            } else {
                log::info!("Stop requested but the GA is not running");
            }
            state.take_worker()
        };
        self.state.notify();

        if let Some(worker) = worker {
            let timeout = self.config.schedule.stop_timeout();
            if worker.join_timeout(timeout) {
                log::debug!("Evolution worker joined");
            } else {
                log::warn!(
                    "Evolution worker still busy after {:?}, leaving it to finish",
                    timeout
                );
            }
        }

        ControlResponse {
            message: "Genetic Algorithm stopped.".to_string(),
            status: self.state.lock().take_status(),
        }
    }

    /// Current status. A pending trade signal is included once and then
    /// cleared.
    pub fn status(&self) -> RunState {
        self.state.lock().take_status()
    }

    /// Replace the series from an `update_data` payload (`{"klines": [...]}`)
    pub fn update_data(&self, payload: &Value) -> Result<UpdateDataResponse> {
        let count = parse_update_payload(payload)
            .and_then(|bars| self.replace_bars(bars))
            .map_err(|e| {
                if e.is_client_error() {
                    log::warn!("Rejected data update: {}", e);
                } else {
                    log::error!("Error processing data update: {}", e);
                }
                e
            })?;

        Ok(UpdateDataResponse {
            message: format!("Data updated with {} records.", count),
        })
    }

    /// Replace the series wholesale with already-typed bars. Returns the new
    /// bar count. The next generation picks the series up; one in flight
    /// keeps the snapshot it started with.
    pub fn replace_bars(&self, bars: Vec<Bar>) -> Result<usize> {
        DataValidator::validate_bars(&bars)?;
        let series = HistoricalSeries::from_bars(bars)?;
        let count = series.len();

        self.state.lock().replace_series(series);
        log::info!("Historical data updated with {} records", count);
        Ok(count)
    }

    /// Dispatch a JSON request of the form `{"op": "...", ...}`. Returns a
    /// status code and the JSON body to send back.
    pub fn handle(&self, request: &Value) -> (u16, Value) {
        let op = request.get("op").and_then(Value::as_str).unwrap_or_default();

        let outcome = match op {
            "start" => self.start().and_then(to_json),
            "stop" => to_json(self.stop()),
            "status" => to_json(self.status()),
            "update_data" => self.update_data(request).and_then(to_json),
            other => Err(GaError::UnknownOperation(other.to_string())),
        };

        match outcome {
            Ok(body) => (200, body),
            Err(e) => {
                let code = e.status_code();
                let body = serde_json::to_value(ErrorResponse::from(&e))
                    .unwrap_or_else(|_| Value::String(e.to_string()));
                (code, body)
            }
        }
    }
}

impl Drop for GaService {
    fn drop(&mut self) {
        // Signal only; a worker mid-generation finishes on its own
        if self.state.lock().request_stop() {
            log::debug!("GA service dropped while running, stopping the worker");
        }
        self.state.notify();
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::state::GenerationStart;
    use crate::types::TradeSignal;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    fn fast_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.evolution.seed = Some(7);
        config.schedule.insufficient_data_backoff_ms = 20;
        config.schedule.reseed_pause_ms = 20;
        config.schedule.generation_interval_ms = 20;
        config.schedule.stop_timeout_ms = 5_000;
        config
    }

    fn klines(closes: impl IntoIterator<Item = f64>) -> Value {
        let rows: Vec<Value> = closes
            .into_iter()
            .enumerate()
            .map(|(i, close)| {
                json!({
                    "time": 1_700_000_000 + i as i64 * 60,
                    "open": close, "high": close, "low": close, "close": close,
                    "volume": 1.0,
                })
            })
            .collect();
        json!({ "klines": rows })
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(30);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[derive(Default)]
    struct Counters {
        started: AtomicUsize,
        insufficient: AtomicUsize,
    }

    struct CountingCallback(Arc<Counters>);

    impl ProgressCallback for CountingCallback {
        fn on_generation_start(&mut self, _generation: u64, _bars: usize) {
            self.0.started.fetch_add(1, Ordering::SeqCst);
        }
        fn on_generation_complete(&mut self, _: u64, _: f64, _: f64, _: Option<&TradeSignal>) {}
        fn on_population_reseeded(&mut self, _generation: u64) {}
        fn on_insufficient_data(&mut self, _bars: usize, _required: usize) {
            self.0.insufficient.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_initial_status() {
        let service = GaService::new(fast_config());
        let status = service.status();
        assert!(!status.running);
        assert_eq!(status.generation, 0);
        assert_eq!(status.best_fitness, None);
        assert_eq!(status.best_genome, None);
        assert_eq!(status.last_trade, None);
    }

    #[test]
    fn test_second_start_reports_already_running() {
        let service = GaService::new(fast_config());
        let first = service.start().unwrap();
        assert_eq!(first.message, "Genetic Algorithm started.");
        assert!(first.status.running);

        let second = service.start().unwrap();
        assert_eq!(second.message, "Genetic Algorithm already running.");
        assert!(second.status.running);

        let stopped = service.stop();
        assert_eq!(stopped.message, "Genetic Algorithm stopped.");
        assert!(!stopped.status.running);
    }

    #[test]
    fn test_stop_when_idle_is_harmless() {
        let service = GaService::new(fast_config());
        let response = service.stop();
        assert_eq!(response.message, "Genetic Algorithm stopped.");
        assert!(!response.status.running);
    }

    #[test]
    fn test_insufficient_data_does_not_advance_generation() {
        let counters = Arc::new(Counters::default());
        let sink = Arc::clone(&counters);
        let service = GaService::with_progress(
            fast_config(),
            Arc::new(move || {
                Box::new(CountingCallback(Arc::clone(&sink))) as Box<dyn ProgressCallback>
            }),
        );
        service.update_data(&klines([1.0, 2.0, 3.0])).unwrap();
        service.start().unwrap();

        assert!(wait_for(|| counters.insufficient.load(Ordering::SeqCst) >= 3));
        assert_eq!(service.status().generation, 0);
        assert_eq!(counters.started.load(Ordering::SeqCst), 0);
        service.stop();
    }

    #[test]
    fn test_update_data_counts_records() {
        let service = GaService::new(fast_config());
        let response = service.update_data(&klines((0..150).map(|i| 100.0 + i as f64))).unwrap();
        assert_eq!(response.message, "Data updated with 150 records.");
    }

    #[test]
    fn test_missing_klines_is_rejected() {
        let service = GaService::new(fast_config());
        let err = service.update_data(&json!({})).unwrap_err();
        assert!(matches!(err, GaError::MissingKlines));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_unusable_bars_are_rejected_once_and_keep_series() {
        let service = GaService::new(fast_config());
        service.update_data(&klines([1.0, 2.0, 3.0])).unwrap();

        let mut payload = klines([1.0, 2.0]);
        payload["klines"][1]["volume"] = json!(-5.0);
        let err = service.update_data(&payload).unwrap_err();
        assert!(matches!(err, GaError::InvalidData(_)));
        assert!(err.to_string().contains("volume"), "{}", err);

        // The rejected update left the previous series in place
        let mut state = service.state.lock();
        let run = state.begin_run();
        match state.begin_generation(run, 0) {
            GenerationStart::Ready { series, .. } => assert_eq!(series.len(), 3),
            _ => panic!("run should be current"),
        }
        state.request_stop();
    }

    #[test]
    fn test_handle_dispatches_by_op() {
        let service = GaService::new(fast_config());

        let (code, body) = service.handle(&json!({"op": "status"}));
        assert_eq!(code, 200);
        assert_eq!(body["running"], json!(false));
        assert_eq!(body["best_fitness"], Value::Null);

        let (code, body) = service.handle(&json!({"op": "update_data"}));
        assert_eq!(code, 400);
        assert_eq!(body["error"], json!("Missing klines data"));

        let (code, body) = service.handle(&json!({"op": "restart"}));
        assert_eq!(code, 404);
        assert_eq!(body["code"], json!(404));
    }

    #[test]
    fn test_restart_resets_generation() {
        let service = GaService::new(fast_config());
        service.update_data(&klines((0..150).map(|i| 100.0 + (i as f64 / 7.0).sin()))).unwrap();

        service.start().unwrap();
        assert!(wait_for(|| service.status().generation >= 2));
        service.stop();

        let restarted = service.start().unwrap();
        assert_eq!(restarted.message, "Genetic Algorithm started.");
        assert_eq!(restarted.status.generation, 0);
        service.stop();
    }
}
