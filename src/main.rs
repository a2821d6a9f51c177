use anyhow::Context;
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tradeevolve::config::AppConfig;
use tradeevolve::GaService;

/// Reads one JSON request per line from stdin (`{"op": "status"}`) and writes
/// one JSON response per line to stdout. Failures are `{"error", "code"}`.
///
/// An optional first argument names a TOML config file.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref()).context("Failed to load configuration")?;
    log::info!(
        "Configuration loaded: population {}, generation interval {:?}",
        config.evolution.population_size,
        config.schedule.generation_interval()
    );

    let service = GaService::new(config);
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read request")?;
        if line.trim().is_empty() {
            continue;
        }

        let (code, body) = match serde_json::from_str::<Value>(&line) {
            Ok(request) => service.handle(&request),
            Err(e) => {
                log::warn!("Malformed request: {}", e);
                (400, json!({ "error": format!("Malformed request: {}", e), "code": 400 }))
            }
        };

        log::debug!("Responded with {}", code);
        writeln!(stdout, "{}", body)?;
        stdout.flush()?;
    }

    log::info!("Input closed, shutting down");
    service.stop();
    Ok(())
}
