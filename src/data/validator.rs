use crate::error::{Result, GaError};
use crate::types::Bar;

pub struct DataValidator;

impl DataValidator {
    /// Reject bars that cannot be evaluated (non-finite prices, bad volume).
    pub fn validate_bars(bars: &[Bar]) -> Result<()> {
        for (i, bar) in bars.iter().enumerate() {
            let prices = [
                ("open", bar.open),
                ("high", bar.high),
                ("low", bar.low),
                ("close", bar.close),
            ];
            for (name, value) in prices {
                if !value.is_finite() {
                    return Err(GaError::InvalidData(format!(
                        "Invalid data at row {}: {} is not a finite number",
                        i, name
                    )));
                }
            }
            if !bar.volume.is_finite() || bar.volume < 0.0 {
                return Err(GaError::InvalidData(format!(
                    "Invalid data at row {}: volume ({}) must be a non-negative number",
                    i, bar.volume
                )));
            }
        }
        Ok(())
    }

    /// OHLC relationship problems (high >= low, high >= open/close, ...).
    /// These are reported, not rejected: only closes feed the fitness model.
    pub fn ohlc_anomalies(bars: &[Bar]) -> Vec<String> {
        let mut anomalies = Vec::new();

        for (i, bar) in bars.iter().enumerate() {
            if bar.high < bar.low {
                anomalies.push(format!("row {}: high ({}) < low ({})", i, bar.high, bar.low));
            } else if bar.high < bar.open || bar.high < bar.close {
                anomalies.push(format!(
                    "row {}: high ({}) < open ({}) or close ({})",
                    i, bar.high, bar.open, bar.close
                ));
            } else if bar.low > bar.open || bar.low > bar.close {
                anomalies.push(format!(
                    "row {}: low ({}) > open ({}) or close ({})",
                    i, bar.low, bar.open, bar.close
                ));
            }
        }

        anomalies
    }

    /// Indices where a bar's timestamp does not advance past its predecessor
    pub fn out_of_order(bars: &[Bar]) -> Vec<usize> {
        bars.windows(2)
            .enumerate()
            .filter(|(_, pair)| pair[1].time <= pair[0].time)
            .map(|(i, _)| i + 1)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bar(ts: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            time: Utc.timestamp_opt(ts, 0).unwrap(),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn test_validate_good_data() {
        let bars = vec![
            bar(0, 100.0, 101.0, 99.0, 100.5),
            bar(60, 101.0, 103.0, 100.0, 102.0),
        ];
        assert!(DataValidator::validate_bars(&bars).is_ok());
        assert!(DataValidator::ohlc_anomalies(&bars).is_empty());
        assert!(DataValidator::out_of_order(&bars).is_empty());
    }

    #[test]
    fn test_rejects_non_finite_close() {
        let bars = vec![bar(0, 100.0, 101.0, 99.0, f64::NAN)];
        let err = DataValidator::validate_bars(&bars).unwrap_err();
        assert!(err.to_string().contains("close"));
    }

    #[test]
    fn test_rejects_negative_volume() {
        let mut b = bar(0, 100.0, 101.0, 99.0, 100.0);
        b.volume = -1.0;
        assert!(DataValidator::validate_bars(&[b]).is_err());
    }

    #[test]
    fn test_reports_invalid_ohlc() {
        let bars = vec![
            bar(0, 100.0, 99.0, 99.0, 100.5), // high < open
            bar(60, 101.0, 103.0, 100.0, 102.0),
        ];
        let anomalies = DataValidator::ohlc_anomalies(&bars);
        assert_eq!(anomalies.len(), 1);
        assert!(anomalies[0].starts_with("row 0"));
    }

    #[test]
    fn test_reports_out_of_order_timestamps() {
        let bars = vec![
            bar(120, 100.0, 101.0, 99.0, 100.0),
            bar(60, 100.0, 101.0, 99.0, 100.0),
            bar(180, 100.0, 101.0, 99.0, 100.0),
        ];
        assert_eq!(DataValidator::out_of_order(&bars), vec![1]);
    }
}
