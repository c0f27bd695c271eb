use crate::domain::Candle;
use std::path::Path;

/// Save bars to a CSV cache file
pub fn save_bars(bars: &[Candle], path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record([
        "open_time",
        "open",
        "high",
        "low",
        "close",
        "volume",
        "close_time",
    ])?;

    for bar in bars {
        writer.write_record(&[
            bar.open_time.to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
            bar.close_time.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Load bars from a CSV cache file
pub fn load_bars(path: &str) -> Result<Vec<Candle>, Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        return Err(format!("Bar file not found: {}", path).into());
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut bars = Vec::new();

    for result in reader.records() {
        let record = result?;
        bars.push(Candle {
            open_time: record[0].parse()?,
            open: record[1].parse()?,
            high: record[2].parse()?,
            low: record[3].parse()?,
            close: record[4].parse()?,
            volume: record[5].parse()?,
            close_time: record[6].parse()?,
        });
    }

    // Verify temporal ordering
    for i in 1..bars.len() {
        if bars[i].open_time < bars[i - 1].open_time {
            return Err("Bar file has non-monotonic timestamps".into());
        }
    }

    Ok(bars)
}

/// Cache path for a symbol's 15m bars
pub fn bars_path(symbol: &str, data_dir: &str) -> String {
    format!("{}/{}_15m.csv", data_dir, symbol.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bar(open_time: i64, close: f64) -> Candle {
        Candle {
            open_time,
            open: close - 0.5,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 500.0,
            close_time: open_time + 899_999,
        }
    }

    #[test]
    fn test_csv_round_trip() {
        let bars = vec![make_bar(1000, 100.5), make_bar(901_000, 101.0)];

        let dir = tempfile::tempdir().unwrap();
        let path = format!("{}/test.csv", dir.path().display());

        save_bars(&bars, &path).unwrap();
        let loaded = load_bars(&path).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].open_time, 1000);
        assert!((loaded[1].close - 101.0).abs() < 1e-10);
        assert_eq!(loaded, bars);
    }

    #[test]
    fn test_load_nonexistent_file() {
        assert!(load_bars("/tmp/does_not_exist_colmena_test.csv").is_err());
    }

    #[test]
    fn test_non_monotonic_file_rejected() {
        let bars = vec![make_bar(901_000, 101.0), make_bar(1000, 100.5)];
        let dir = tempfile::tempdir().unwrap();
        let path = format!("{}/unsorted.csv", dir.path().display());
        save_bars(&bars, &path).unwrap();
        assert!(load_bars(&path).is_err());
    }

    #[test]
    fn test_bars_path_format() {
        assert_eq!(bars_path("BTCUSDT", "/data"), "/data/btcusdt_15m.csv");
    }

    #[test]
    fn test_empty_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = format!("{}/empty.csv", dir.path().display());
        save_bars(&[], &path).unwrap();
        assert!(load_bars(&path).unwrap().is_empty());
    }
}
