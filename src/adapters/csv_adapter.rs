//! CSV candle file adapter.
//!
//! One file per symbol, `<base_path>/<symbol>.csv`, with the header
//! `timestamp,open,high,low,close,volume`. Timestamps are ISO 8601
//! (`2024-01-15T00:00:00`, optional fractional seconds) or a bare date.

use crate::domain::candle::Candle;
use crate::domain::error::CopilotError;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const HEADER: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Adapter rooted at the file's directory, plus the symbol naming the file.
    ///
    /// Paths without a `.csv` extension are a data error.
    pub fn for_file(path: &Path) -> Result<(Self, String), CopilotError> {
        if path.extension().is_none_or(|ext| ext != "csv") {
            return Err(CopilotError::Data {
                reason: format!("price file must have a .csv extension: {}", path.display()),
            });
        }
        let symbol = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| CopilotError::Data {
                reason: format!("not a file path: {}", path.display()),
            })?;
        let base = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok((Self::new(base), symbol))
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, CopilotError> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|e| CopilotError::Data {
            reason: format!("invalid timestamp {value:?}: {e}"),
        })
}

fn parse_field(record: &csv::StringRecord, index: usize) -> Result<f64, CopilotError> {
    let name = HEADER[index];
    record
        .get(index)
        .ok_or_else(|| CopilotError::Data {
            reason: format!("missing {name} column"),
        })?
        .trim()
        .parse()
        .map_err(|e| CopilotError::Data {
            reason: format!("invalid {name} value: {e}"),
        })
}

/// Parse candle rows from any reader, sorted ascending by timestamp.
pub fn read_candles<R: std::io::Read>(reader: R) -> Result<Vec<Candle>, CopilotError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut candles = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| CopilotError::Data {
            reason: format!("CSV parse error: {}", e),
        })?;

        let ts_str = record.get(0).ok_or_else(|| CopilotError::Data {
            reason: "missing timestamp column".into(),
        })?;

        candles.push(Candle {
            timestamp: parse_timestamp(ts_str)?,
            open: parse_field(&record, 1)?,
            high: parse_field(&record, 2)?,
            low: parse_field(&record, 3)?,
            close: parse_field(&record, 4)?,
            volume: parse_field(&record, 5)?,
        });
    }

    candles.sort_by_key(|c| c.timestamp);
    Ok(candles)
}

/// Write candles in the format [`read_candles`] accepts.
pub fn write_candles<W: Write>(writer: W, candles: &[Candle]) -> Result<(), CopilotError> {
    let to_data_err = |e: csv::Error| CopilotError::Data {
        reason: format!("CSV write error: {}", e),
    };
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER).map_err(to_data_err)?;
    for c in candles {
        wtr.write_record([
            c.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            c.open.to_string(),
            c.high.to_string(),
            c.low.to_string(),
            c.close.to_string(),
            c.volume.to_string(),
        ])
        .map_err(to_data_err)?;
    }
    wtr.flush()?;
    Ok(())
}

impl DataPort for CsvAdapter {
    fn fetch_candles(&self, symbol: &str) -> Result<Vec<Candle>, CopilotError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| CopilotError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        read_candles(content.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "timestamp,open,high,low,close,volume\n\
            2024-01-16T00:00:00,105.0,115.0,100.0,110.0,60.5\n\
            2024-01-15T00:00:00,100.0,110.0,90.0,105.0,50\n\
            2024-01-17,110.0,120.0,105.0,115.0,55\n";

        fs::write(path.join("BTC.csv"), csv_content).unwrap();
        fs::write(path.join("ETH.csv"), "timestamp,open,high,low,close,volume\n").unwrap();

        (dir, path)
    }

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn fetch_candles_returns_sorted_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let candles = adapter.fetch_candles("BTC").unwrap();

        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0].timestamp, ts(15));
        assert_eq!(candles[0].open, 100.0);
        assert_eq!(candles[0].high, 110.0);
        assert_eq!(candles[0].low, 90.0);
        assert_eq!(candles[0].close, 105.0);
        assert_eq!(candles[0].volume, 50.0);
        assert_eq!(candles[1].volume, 60.5);
        assert_eq!(candles[2].timestamp, ts(17));
    }

    #[test]
    fn fetch_candles_empty_file() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert!(adapter.fetch_candles("ETH").unwrap().is_empty());
    }

    #[test]
    fn fetch_candles_errors_for_missing_file() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let err = adapter.fetch_candles("XYZ").unwrap_err();
        assert!(matches!(err, CopilotError::Data { .. }));
    }

    #[test]
    fn invalid_number_is_data_error() {
        let csv = "timestamp,open,high,low,close,volume\n2024-01-15,abc,1,1,1,1\n";
        let err = read_candles(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("invalid open value"));
    }

    #[test]
    fn invalid_timestamp_is_data_error() {
        let csv = "timestamp,open,high,low,close,volume\n15/01/2024,1,1,1,1,1\n";
        assert!(read_candles(csv.as_bytes()).is_err());
    }

    #[test]
    fn written_candles_read_back() {
        let candles = vec![Candle {
            timestamp: ts(15) + chrono::Duration::milliseconds(250),
            open: 1.5,
            high: 2.0,
            low: 1.0,
            close: 1.75,
            volume: 123.25,
        }];
        let mut buf = Vec::new();
        write_candles(&mut buf, &candles).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("timestamp,open,high,low,close,volume\n"));
        assert_eq!(read_candles(buf.as_slice()).unwrap(), candles);
    }

    #[test]
    fn for_file_splits_dir_and_symbol() {
        let (_dir, path) = setup_test_data();
        let (adapter, symbol) = CsvAdapter::for_file(&path.join("BTC.csv")).unwrap();
        assert_eq!(symbol, "BTC");
        assert_eq!(adapter.fetch_candles(&symbol).unwrap().len(), 3);
    }

    #[test]
    fn for_file_rejects_other_extensions() {
        let (_dir, path) = setup_test_data();
        fs::write(path.join("data.txt"), "timestamp,open,high,low,close,volume\n").unwrap();
        fs::write(
            path.join("data.csv"),
            "timestamp,open,high,low,close,volume\n2024-01-15,9,9,9,9,1\n",
        )
        .unwrap();

        for name in ["data.txt", "BTC"] {
            let err = CsvAdapter::for_file(&path.join(name)).err().unwrap();
            assert!(matches!(err, CopilotError::Data { .. }), "{name}");
        }
    }
}
