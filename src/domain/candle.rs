//! OHLCV candle representation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Open and close strictly positive, everything else non-negative.
    pub fn is_well_formed(&self) -> bool {
        self.open > 0.0
            && self.close > 0.0
            && self.high >= 0.0
            && self.low >= 0.0
            && self.volume >= 0.0
    }
}

/// Non-strictly ascending by timestamp.
pub fn is_ordered(candles: &[Candle]) -> bool {
    candles.windows(2).all(|w| w[0].timestamp <= w[1].timestamp)
}
