//! Candle data access port trait.

use crate::domain::candle::Candle;
use crate::domain::error::CopilotError;

pub trait DataPort {
    /// Candles for `symbol`, ascending by timestamp.
    fn fetch_candles(&self, symbol: &str) -> Result<Vec<Candle>, CopilotError>;
}
