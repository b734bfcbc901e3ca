//! Closed round-trip trades produced by the simulator.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
}

impl Trade {
    /// (exit - entry) * quantity
    pub fn pnl(&self) -> f64 {
        (self.exit_price - self.entry_price) * self.quantity
    }

    /// Percent move from entry to exit; 0 when the entry price is 0.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        (self.exit_price - self.entry_price) / self.entry_price * 100.0
    }

    pub fn is_win(&self) -> bool {
        self.pnl() > 0.0
    }
}
