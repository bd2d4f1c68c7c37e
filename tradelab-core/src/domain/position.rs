use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// An open long holding in the simulated instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub quantity: f64,
    /// Volume-weighted average of all buys since the holding opened.
    pub avg_entry_price: f64,
    pub last_entry_price: f64,
    pub entry_bar: usize,
    pub entry_time: NaiveDateTime,
    /// Entry commission not yet realized by a sell.
    pub open_commission: f64,
}

impl Position {
    pub fn market_value(&self, current_price: f64) -> f64 {
        self.quantity * current_price
    }
}
