//! TradeRecord: a realized round trip (or partial round trip) entry to exit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A realized trade.
///
/// When a holding is built up over several buys, `entry_price` is the
/// volume-weighted average entry and `entry_bar` the bar that opened the
/// holding. Each sell, partial or full, realizes one record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Entry ──
    pub entry_bar: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_bar: usize,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,

    // ── Size ──
    pub quantity: f64,

    // ── PnL ──
    pub gross_pnl: f64,
    /// Exit commission plus the entry commission allocated to `quantity`.
    pub commission: f64,
    pub net_pnl: f64,

    pub bars_held: usize,
}

impl TradeRecord {
    /// Return on the trade as a fraction of entry cost.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 || self.quantity == 0.0 {
            return 0.0;
        }
        self.net_pnl / (self.entry_price * self.quantity)
    }

    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_trade() -> TradeRecord {
        let day = |d| {
            NaiveDate::from_ymd_opt(2024, 1, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };
        TradeRecord {
            entry_bar: 4,
            entry_time: day(5),
            entry_price: 100.0,
            exit_bar: 8,
            exit_time: day(11),
            exit_price: 110.0,
            quantity: 50.0,
            gross_pnl: 500.0,
            commission: 10.0,
            net_pnl: 490.0,
            bars_held: 4,
        }
    }

    #[test]
    fn return_pct_calculation() {
        let trade = sample_trade();
        let expected = 490.0 / (100.0 * 50.0);
        assert!((trade.return_pct() - expected).abs() < 1e-10);
    }

    #[test]
    fn is_winner() {
        assert!(sample_trade().is_winner());
        let mut loser = sample_trade();
        loser.net_pnl = 0.0;
        assert!(!loser.is_winner());
    }
}
