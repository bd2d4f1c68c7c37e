//! Portfolio: cash plus the (at most one) open holding.

use super::position::Position;

/// Single-instrument portfolio state.
///
/// The equity accounting identity must hold at every bar:
/// `equity == cash + position market value`. Cash never goes negative
/// (no margin) and the holding is never short.
#[derive(Debug, Clone)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_cash: f64,
    pub position: Option<Position>,
    pub total_commission: f64,
}

impl Portfolio {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            initial_cash,
            position: None,
            total_commission: 0.0,
        }
    }

    /// Total equity = cash + holding marked at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        let position_value = self
            .position
            .as_ref()
            .map_or(0.0, |pos| pos.market_value(price));
        self.cash + position_value
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    pub fn units(&self) -> f64 {
        self.position.as_ref().map_or(0.0, |p| p.quantity)
    }
}
