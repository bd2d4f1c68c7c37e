use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// An executed order at a bar's close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    pub side: OrderSide,
    pub price: f64,
    pub quantity: f64,
    pub commission: f64,
}

impl Fill {
    pub fn notional(&self) -> f64 {
        self.price * self.quantity
    }

    /// Cash moved by the fill: cost for buys (positive), proceeds for sells.
    pub fn net_amount(&self) -> f64 {
        match self.side {
            OrderSide::Buy => self.notional() + self.commission,
            OrderSide::Sell => self.notional() - self.commission,
        }
    }
}
