//! Domain types for TradeLab

pub mod bar;
pub mod fill;
pub mod portfolio;
pub mod position;
pub mod series;
pub mod signal;
pub mod trade;

pub use bar::Bar;
pub use fill::{Fill, OrderSide};
pub use portfolio::Portfolio;
pub use position::Position;
pub use series::BarSeries;
pub use signal::Signal;
pub use trade::TradeRecord;

