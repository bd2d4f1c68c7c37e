//! Execution simulator: signals in, portfolio trajectory out.
//!
//! The simulator consumes a validated bar series and one signal per bar, then
//! runs a single-instrument, long-only bar loop:
//!
//! 1. Size an order from the bar's signal and the strategy's sizing mode
//! 2. Fill at the close, apply commission, update cash and the holding
//! 3. Mark to market and record equity

pub mod portfolio_update;
pub mod simulator;
pub mod state;

pub use portfolio_update::apply_fill;
pub use simulator::simulate;
pub use state::{SimConfig, SimulationResult};
