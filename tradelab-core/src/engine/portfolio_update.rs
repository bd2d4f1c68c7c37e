//! Portfolio update: applies fills to the portfolio.
//!
//! Handles opening and averaging into the holding, partial and full exits,
//! realized P&L and cash accounting. Sells realize one [`TradeRecord`] each.

use crate::domain::{Fill, OrderSide, Portfolio, Position, TradeRecord};

/// Remaining quantity below which a holding counts as closed.
const FLAT_EPSILON: f64 = 1e-10;

/// Apply one fill. Returns the realized trade for a sell, `None` for a buy
/// (or for a sell against a flat portfolio, which the simulator never sends).
pub fn apply_fill(fill: &Fill, portfolio: &mut Portfolio) -> Option<TradeRecord> {
    portfolio.total_commission += fill.commission;
    match fill.side {
        OrderSide::Buy => {
            apply_buy_fill(fill, portfolio);
            None
        }
        OrderSide::Sell => apply_sell_fill(fill, portfolio),
    }
}

/// Deduct cost from cash, then open a holding or average into it.
fn apply_buy_fill(fill: &Fill, portfolio: &mut Portfolio) {
    portfolio.cash -= fill.net_amount();

    match portfolio.position.as_mut() {
        Some(pos) => {
            let total_qty = pos.quantity + fill.quantity;
            pos.avg_entry_price =
                (pos.avg_entry_price * pos.quantity + fill.price * fill.quantity) / total_qty;
            pos.quantity = total_qty;
            pos.last_entry_price = fill.price;
            pos.open_commission += fill.commission;
        }
        None => {
            portfolio.position = Some(Position {
                quantity: fill.quantity,
                avg_entry_price: fill.price,
                last_entry_price: fill.price,
                entry_bar: fill.bar_index,
                entry_time: fill.timestamp,
                open_commission: fill.commission,
            });
        }
    }
}

/// Add proceeds to cash, reduce or close the holding and realize the trade.
fn apply_sell_fill(fill: &Fill, portfolio: &mut Portfolio) -> Option<TradeRecord> {
    let pos = portfolio.position.as_mut()?;
    let quantity = fill.quantity.min(pos.quantity);
    let fraction = quantity / pos.quantity;
    let entry_commission = pos.open_commission * fraction;

    let gross_pnl = (fill.price - pos.avg_entry_price) * quantity;
    let commission = entry_commission + fill.commission;
    let trade = TradeRecord {
        entry_bar: pos.entry_bar,
        entry_time: pos.entry_time,
        entry_price: pos.avg_entry_price,
        exit_bar: fill.bar_index,
        exit_time: fill.timestamp,
        exit_price: fill.price,
        quantity,
        gross_pnl,
        commission,
        net_pnl: gross_pnl - commission,
        bars_held: fill.bar_index.saturating_sub(pos.entry_bar),
    };

    portfolio.cash += fill.net_amount();
    pos.quantity -= quantity;
    pos.open_commission -= entry_commission;
    if pos.quantity <= FLAT_EPSILON {
        portfolio.position = None;
    }

    Some(trade)
}
