//! Notional volume reduction

use crate::feed::TradeRecord;

/// Sum of `price × quantity` over a batch of trades.
///
/// Lenient deserialization has already mapped missing or malformed numeric
/// fields to `0.0`, so a defective record contributes nothing instead of
/// failing the batch. No rounding is applied here; precision is a display
/// concern of the log formatting.
pub fn notional_volume(trades: &[TradeRecord]) -> f64 {
    trades.iter().map(|t| t.price * t.quantity).sum()
}
