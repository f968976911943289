//! Pip metrics for a round-trip trade.

use crate::domain::{Decimal, Side};

/// Price movement in pips, signed so that a profitable move is positive.
///
/// Buy: `(close - open) * multiplier`. Sell: `(open - close) * multiplier`.
/// Returns `None` if the result does not fit in a [`Decimal`].
pub fn pips(
    open_price: Decimal,
    close_price: Decimal,
    side: Side,
    multiplier: Decimal,
) -> Option<Decimal> {
    let movement = match side {
        Side::Buy => close_price.checked_sub(open_price)?,
        Side::Sell => open_price.checked_sub(close_price)?,
    };
    movement.checked_mul(multiplier)
}

/// Pips scaled to a standard lot: `pips * units / max_units`.
///
/// Returns `None` when `max_units` is zero or the product overflows.
pub fn normalized_pips(pips: Decimal, units: Decimal, max_units: Decimal) -> Option<Decimal> {
    pips.checked_mul(units)?.checked_div(max_units)
}
