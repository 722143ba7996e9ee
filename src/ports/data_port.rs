//! Candle data access port trait.

use chrono::NaiveDateTime;

use crate::domain::candle::{AssetSpec, Candle};
use crate::domain::error::SignalbenchError;

/// Supplies historical candles for an asset within a window.
///
/// Implementations return candles sorted by timestamp and restricted to
/// `[start, end]`; they need not be gap-filled — the evaluation layer aligns
/// every series onto the calendar grid.
pub trait CandleSource {
    fn fetch_candles(
        &self,
        spec: &AssetSpec,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Candle>, SignalbenchError>;
}
