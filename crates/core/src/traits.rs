use crate::price::{PriceError, Quotes};
use async_trait::async_trait;

/// Supplies spot close quotes for every instrument.
///
/// Implementations stand in for the trading terminal feed, a quotes file or
/// interactive entry. Quotes are raw market quotes; conversion to strike units
/// happens in [`Quotes::to_close_prices`].
#[async_trait]
pub trait ClosePriceSource: Send + Sync {
    async fn quotes(&self) -> Result<Quotes, PriceError>;
    fn name(&self) -> &str;
}
