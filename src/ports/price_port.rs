//! Price data port trait.

use crate::domain::bar::PriceBar;
use crate::domain::error::TraderError;

pub trait PriceSource {
    /// Up to `bar_count` most recent bars, oldest first. An empty vector means
    /// the source had nothing to offer this time.
    fn fetch(&mut self, symbol: &str, bar_count: usize) -> Result<Vec<PriceBar>, TraderError>;
}
