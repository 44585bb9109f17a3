//! Synthetic minute-bar price source for dry runs.
//!
//! A bounded random walk that stays inside a forex-like band. The generator
//! keeps its RNG between fetches, so consecutive cycles see different walks.

use crate::domain::bar::PriceBar;
use crate::domain::error::TraderError;
use crate::ports::price_port::PriceSource;
use chrono::{Duration, Local, NaiveDateTime, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

const FLOOR: f64 = 1.05;
const CEILING: f64 = 1.10;
const MAX_STEP: f64 = 0.0005;
const MAX_WICK: f64 = 0.0003;

pub struct SyntheticPriceSource {
    rng: StdRng,
    /// Timestamp of the newest bar; the current minute when unset.
    anchor: Option<NaiveDateTime>,
}

impl SyntheticPriceSource {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, anchor: None }
    }

    /// Pins the newest bar's timestamp instead of following the clock.
    pub fn anchored_at(mut self, anchor: NaiveDateTime) -> Self {
        self.anchor = Some(anchor);
        self
    }

    fn end_timestamp(&self) -> NaiveDateTime {
        let now = Local::now().naive_local();
        self.anchor
            .or_else(|| now.with_second(0).and_then(|t| t.with_nanosecond(0)))
            .unwrap_or(now)
    }
}

impl PriceSource for SyntheticPriceSource {
    fn fetch(&mut self, symbol: &str, bar_count: usize) -> Result<Vec<PriceBar>, TraderError> {
        let end = self.end_timestamp();
        let mut price = self.rng.gen_range(FLOOR..CEILING);
        let mut bars = Vec::with_capacity(bar_count);

        for i in 0..bar_count {
            let step = self.rng.gen_range(-MAX_STEP..MAX_STEP);
            let mut close = price + step;
            // reflect off the band edges
            if close > CEILING {
                close = CEILING - (close - CEILING);
            } else if close < FLOOR {
                close = FLOOR + (FLOOR - close);
            }
            let open = price;
            let high = open.max(close) + self.rng.gen_range(0.0..MAX_WICK);
            let low = open.min(close) - self.rng.gen_range(0.0..MAX_WICK);

            bars.push(PriceBar {
                timestamp: end - Duration::minutes((bar_count - 1 - i) as i64),
                open,
                high,
                low,
                close,
                volume: self.rng.gen_range(1..10),
            });
            price = close;
        }

        debug!(%symbol, bars = bars.len(), "generated synthetic bars");
        Ok(bars)
    }
}
