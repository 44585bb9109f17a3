//! Average True Range and the normalized volatility metric built on it.
//!
//! Seeded with the simple mean of the first `period` true ranges, then Wilder
//! smoothing: ATR[i] = (ATR[i-1] * (n-1) + TR[i]) / n.

use crate::domain::bar::PriceBar;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

pub fn calculate_atr(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    if bars.len() < period || period == 0 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Atr(period),
            values: vec![],
        };
    }

    let tr_values: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect();

    let mut results: Vec<IndicatorPoint> = Vec::with_capacity(bars.len());
    let mut atr = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let valid = i + 1 >= period;
        if i + 1 == period {
            atr = tr_values[..=i].iter().sum::<f64>() / period as f64;
        } else if i + 1 > period {
            atr = (atr * (period - 1) as f64 + tr_values[i]) / period as f64;
        }
        results.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid,
            value: if valid { atr } else { 0.0 },
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values: results,
    }
}

/// Latest ATR divided by the latest close, or `None` when either is unavailable.
pub fn normalized_atr(bars: &[PriceBar], period: usize) -> Option<f64> {
    let atr = calculate_atr(bars, period).latest()?;
    let close = bars.last()?.close;
    if close > 0.0 { Some(atr / close) } else { None }
}
