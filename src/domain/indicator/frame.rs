//! Indicator frame: price bars joined with fast/slow EMA and the oscillator.
//!
//! The first `warmup = max(slow_span, osc_period)` bars are dropped rather than
//! zero-filled, so `frame.len() == bars.len() - warmup`.

use crate::domain::bar::{PriceBar, ensure_ordered};
use crate::domain::error::TraderError;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::rsi::calculate_rsi;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub bar: PriceBar,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub oscillator: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    pub rows: Vec<IndicatorRow>,
}

impl IndicatorFrame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }

    /// (previous, current) when the frame holds at least two rows.
    pub fn last_two(&self) -> Option<(&IndicatorRow, &IndicatorRow)> {
        match self.rows.as_slice() {
            [.., prev, cur] => Some((prev, cur)),
            _ => None,
        }
    }
}

/// Number of leading bars dropped from the frame.
pub fn warmup(slow_span: usize, osc_period: usize) -> usize {
    slow_span.max(osc_period)
}

pub fn compute(
    bars: &[PriceBar],
    fast_span: usize,
    slow_span: usize,
    osc_period: usize,
) -> Result<IndicatorFrame, TraderError> {
    if fast_span == 0 || slow_span == 0 || osc_period == 0 {
        return Err(TraderError::invalid_input(
            "indicator spans and oscillator period must be positive",
        ));
    }
    if fast_span > slow_span {
        return Err(TraderError::invalid_input(format!(
            "fast span {} exceeds slow span {}",
            fast_span, slow_span
        )));
    }

    let skip = warmup(slow_span, osc_period);
    let minimum = skip + 1;
    if bars.len() < minimum {
        return Err(TraderError::InsufficientData {
            bars: bars.len(),
            minimum,
        });
    }
    if let Some(bar) = bars.iter().find(|b| !b.close.is_finite()) {
        return Err(TraderError::invalid_input(format!(
            "non-finite close at {}",
            bar.timestamp
        )));
    }
    ensure_ordered(bars)?;

    let fast = calculate_ema(bars, fast_span);
    let slow = calculate_ema(bars, slow_span);
    let osc = calculate_rsi(bars, osc_period);

    let rows = bars
        .iter()
        .enumerate()
        .skip(skip)
        .map(|(i, bar)| IndicatorRow {
            bar: bar.clone(),
            ema_fast: fast.values[i].value,
            ema_slow: slow.values[i].value,
            oscillator: osc.values[i].value,
        })
        .collect();

    Ok(IndicatorFrame { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(count: usize) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..count)
            .map(|i| {
                let close = 1.05 + (i as f64 * 0.37).sin() * 0.01 + i as f64 * 0.0001;
                PriceBar {
                    timestamp: start + chrono::Duration::minutes(i as i64),
                    open: close,
                    high: close + 0.0002,
                    low: close - 0.0002,
                    close,
                    volume: 500,
                }
            })
            .collect()
    }

    #[test]
    fn output_drops_binding_warmup() {
        let frame = compute(&make_bars(500), 50, 200, 14).unwrap();
        assert_eq!(frame.len(), 300);
        for row in &frame.rows {
            assert!(row.ema_fast.is_finite());
            assert!(row.ema_slow.is_finite());
            assert!(row.oscillator.is_finite());
        }
    }

    #[test]
    fn oscillator_period_can_bind() {
        let frame = compute(&make_bars(40), 3, 5, 20).unwrap();
        assert_eq!(frame.len(), 20);
    }

    #[test]
    fn rows_align_with_source_bars() {
        let bars = make_bars(30);
        let frame = compute(&bars, 5, 10, 14).unwrap();
        assert_eq!(frame.rows[0].bar, bars[14]);
        assert_eq!(frame.last().unwrap().bar, bars[29]);
    }

    #[test]
    fn exact_minimum_yields_one_row() {
        let frame = compute(&make_bars(201), 50, 200, 14).unwrap();
        assert_eq!(frame.len(), 1);
        assert!(frame.last_two().is_none());
    }

    #[test]
    fn too_few_bars_is_insufficient_data() {
        let err = compute(&make_bars(200), 50, 200, 14).unwrap_err();
        assert!(matches!(
            err,
            TraderError::InsufficientData {
                bars: 200,
                minimum: 201
            }
        ));
    }

    #[test]
    fn zero_span_rejected() {
        let err = compute(&make_bars(50), 0, 20, 14).unwrap_err();
        assert!(matches!(err, TraderError::InvalidInput { .. }));
    }

    #[test]
    fn fast_above_slow_rejected() {
        let err = compute(&make_bars(50), 30, 20, 14).unwrap_err();
        assert!(matches!(err, TraderError::InvalidInput { .. }));
    }

    #[test]
    fn unordered_bars_rejected() {
        let mut bars = make_bars(30);
        bars.swap(3, 4);
        let err = compute(&bars, 5, 10, 14).unwrap_err();
        assert!(matches!(err, TraderError::InvalidInput { .. }));
    }
}
