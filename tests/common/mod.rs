#![allow(dead_code)]

use argoth::domain::bar::PriceBar;
use argoth::domain::config::{DataConfig, RiskConfig, StrategyConfig, TraderConfig};
use argoth::domain::error::TraderError;
use argoth::domain::order::{Fill, OrderRequest};
use argoth::domain::risk::{RiskManager, RiskState};
use argoth::domain::decision::DecisionLoop;
use argoth::domain::strategy;
use argoth::ports::metrics_port::MetricsSink;
use argoth::ports::order_port::OrderExecutor;
use argoth::ports::price_port::PriceSource;
use chrono::{NaiveDate, NaiveDateTime};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

pub struct MockPriceSource {
    pub bars: Vec<PriceBar>,
    pub error: Option<String>,
    pub fetches: Rc<RefCell<usize>>,
}

impl MockPriceSource {
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self {
            bars,
            error: None,
            fetches: Rc::new(RefCell::new(0)),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            error: Some(reason.to_string()),
            ..Self::new(Vec::new())
        }
    }
}

impl PriceSource for MockPriceSource {
    fn fetch(&mut self, _symbol: &str, bar_count: usize) -> Result<Vec<PriceBar>, TraderError> {
        *self.fetches.borrow_mut() += 1;
        if let Some(reason) = &self.error {
            return Err(TraderError::unavailable("price source", reason.clone()));
        }
        let skip = self.bars.len().saturating_sub(bar_count);
        Ok(self.bars[skip..].to_vec())
    }
}

/// Answers orders from a script; an empty script fills with no realized P&L.
pub struct MockExecutor {
    pub script: VecDeque<Result<Fill, String>>,
    pub submitted: Rc<RefCell<Vec<OrderRequest>>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            submitted: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn then_fill(mut self, realized_pnl: Option<f64>) -> Self {
        self.script.push_back(Ok(Fill::Filled { realized_pnl }));
        self
    }

    pub fn then_reject(mut self, reason: &str) -> Self {
        self.script.push_back(Ok(Fill::Rejected {
            reason: reason.to_string(),
        }));
        self
    }

    pub fn then_fail(mut self, reason: &str) -> Self {
        self.script.push_back(Err(reason.to_string()));
        self
    }
}

impl OrderExecutor for MockExecutor {
    fn submit(&mut self, order: &OrderRequest) -> Result<Fill, TraderError> {
        self.submitted.borrow_mut().push(order.clone());
        match self.script.pop_front() {
            Some(Ok(fill)) => Ok(fill),
            Some(Err(reason)) => Err(TraderError::unavailable("broker", reason)),
            None => Ok(Fill::Filled { realized_pnl: None }),
        }
    }
}

pub struct MockMetrics {
    pub snapshots: Rc<RefCell<Vec<RiskState>>>,
    pub fail: bool,
}

impl MockMetrics {
    pub fn new() -> Self {
        Self {
            snapshots: Rc::new(RefCell::new(Vec::new())),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }
}

impl MetricsSink for MockMetrics {
    fn record(&self, snapshot: &RiskState) -> Result<(), TraderError> {
        if self.fail {
            return Err(TraderError::unavailable("metrics", "disk full"));
        }
        self.snapshots.borrow_mut().push(snapshot.clone());
        Ok(())
    }
}

pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 4)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

/// Minute bars from closes; open is the previous close with a fixed wick.
pub fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                timestamp: start() + chrono::Duration::minutes(i as i64),
                open,
                high: open.max(close) + 0.0005,
                low: open.min(close) - 0.0005,
                close,
                volume: 5,
            }
        })
        .collect()
}

/// 30 falling closes then three sharp rises; with EMA 3/10 and a 5-bar
/// oscillator the last bar is a confirmed bullish cross at ~1.080.
pub fn buy_closes() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..30).map(|i| 1.10 - i as f64 * 0.001).collect();
    for _ in 0..3 {
        let last = closes[closes.len() - 1];
        closes.push(last + 0.003);
    }
    closes
}

/// Mirror image of [`buy_closes`]: a confirmed bearish cross on the last bar.
pub fn sell_closes() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..30).map(|i| 1.05 + i as f64 * 0.001).collect();
    for _ in 0..3 {
        let last = closes[closes.len() - 1];
        closes.push(last - 0.003);
    }
    closes
}

/// Steady climb: fast EMA stays above slow, no fresh cross.
pub fn trending_closes(count: usize) -> Vec<f64> {
    (0..count).map(|i| 1.05 + i as f64 * 0.0005).collect()
}

/// Small spans so short fixtures clear the warmup. Adaptive rules are off so
/// bookkeeping assertions stay exact.
pub fn test_config() -> TraderConfig {
    TraderConfig {
        risk: RiskConfig {
            adaptive: false,
            ..RiskConfig::default()
        },
        strategy: StrategyConfig {
            ema_fast: 3,
            ema_slow: 10,
            oscillator_period: 5,
            ..StrategyConfig::default()
        },
        data: DataConfig {
            bar_count: 33,
            ..DataConfig::default()
        },
        ..TraderConfig::default()
    }
}

pub fn make_loop(
    config: &TraderConfig,
    risk: RiskManager,
    prices: MockPriceSource,
    executor: MockExecutor,
) -> DecisionLoop {
    let strategy = strategy::from_config(&config.strategy).unwrap();
    DecisionLoop::new(config, strategy, risk, Box::new(prices), Box::new(executor))
}
