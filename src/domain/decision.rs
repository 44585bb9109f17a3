//! One decision cycle: fetch → indicators → signal → size → gate → submit → book.
//!
//! Cycles must not overlap; `run_cycle` takes `&mut self` so a single owner
//! drives them in sequence. A cycle that fails at a collaborator boundary
//! returns `Err` with the risk state untouched. Only a fill carrying a realized
//! P&L reaches `update_capital`.

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::domain::bar::PriceBar;
use crate::domain::config::TraderConfig;
use crate::domain::error::TraderError;
use crate::domain::indicator::IndicatorFrame;
use crate::domain::indicator::atr::normalized_atr;
use crate::domain::order::{Fill, OrderRequest, Side};
use crate::domain::risk::{BlockReason, RiskManager};
use crate::domain::signal::{Signal, SignalKind};
use crate::domain::strategy::Strategy;
use crate::ports::journal_port::SignalJournal;
use crate::ports::metrics_port::MetricsSink;
use crate::ports::order_port::OrderExecutor;
use crate::ports::price_port::PriceSource;

/// Result of a cycle that ran to completion.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Hold {
        signal: Signal,
    },
    /// The risk gate refused the trade. Expected behaviour, not a failure.
    Blocked {
        signal: Signal,
        lot: f64,
        reason: BlockReason,
    },
    /// The executor answered but refused the order.
    Rejected {
        order: OrderRequest,
        reason: String,
    },
    Executed {
        order: OrderRequest,
        realized_pnl: Option<f64>,
    },
}

impl CycleOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::Hold { .. } => "hold",
            CycleOutcome::Blocked { .. } => "blocked",
            CycleOutcome::Rejected { .. } => "rejected",
            CycleOutcome::Executed { .. } => "executed",
        }
    }
}

/// One journal line per completed cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub timestamp: Option<NaiveDateTime>,
    pub symbol: String,
    pub close: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub oscillator: f64,
    pub signal: SignalKind,
    pub lot: Option<f64>,
    pub outcome: &'static str,
}

/// Order parameters the loop applies to every signal.
#[derive(Debug, Clone, PartialEq)]
struct OrderParams {
    symbol: String,
    bar_count: usize,
    stop_loss_pips: Option<f64>,
    pip_value: Option<f64>,
    take_profit: f64,
    stop_loss: f64,
    adaptive: bool,
    volatility_period: usize,
}

pub struct DecisionLoop {
    params: OrderParams,
    strategy: Box<dyn Strategy>,
    risk: RiskManager,
    prices: Box<dyn PriceSource>,
    executor: Box<dyn OrderExecutor>,
    metrics: Option<Box<dyn MetricsSink>>,
    journal: Option<Box<dyn SignalJournal>>,
}

impl DecisionLoop {
    pub fn new(
        config: &TraderConfig,
        strategy: Box<dyn Strategy>,
        risk: RiskManager,
        prices: Box<dyn PriceSource>,
        executor: Box<dyn OrderExecutor>,
    ) -> Self {
        DecisionLoop {
            params: OrderParams {
                symbol: config.symbol.clone(),
                bar_count: config.data.bar_count,
                stop_loss_pips: config.risk.stop_loss_pips,
                pip_value: config.risk.pip_value,
                take_profit: config.strategy.take_profit,
                stop_loss: config.strategy.stop_loss,
                adaptive: config.risk.adaptive,
                volatility_period: config.risk.volatility_period,
            },
            strategy,
            risk,
            prices,
            executor,
            metrics: None,
            journal: None,
        }
    }

    pub fn with_metrics(mut self, sink: Box<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    pub fn with_journal(mut self, journal: Box<dyn SignalJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn risk(&self) -> &RiskManager {
        &self.risk
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Day-boundary hook for the external scheduler.
    pub fn reset_daily(&mut self) {
        self.risk.reset_daily();
        self.record_metrics();
    }

    pub fn run_cycle(&mut self) -> Result<CycleOutcome, TraderError> {
        let symbol = self.params.symbol.clone();

        let bars = self
            .prices
            .fetch(&symbol, self.params.bar_count)
            .inspect_err(|e| warn!(%symbol, error = %e, "price fetch failed"))?;
        if bars.is_empty() {
            warn!(%symbol, "price source returned no bars");
            return Err(TraderError::unavailable("price source", "no bars returned"));
        }

        let frame = self
            .strategy
            .compute(&bars)
            .inspect_err(|e| warn!(%symbol, error = %e, "skipping cycle"))?;
        let signal = self.strategy.generate(&frame);

        let (side, price) = match (signal.side(), signal.price) {
            (Some(side), Some(price)) => (side, price),
            _ => {
                debug!(%symbol, reason = %signal.reason, "no signal");
                let outcome = CycleOutcome::Hold { signal };
                self.journal(&frame, &outcome, None);
                return Ok(outcome);
            }
        };
        info!(%symbol, %side, price, reason = %signal.reason, "signal");

        // sized before gating so a blocked trade still reports its intended exposure
        let lot = self.risk.calculate_lot_size(
            price,
            self.params.stop_loss_pips,
            self.params.pip_value,
        )?;

        if let Err(reason) = self.risk.check_limits() {
            warn!(%symbol, %side, lot, %reason, "order blocked by risk limits");
            let outcome = CycleOutcome::Blocked {
                signal,
                lot,
                reason,
            };
            self.journal(&frame, &outcome, Some(lot));
            return Ok(outcome);
        }

        let order = OrderRequest::bracket(
            &symbol,
            side,
            price,
            lot,
            self.params.take_profit,
            self.params.stop_loss,
        );

        let fill = self
            .executor
            .submit(&order)
            .inspect_err(|e| warn!(%symbol, error = %e, "order submission failed"))?;

        let outcome = match fill {
            Fill::Rejected { reason } => {
                warn!(%symbol, %side, lot, %reason, "order rejected");
                CycleOutcome::Rejected { order, reason }
            }
            Fill::Filled { realized_pnl } => {
                info!(%symbol, %side, lot, price, "order filled");
                if let Some(pnl) = realized_pnl {
                    self.book(pnl, &bars)?;
                }
                CycleOutcome::Executed {
                    order,
                    realized_pnl,
                }
            }
        };

        self.journal(&frame, &outcome, Some(lot));
        Ok(outcome)
    }

    fn book(&mut self, pnl: f64, bars: &[PriceBar]) -> Result<(), TraderError> {
        self.risk.update_capital(pnl)?;
        if self.params.adaptive {
            self.risk.adjust_risk_based_on_performance();
            self.risk
                .adjust_for_volatility(normalized_atr(bars, self.params.volatility_period));
        }
        self.record_metrics();
        Ok(())
    }

    fn record_metrics(&self) {
        if let Some(sink) = &self.metrics {
            if let Err(e) = sink.record(&self.risk.snapshot()) {
                warn!(error = %e, "failed to record risk metrics");
            }
        }
    }

    fn journal(&self, frame: &IndicatorFrame, outcome: &CycleOutcome, lot: Option<f64>) {
        let (Some(journal), Some(row)) = (&self.journal, frame.last()) else {
            return;
        };
        let signal = match outcome {
            CycleOutcome::Hold { signal } | CycleOutcome::Blocked { signal, .. } => signal.kind,
            CycleOutcome::Rejected { order, .. } | CycleOutcome::Executed { order, .. } => {
                match order.side {
                    Side::Buy => SignalKind::Buy,
                    Side::Sell => SignalKind::Sell,
                }
            }
        };
        let entry = JournalEntry {
            timestamp: Some(row.bar.timestamp),
            symbol: self.params.symbol.clone(),
            close: row.bar.close,
            ema_fast: row.ema_fast,
            ema_slow: row.ema_slow,
            oscillator: row.oscillator,
            signal,
            lot,
            outcome: outcome.label(),
        };
        if let Err(e) = journal.record(&entry) {
            warn!(error = %e, "failed to write signal journal");
        }
    }
}

/// Detects calendar-day changes between cycles.
#[derive(Debug, Clone, Default)]
pub struct DayTracker {
    current: Option<NaiveDate>,
}

impl DayTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when `today` differs from the last observed day. The first
    /// observation only records the date.
    pub fn roll(&mut self, today: NaiveDate) -> bool {
        match self.current.replace(today) {
            Some(previous) => previous != today,
            None => false,
        }
    }
}
