//! SQLite risk metrics sink.

use crate::domain::error::TraderError;
use crate::domain::risk::RiskState;
use crate::ports::metrics_port::MetricsSink;
use chrono::Local;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::Path;

const COLLABORATOR: &str = "sqlite metrics";

fn pool_error(e: r2d2::Error) -> TraderError {
    TraderError::unavailable(COLLABORATOR, e.to_string())
}

fn query_error(e: rusqlite::Error) -> TraderError {
    TraderError::unavailable(COLLABORATOR, e.to_string())
}

pub struct SqliteMetricsSink {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteMetricsSink {
    /// Opens (or creates) the database file and ensures the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TraderError> {
        let manager = SqliteConnectionManager::file(path.as_ref());
        let pool = Pool::builder()
            .max_size(2)
            .build(manager)
            .map_err(pool_error)?;
        let sink = Self { pool };
        sink.initialize_schema()?;
        Ok(sink)
    }

    pub fn in_memory() -> Result<Self, TraderError> {
        let manager = SqliteConnectionManager::memory();
        // one connection, otherwise each checkout sees its own empty database
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;
        let sink = Self { pool };
        sink.initialize_schema()?;
        Ok(sink)
    }

    pub fn initialize_schema(&self) -> Result<(), TraderError> {
        let conn = self.pool.get().map_err(pool_error)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS risk_metrics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                capital REAL NOT NULL,
                risk_per_trade REAL NOT NULL,
                daily_pnl REAL NOT NULL,
                equity_high REAL NOT NULL,
                max_drawdown REAL NOT NULL,
                max_daily_loss REAL NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_risk_metrics_timestamp ON risk_metrics(timestamp);",
        )
        .map_err(query_error)?;
        Ok(())
    }

    /// Most recent rows, newest first, as `(capital, equity_high, daily_pnl)`.
    pub fn recent(&self, limit: usize) -> Result<Vec<(f64, f64, f64)>, TraderError> {
        let conn = self.pool.get().map_err(pool_error)?;
        let mut stmt = conn
            .prepare(
                "SELECT capital, equity_high, daily_pnl FROM risk_metrics
                 ORDER BY id DESC LIMIT ?1",
            )
            .map_err(query_error)?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .map_err(query_error)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(query_error)
    }

    pub fn count(&self) -> Result<usize, TraderError> {
        let conn = self.pool.get().map_err(pool_error)?;
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM risk_metrics", [], |row| row.get(0))
            .map_err(query_error)?;
        Ok(n as usize)
    }
}

impl MetricsSink for SqliteMetricsSink {
    fn record(&self, snapshot: &RiskState) -> Result<(), TraderError> {
        let conn = self.pool.get().map_err(pool_error)?;
        conn.execute(
            "INSERT INTO risk_metrics
                (timestamp, capital, risk_per_trade, daily_pnl, equity_high, max_drawdown, max_daily_loss)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                Local::now().naive_local().format("%Y-%m-%d %H:%M:%S").to_string(),
                snapshot.capital,
                snapshot.risk_per_trade,
                snapshot.daily_pnl,
                snapshot.equity_high,
                snapshot.max_drawdown,
                snapshot.max_daily_loss
            ],
        )
        .map_err(query_error)?;
        Ok(())
    }
}
