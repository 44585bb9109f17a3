//! Append-only CSV signal journal.

use crate::domain::decision::JournalEntry;
use crate::domain::error::TraderError;
use crate::ports::journal_port::SignalJournal;
use std::fs::OpenOptions;
use std::path::PathBuf;

const HEADER: [&str; 9] = [
    "timestamp",
    "symbol",
    "close",
    "ema_fast",
    "ema_slow",
    "oscillator",
    "signal",
    "lot",
    "outcome",
];

pub struct CsvSignalJournal {
    path: PathBuf,
}

impl CsvSignalJournal {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

fn journal_error(e: csv::Error) -> TraderError {
    TraderError::unavailable("signal journal", e.to_string())
}

impl SignalJournal for CsvSignalJournal {
    fn record(&self, entry: &JournalEntry) -> Result<(), TraderError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let is_new = file.metadata()?.len() == 0;

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            wtr.write_record(HEADER).map_err(journal_error)?;
        }
        wtr.write_record([
            entry
                .timestamp
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            entry.symbol.clone(),
            format!("{:.5}", entry.close),
            format!("{:.5}", entry.ema_fast),
            format!("{:.5}", entry.ema_slow),
            format!("{:.2}", entry.oscillator),
            entry.signal.to_string(),
            entry.lot.map(|l| format!("{:.4}", l)).unwrap_or_default(),
            entry.outcome.to_string(),
        ])
        .map_err(journal_error)?;
        wtr.flush()?;
        Ok(())
    }
}
