//! Per-cycle signal journal port trait.

use crate::domain::decision::JournalEntry;
use crate::domain::error::TraderError;

pub trait SignalJournal {
    fn record(&self, entry: &JournalEntry) -> Result<(), TraderError>;
}
