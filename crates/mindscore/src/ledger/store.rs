use std::sync::{Arc, Mutex};

use super::{LedgerEntry, LedgerError};

/// Append-only storage for sealed entries.
pub trait LedgerStore: Send + Sync {
    fn append(&self, entry: LedgerEntry) -> Result<(), LedgerError>;
    fn entries_for_session(&self, session_id: &str) -> Result<Vec<LedgerEntry>, LedgerError>;
}

/// Process-local ledger that keeps entries in insertion order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedger {
    entries: Arc<Mutex<Vec<LedgerEntry>>>,
}

impl InMemoryLedger {
    pub fn len(&self) -> usize {
        self.entries.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LedgerStore for InMemoryLedger {
    fn append(&self, entry: LedgerEntry) -> Result<(), LedgerError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| LedgerError::Unavailable("ledger mutex poisoned".to_string()))?;
        if guard.iter().any(|existing| existing.id() == entry.id()) {
            return Err(LedgerError::Conflict(entry.id().to_string()));
        }
        guard.push(entry);
        Ok(())
    }

    fn entries_for_session(&self, session_id: &str) -> Result<Vec<LedgerEntry>, LedgerError> {
        let guard = self
            .entries
            .lock()
            .map_err(|_| LedgerError::Unavailable("ledger mutex poisoned".to_string()))?;
        Ok(guard
            .iter()
            .filter(|entry| entry.session_id() == session_id)
            .cloned()
            .collect())
    }
}
