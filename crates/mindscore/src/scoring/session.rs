use super::domain::{PhaseScore, ScoredPhase};

/// Session-scoped context: the phases scored so far and pointers into the ledger.
///
/// The ledger itself is append-only; forgetting an entry only drops this
/// session's pointer to it.
#[derive(Debug, Clone, Default)]
pub struct ScoringSession {
    session_id: String,
    scored_phases: Vec<ScoredPhase>,
    ledger_pointers: Vec<String>,
}

impl ScoringSession {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            scored_phases: Vec::new(),
            ledger_pointers: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn scored_phases(&self) -> &[ScoredPhase] {
        &self.scored_phases
    }

    pub fn ledger_pointers(&self) -> &[String] {
        &self.ledger_pointers
    }

    /// Adds a phase result. A later score for the same phase replaces the earlier one.
    pub fn record(&mut self, score: &PhaseScore, ledger_entry_id: String) {
        let scored = score.to_scored_phase();
        match self
            .scored_phases
            .iter_mut()
            .find(|existing| existing.phase_id == scored.phase_id)
        {
            Some(existing) => *existing = scored,
            None => self.scored_phases.push(scored),
        }
        self.attach_ledger_entry(ledger_entry_id);
    }

    pub fn attach_ledger_entry(&mut self, entry_id: String) {
        self.ledger_pointers.push(entry_id);
    }

    /// Returns whether a pointer was removed.
    pub fn forget_ledger_entry(&mut self, entry_id: &str) -> bool {
        let before = self.ledger_pointers.len();
        self.ledger_pointers.retain(|pointer| pointer != entry_id);
        before != self.ledger_pointers.len()
    }
}
