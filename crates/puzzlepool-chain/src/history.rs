//! Bounded history of executed transactions for debugging and assertions.

use crate::id::ContractAddress;
use std::collections::VecDeque;

/// How a transaction ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    Succeeded { steps_used: u64 },
    Reverted { reason: String },
}

/// One executed (or reverted) transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub index: u64,
    pub caller: ContractAddress,
    pub to: ContractAddress,
    pub selector: String,
    pub outcome: TxOutcome,
}

impl TransactionRecord {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, TxOutcome::Succeeded { .. })
    }
}

/// Retains up to `max_history` of the most recent transaction records.
#[derive(Debug, Clone)]
pub struct TransactionLog {
    records: VecDeque<TransactionRecord>,
    max_history: usize,
}

impl TransactionLog {
    /// Create a log retaining up to `max_history` records. 0 = no history.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            records: VecDeque::new(),
            max_history,
        }
    }

    pub fn record(&mut self, record: TransactionRecord) {
        if self.max_history == 0 {
            return;
        }
        self.records.push_back(record);
        while self.records.len() > self.max_history {
            self.records.pop_front();
        }
    }

    /// Records oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&TransactionRecord> {
        self.records.back()
    }

    /// Count records whose selector matches.
    pub fn count_selector(&self, selector: &str) -> usize {
        self.records.iter().filter(|r| r.selector == selector).count()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
