//! Per-answer vote ledger.
//!
//! One entry per user, keyed by user id, with the aggregate score maintained
//! alongside. Casting the same vote twice retracts it, casting the opposite
//! vote replaces it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::principal::UserId;
use crate::types::vote::{Vote, VoteChange, VoteEntry};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(into = "LedgerRecord", from = "LedgerRecord")]
pub struct VoteLedger {
    votes: BTreeMap<UserId, Vote>,
    score: i64,
}

/// Wire shape of a ledger: the entry list and the score it sums to.
#[derive(Serialize, Deserialize, Debug, Clone)]
struct LedgerRecord {
    votes: Vec<VoteEntry>,
    score: i64,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a ledger from stored entries. The score is always derived
    /// from the entries; a later entry for the same user wins.
    pub fn from_entries(entries: impl IntoIterator<Item = VoteEntry>) -> Self {
        let votes: BTreeMap<UserId, Vote> = entries
            .into_iter()
            .map(|entry| (entry.user_id, entry.vote))
            .collect();
        let score = votes.values().map(|vote| vote.value()).sum();
        VoteLedger { votes, score }
    }

    pub fn apply(&mut self, user_id: &UserId, vote: Vote) -> VoteChange {
        let change = match self.votes.get(user_id).copied() {
            None => {
                self.votes.insert(user_id.clone(), vote);
                VoteChange::Cast(vote)
            }
            Some(previous) if previous == vote => {
                self.votes.remove(user_id);
                VoteChange::Retracted(vote)
            }
            Some(previous) => {
                self.votes.insert(user_id.clone(), vote);
                VoteChange::Changed {
                    from: previous,
                    to: vote,
                }
            }
        };
        self.score += change.delta();
        change
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn vote_of(&self, user_id: &UserId) -> Option<Vote> {
        self.votes.get(user_id).copied()
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    pub fn entries(&self) -> Vec<VoteEntry> {
        self.votes
            .iter()
            .map(|(user_id, vote)| VoteEntry {
                user_id: user_id.clone(),
                vote: *vote,
            })
            .collect()
    }
}

impl From<VoteLedger> for LedgerRecord {
    fn from(ledger: VoteLedger) -> Self {
        LedgerRecord {
            votes: ledger.entries(),
            score: ledger.score,
        }
    }
}

impl From<LedgerRecord> for VoteLedger {
    fn from(record: LedgerRecord) -> Self {
        VoteLedger::from_entries(record.votes)
    }
}
