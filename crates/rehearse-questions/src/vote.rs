//! Toggle-style vote reconciliation.
//!
//! Each user holds at most one vote per question. Casting the same vote
//! again removes it; casting the other vote flips it. The functions here
//! decide what happens to the ledger entry and the aggregate counters
//! without touching storage, so the persistence layer only has to apply
//! the outcome.

use rehearse_types::VoteType;

/// Aggregate like/dislike counters for a question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub likes: u32,
    pub dislikes: u32,
}

impl Tally {
    pub fn new(likes: u32, dislikes: u32) -> Self {
        Self { likes, dislikes }
    }

    /// Net score, `likes - dislikes`.
    pub fn votes(&self) -> i64 {
        i64::from(self.likes) - i64::from(self.dislikes)
    }

    fn counter_mut(&mut self, vote: VoteType) -> &mut u32 {
        match vote {
            VoteType::Like => &mut self.likes,
            VoteType::Dislike => &mut self.dislikes,
        }
    }

    fn increment(&mut self, vote: VoteType) {
        let counter = self.counter_mut(vote);
        *counter = counter.saturating_add(1);
    }

    /// Clamped at zero.
    fn decrement(&mut self, vote: VoteType) {
        let counter = self.counter_mut(vote);
        *counter = counter.saturating_sub(1);
    }
}

/// What must happen to the caller's ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerChange {
    /// No entry existed; record this vote.
    Insert(VoteType),
    /// The entry matched the desired vote; delete it.
    Remove,
    /// The entry held the other vote; overwrite it with this one.
    Flip(VoteType),
}

/// Outcome of applying one vote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    /// Counters after the vote.
    pub tally: Tally,
    /// The caller's vote after the request, `None` when toggled off.
    pub user_vote: Option<VoteType>,
    /// The ledger mutation to persist.
    pub change: LedgerChange,
}

/// Decides the effect of `desired` given the caller's `existing` vote.
pub fn reconcile(existing: Option<VoteType>, desired: VoteType, tally: Tally) -> Reconciliation {
    let mut tally = tally;
    match existing {
        None => {
            tally.increment(desired);
            Reconciliation {
                tally,
                user_vote: Some(desired),
                change: LedgerChange::Insert(desired),
            }
        }
        Some(current) if current == desired => {
            tally.decrement(desired);
            Reconciliation {
                tally,
                user_vote: None,
                change: LedgerChange::Remove,
            }
        }
        Some(_) => {
            tally.decrement(desired.opposite());
            tally.increment(desired);
            Reconciliation {
                tally,
                user_vote: Some(desired),
                change: LedgerChange::Flip(desired),
            }
        }
    }
}
