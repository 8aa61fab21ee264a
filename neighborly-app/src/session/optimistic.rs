use super::vote_tracker::VoteTracker;
use crate::domain::{VoteCounts, VoteDirection, VoteTarget};
use neighborly_errors::AppError;
use std::collections::{HashMap, HashSet};
use std::future::Future;

/// A vote shown locally but not yet confirmed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a pending vote must be settled"]
pub struct PendingVote {
    pub target: VoteTarget,
    pub direction: VoteDirection,
    pub previous: VoteCounts,
    pub optimistic: VoteCounts,
}

/// Displayed vote counters for one page, updated ahead of the backend.
#[derive(Debug, Clone, Default)]
pub struct OptimisticVotes {
    displayed: HashMap<VoteTarget, VoteCounts>,
    in_flight: HashSet<VoteTarget>,
    tracker: VoteTracker,
}

impl OptimisticVotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracker(&self) -> &VoteTracker {
        &self.tracker
    }

    pub fn has_voted(&self, target: VoteTarget) -> bool {
        self.tracker.has_voted(target)
    }

    /// Whether a vote on `target` is waiting for the backend.
    pub fn is_pending(&self, target: VoteTarget) -> bool {
        self.in_flight.contains(&target)
    }

    pub fn counts(&self, target: VoteTarget) -> Option<VoteCounts> {
        self.displayed.get(&target).copied()
    }

    pub fn counts_or(&self, target: VoteTarget, fetched: VoteCounts) -> VoteCounts {
        self.counts(target).unwrap_or(fetched)
    }

    /// Records counters from a fetch. Targets with a vote in flight keep their
    /// optimistic value until it settles.
    pub fn observe(&mut self, target: VoteTarget, counts: VoteCounts) {
        if !self.in_flight.contains(&target) {
            self.displayed.insert(target, counts);
        }
    }

    /// Applies a vote locally. Returns `None` when this session already voted
    /// on `target`; nothing changes in that case and nothing must be sent.
    pub fn begin(&mut self, target: VoteTarget, direction: VoteDirection) -> Option<PendingVote> {
        if self.tracker.has_voted(target) {
            tracing::debug!(vote = ?target, "ignoring repeated vote");
            return None;
        }

        let previous = self.counts(target).unwrap_or_default();
        let optimistic = previous.with_vote(direction);

        self.displayed.insert(target, optimistic);
        self.in_flight.insert(target);
        self.tracker.mark_voted(target);

        Some(PendingVote {
            target,
            direction,
            previous,
            optimistic,
        })
    }

    /// Reconciles a pending vote with the backend's answer. On failure the
    /// counters roll back and the target can be voted on again.
    pub fn settle(&mut self, pending: PendingVote, result: Result<VoteCounts, AppError>) -> VoteCounts {
        self.in_flight.remove(&pending.target);

        match result {
            Ok(counts) => {
                self.displayed.insert(pending.target, counts);
                counts
            }
            Err(e) => {
                tracing::error!(vote = ?pending.target, error = %e, "vote was not saved, rolling back");
                self.displayed.insert(pending.target, pending.previous);
                self.tracker.unmark(pending.target);
                pending.previous
            }
        }
    }

    /// Runs a whole vote: local update, backend write through `send`, then
    /// reconciliation. Returns `Ok(None)` for a repeated vote.
    pub async fn vote<F, Fut>(
        &mut self,
        target: VoteTarget,
        direction: VoteDirection,
        send: F,
    ) -> Result<Option<VoteCounts>, AppError>
    where
        F: FnOnce(VoteTarget, VoteDirection) -> Fut,
        Fut: Future<Output = Result<VoteCounts, AppError>>,
    {
        let Some(pending) = self.begin(target, direction) else {
            return Ok(None);
        };

        let result = send(target, direction).await;
        let failure = result.as_ref().err().cloned();
        self.settle(pending, result);

        match failure {
            Some(e) => Err(e),
            None => Ok(self.counts(target)),
        }
    }
}
