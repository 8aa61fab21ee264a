use crate::domain::VoteTarget;
use std::collections::HashSet;

/// Items this page session has voted on. Lives only as long as the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteTracker {
    voted: HashSet<VoteTarget>,
}

impl VoteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_voted(&self, target: VoteTarget) -> bool {
        self.voted.contains(&target)
    }

    pub fn mark_voted(&mut self, target: VoteTarget) {
        self.voted.insert(target);
    }

    pub(crate) fn unmark(&mut self, target: VoteTarget) {
        self.voted.remove(&target);
    }
}
