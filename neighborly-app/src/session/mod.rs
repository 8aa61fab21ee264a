//! Page-session state: what this browser tab has voted on, the counters it
//! shows, how its comment threads are folded and the need it is drafting.
//! Nothing here is persisted.

mod need_draft;
mod optimistic;
mod thread_view;
mod vote_tracker;

pub use need_draft::NeedDraft;
pub use optimistic::{OptimisticVotes, PendingVote};
pub use thread_view::{CommentActions, ThreadRow, ThreadView, MAX_THREAD_DEPTH};
pub use vote_tracker::VoteTracker;
