mod comments;
mod live_feed;
mod moderation;
mod needs;
mod reports;
mod voting;

pub use comments::CommentService;
pub use live_feed::{FeedSnapshot, LiveFeed};
pub use moderation::ModerationService;
pub use needs::NeedService;
pub use reports::ReportService;
pub use voting::VoteService;
