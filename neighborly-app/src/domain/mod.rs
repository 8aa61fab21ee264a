pub mod cluster;
mod comment;
mod comment_tree;
mod geo;
mod heat;
pub mod limits;
mod need;
mod report;
mod user;
mod vote;

pub use cluster::Cluster;
pub use comment::{Comment, NewComment};
pub use comment_tree::CommentTree;
pub use geo::Coordinates;
pub use heat::HeatTier;
pub use need::{Need, NeedCategory, NeedFilter, NewNeed, Proximity};
pub use report::{ContentRef, NewReport, Report, ReportReason, ReportStatus, TrashedItem};
pub use user::{Role, User, Viewer};
pub use vote::{VoteCounts, VoteDirection, VoteTarget};
