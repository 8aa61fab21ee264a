mod auth_bar;
mod comment_composer;
mod comment_thread;
mod error_display;
mod heat_badge;
mod loading_spinner;
mod need_composer;
mod report_button;
mod vote_buttons;

pub use auth_bar::AuthBar;
pub use comment_composer::CommentComposer;
pub use comment_thread::CommentThread;
pub use error_display::{error_message, ErrorDisplay};
pub use heat_badge::HeatBadge;
pub use loading_spinner::LoadingSpinner;
pub use need_composer::NeedComposer;
pub use report_button::ReportButton;
pub use vote_buttons::VoteButtons;
