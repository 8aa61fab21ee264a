mod client_ip;
mod input_sanitizer;
mod rate_limiter;

pub use client_ip::ClientIp;
pub use crate::domain::limits::{
    MAX_COMMENT_CHARS, MAX_DESCRIPTION_CHARS, MAX_REPORT_NOTE_CHARS, MAX_TITLE_CHARS,
};
pub use input_sanitizer::InputSanitizer;
pub use rate_limiter::RateLimiter;
