//! Length limits on user-written text, in characters. Shared by server-side
//! validation and the form fields in the browser.

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_DESCRIPTION_CHARS: usize = 2000;
pub const MAX_COMMENT_CHARS: usize = 2000;
pub const MAX_REPORT_NOTE_CHARS: usize = 500;
