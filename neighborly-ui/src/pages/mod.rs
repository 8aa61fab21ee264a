mod map;
mod need_detail;

pub use map::MapPage;
pub use need_detail::NeedDetailPage;
