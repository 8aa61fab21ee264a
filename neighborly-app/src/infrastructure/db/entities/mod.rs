pub mod comment;
pub mod need;
pub mod report;
pub mod user;

pub use comment::Entity as Comment;
pub use need::Entity as Need;
pub use report::Entity as Report;
pub use user::Entity as User;
