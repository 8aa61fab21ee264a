mod backend;
pub mod db;
mod memory;
pub mod security;

pub use backend::{ChangeEvent, ChangeKind, ChangeStream, DataBackend, Table};
pub use db::SeaOrmBackend;
pub use memory::MemoryBackend;
