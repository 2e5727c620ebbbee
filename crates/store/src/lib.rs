mod cache;
mod memory;

pub use cache::{resolve_operation, ResolveError};
pub use memory::MemStorage;
