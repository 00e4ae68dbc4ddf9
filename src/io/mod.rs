//! I/O primitives: filesystem abstraction and the shared reader cache

pub mod file_system;
pub mod reader_cache;
