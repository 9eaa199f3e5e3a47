//! Storage backends for tinylink.
//!
//! Every backend implements [`tinylink_core::Storage`]: the volatile
//! [`InMemoryStorage`], the JSON-document [`FileStorage`] and the relational
//! [`MySqlStorage`].

pub mod error;
pub mod file;
pub mod memory;
pub mod mysql;

pub use error::{Result, StorageError};
pub use file::FileStorage;
pub use memory::InMemoryStorage;
pub use mysql::MySqlStorage;
pub use tinylink_core::Storage;
