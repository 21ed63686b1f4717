//! Object storage.
//!
//! [`Storage`] is the single facade every consumer talks to. Two backends
//! implement it:
//!
//! - [`FileStorage`]: all objects in memory, persisted as one JSON document
//! - [`SqliteStorage`]: one table per class in a SQLite database
//!
//! Both present the same observable behaviour: `new` registers, `save` makes
//! durable, `reload` (re)loads or establishes durable state.

mod engine;
mod error;
mod file;
pub mod sqlite;


pub use engine::{Objects, Storage};
pub use error::{StorageError, StorageResult};
pub use file::FileStorage;
pub use sqlite::SqliteStorage;
