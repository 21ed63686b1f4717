//! SQLite implementation of the storage trait.
//!
//! One table per entity class plus the `place_amenity` association table.
//! The schema lives in `data/sql/sqlite` and is embedded at compile time.

mod connection;
mod helpers;
mod schema;
mod store;

#[cfg(test)]
mod store_test;

pub use connection::SqliteStorage;
