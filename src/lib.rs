pub mod config;
pub mod console;
pub mod models;
pub mod serde_utils;
pub mod storage;
