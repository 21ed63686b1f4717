//! Domain entities for the hbnb console.
//!
//! These models are storage-agnostic: both backends persist them, and the
//! console manipulates them without knowing which backend is active.
//!
//! # Architecture
//!
//! - `class`: Closed registry of entity classes (`ClassName`)
//! - `entity`: Shared metadata (`Meta`), the concrete types and the tagged `Entity`
//! - `attributes`: Typed values for assigning attributes by name
//! - `error`: Model error types

mod attributes;
mod class;
mod entity;
mod error;
pub mod utils;

#[cfg(test)]
mod entity_test;

pub use attributes::{AttrType, AttrValue};
pub use class::ClassName;
pub use entity::{
    Amenity, CLASS_KEY, City, Entity, Id, Meta, Model, Place, Review, State, User, object_key,
};
pub use error::{ModelError, ModelResult};
