//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - Update/patch DTOs where the entity is mutable

pub mod generation;
pub mod model;
pub mod platform_settings;
pub mod profile;
pub mod transaction;
