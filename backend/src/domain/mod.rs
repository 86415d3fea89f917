//! Domain Layer
//!
//! Entity abstraction and domain errors. The entities themselves come from
//! the `catmap` core.

mod cat;
mod entity;

pub use entity::{DomainError, DomainResult, Entity};
