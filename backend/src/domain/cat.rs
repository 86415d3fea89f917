//! Cat entity
//!
//! The stored aggregate is the core `Cat`; only its identity is added here.

use catmap::{Cat, CatId};

use super::entity::Entity;

impl Entity for Cat {
    type Id = CatId;

    fn id(&self) -> CatId {
        Cat::id(self)
    }
}
