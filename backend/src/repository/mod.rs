//! Repository Layer
//!
//! Data access abstractions and implementations.

mod cat_repo;
mod db;
mod traits;


pub use cat_repo::CatRepository;
pub use db::{init_db, DbConn};
pub use traits::Repository;
