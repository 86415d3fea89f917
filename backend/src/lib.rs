//! Cat Map Backend
//!
//! Layered architecture:
//! - domain: entity abstraction and errors
//! - repository: SQLite storage of cat aggregates
//! - import: bulk loading of backend JSON records
//!
//! Cats are validated by the `catmap` core on the way in and on the way out.

pub mod config;
pub mod domain;
pub mod import;
pub mod logging;
pub mod repository;

pub use config::BackendConfig;
pub use domain::{DomainError, DomainResult, Entity};
pub use import::{import_records, ImportReport};
pub use repository::{init_db, CatRepository, DbConn, Repository};
