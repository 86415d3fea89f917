//! Configuration for the backend
//!
//! Command-line arguments with environment variable fallback using clap.

use clap::Args;
use std::path::PathBuf;

use crate::domain::DomainResult;
use crate::repository::{init_db, CatRepository};

/// Where the cat database lives
#[derive(Args, Debug, Clone, PartialEq)]
pub struct BackendConfig {
    /// SQLite database file, or `:memory:` for a throwaway database
    #[arg(long = "db", env = "CATMAP_DB", default_value = "catmap.db")]
    pub db_path: PathBuf,
}

impl BackendConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }

    /// Open the database and return a repository over it
    pub async fn open(&self) -> DomainResult<CatRepository> {
        let conn = init_db(&self.db_path).await?;
        Ok(CatRepository::new(conn))
    }
}
