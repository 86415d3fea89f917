//! Bulk import of cat records
//!
//! Takes the same JSON array the map loads and stores every well-formed
//! record. A malformed record is reported and skipped; storage errors abort.

use serde_json::Value;

use catmap::wire;
use catmap::{CatError, CatId};

use crate::domain::{DomainError, DomainResult};
use crate::repository::{CatRepository, Repository};

/// Outcome of an import run
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Ids the stored cats ended up with
    pub stored: Vec<CatId>,
    /// Position in the input and the reason each record was skipped
    pub skipped: Vec<(usize, CatError)>,
}

/// Store every valid record of `records`.
///
/// With `keep_ids` each cat is stored under the id in its record and an id
/// that already exists is a `Conflict`; otherwise the database assigns ids.
pub async fn import_records(
    repo: &CatRepository,
    records: &Value,
    keep_ids: bool,
) -> DomainResult<ImportReport> {
    let items = records.as_array().ok_or_else(|| {
        DomainError::InvalidInput("expected a JSON array of cat records".to_string())
    })?;

    let mut report = ImportReport::default();
    for (index, record) in items.iter().enumerate() {
        let cat = match wire::deserialize_cat(record) {
            Ok(cat) => cat,
            Err(err) => {
                log::warn!("skipping record {}: {}", index, err);
                report.skipped.push((index, err));
                continue;
            }
        };

        let stored = if keep_ids {
            repo.restore(&cat).await?
        } else {
            repo.create(&cat).await?
        };
        report.stored.push(stored.id());
    }

    log::info!(
        "imported {} cats, skipped {}",
        report.stored.len(),
        report.skipped.len()
    );
    Ok(report)
}
