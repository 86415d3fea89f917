//! Loaded Cat Store
//!
//! Cats currently on the map, by id, with batch loading and exclusive
//! selection helpers.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{CatError, Result};
use crate::layer::MapLayer;
use crate::marker::MarkerSurface;
use crate::models::{Cat, CatId};
use crate::values::kind_of;

/// Outcome of a batch load
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<CatId>,
    /// Position in the batch and the reason each record was skipped
    pub skipped: Vec<(usize, CatError)>,
}

/// All cats loaded into the map
#[derive(Debug, Default)]
pub struct CatStore {
    cats: BTreeMap<CatId, Cat>,
}

impl CatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON array of cat records.
    ///
    /// A malformed record is skipped and reported; it never aborts the
    /// rest of the batch. A record whose id is already loaded replaces the
    /// old cat and its markers.
    pub fn load_batch<S: MarkerSurface>(
        &mut self,
        records: &Value,
        layer: &mut MapLayer<S>,
    ) -> Result<LoadReport> {
        let items = records.as_array().ok_or_else(|| {
            CatError::malformed("", format!("expected an array, found {}", kind_of(records)))
        })?;

        let mut report = LoadReport::default();
        for (index, record) in items.iter().enumerate() {
            match crate::wire::deserialize_cat(record) {
                Ok(cat) => {
                    let id = cat.id();
                    if self.cats.contains_key(&id) {
                        layer.unbind_cat(id);
                    }
                    layer.bind_cat(&cat);
                    self.cats.insert(id, cat);
                    report.loaded.push(id);
                }
                Err(err) => {
                    log::warn!("skipping cat record {}: {}", index, err);
                    report.skipped.push((index, err));
                }
            }
        }
        log::info!(
            "loaded {} cats, skipped {}",
            report.loaded.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Add a cat that was built in memory and bind its markers
    pub fn insert<S: MarkerSurface>(&mut self, cat: Cat, layer: &mut MapLayer<S>) {
        let id = cat.id();
        layer.unbind_cat(id);
        layer.bind_cat(&cat);
        self.cats.insert(id, cat);
    }

    pub fn get(&self, id: CatId) -> Option<&Cat> {
        self.cats.get(&id)
    }

    /// Mutable access; call `MapLayer::sync_cat` after changing sightings
    pub fn get_mut(&mut self, id: CatId) -> Option<&mut Cat> {
        self.cats.get_mut(&id)
    }

    /// Remove a cat and its markers
    pub fn remove<S: MarkerSurface>(&mut self, id: CatId, layer: &mut MapLayer<S>) -> Option<Cat> {
        let cat = self.cats.remove(&id)?;
        layer.unbind_cat(id);
        Some(cat)
    }

    /// Select one cat and deselect every other.
    ///
    /// Returns false if no cat has that id, in which case nothing changes.
    pub fn select_only<S: MarkerSurface>(&mut self, id: CatId, layer: &mut MapLayer<S>) -> bool {
        if !self.cats.contains_key(&id) {
            return false;
        }
        for (other_id, cat) in self.cats.iter_mut() {
            if *other_id != id && cat.is_selected() {
                layer.deselect_all(cat);
            }
        }
        if let Some(cat) = self.cats.get_mut(&id) {
            layer.select_all(cat);
        }
        true
    }

    /// Deselect every cat
    pub fn clear_selection<S: MarkerSurface>(&mut self, layer: &mut MapLayer<S>) {
        for cat in self.cats.values_mut().filter(|c| c.is_selected()) {
            layer.deselect_all(cat);
        }
    }

    pub fn selected(&self) -> impl Iterator<Item = &Cat> {
        self.cats.values().filter(|c| c.is_selected())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cat> {
        self.cats.values()
    }

    pub fn len(&self) -> usize {
        self.cats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cats.is_empty()
    }
}
