//! Map Layer
//!
//! Owns the marker of every bound sighting, keyed by `SightingId`, and keeps
//! those markers consistent with each cat's selection state. Sighting ids
//! are only unique within one `Cat` instance, so the layer remembers which
//! instance its markers belong to; binding another instance with the same
//! cat id replaces them.
//!
//! A cat is either entirely selected or entirely deselected. `select_all`
//! and `deselect_all` update every marker of the cat before returning, so
//! callers never observe a half-applied state. The layer is single-threaded;
//! on a multi-threaded host, confine each layer to one thread.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::config::{IconSet, IconVariant, PresentationConfig};
use crate::error::Result;
use crate::marker::{MarkerHandle, MarkerSurface};
use crate::models::{Cat, CatId, SightingId};
use crate::popup::PopupRenderer;
use crate::wire;

/// Presentation binding between cats and a marker surface
pub struct MapLayer<S: MarkerSurface> {
    surface: S,
    icons: IconSet,
    popups: PopupRenderer,
    open_popups_on_select: bool,
    markers: HashMap<SightingId, S::Marker>,
    /// Instance of the cat each bound id belongs to
    owners: HashMap<CatId, u64>,
}

impl<S: MarkerSurface> MapLayer<S> {
    pub fn new(surface: S, config: PresentationConfig) -> Self {
        Self {
            popups: PopupRenderer::new(&config),
            open_popups_on_select: config.open_popups_on_select,
            icons: config.icons,
            surface,
            markers: HashMap::new(),
            owners: HashMap::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Deserialize a backend record and bind its sightings.
    ///
    /// Nothing is bound if the record is malformed.
    pub fn load_cat(&mut self, value: &Value) -> Result<Cat> {
        let cat = wire::deserialize_cat(value)?;
        self.bind_cat(&cat);
        Ok(cat)
    }

    /// Create markers for every sighting of `cat` that has none yet.
    ///
    /// Markers left by a different instance with the same cat id are
    /// dropped first.
    pub fn bind_cat(&mut self, cat: &Cat) {
        self.bind_missing(cat);
    }

    /// Bind unbound sightings, returning the ids that got a new marker
    fn bind_missing(&mut self, cat: &Cat) -> HashSet<SightingId> {
        self.claim(cat);

        let variant = variant_for(cat);
        let mut created = HashSet::new();
        for (id, sighting) in cat.entries() {
            if self.markers.contains_key(&id) {
                continue;
            }
            let mut marker = self.surface.create_marker(sighting.position);
            marker.set_icon(self.icons.get(variant));
            marker.bind_content(&self.popups.render(cat, sighting));
            marker.attach(&self.surface);
            if cat.is_selected() && self.open_popups_on_select {
                marker.show_popup();
            }
            log::debug!("bound marker for sighting {}/{}", id.cat, id.seq);
            self.markers.insert(id, marker);
            created.insert(id);
        }
        created
    }

    /// Make `cat` the owner of its id's markers, unbinding another instance's
    fn claim(&mut self, cat: &Cat) {
        let previous = self.owners.insert(cat.id(), cat.instance());
        if previous.is_some_and(|instance| instance != cat.instance()) {
            log::debug!("cat {}: replacing markers of an earlier instance", cat.id());
            let cat_id = cat.id();
            self.markers.retain(|id, _| id.cat != cat_id);
        }
    }

    /// Bring the markers of `cat` in line with its current sightings.
    ///
    /// Markers of removed sightings are dropped, new sightings are bound,
    /// and every popup is re-rendered.
    pub fn sync_cat(&mut self, cat: &Cat) {
        self.claim(cat);
        let cat_id = cat.id();
        let before = self.markers.len();
        self.markers
            .retain(|id, _| id.cat != cat_id || cat.index_of(*id).is_some());
        let dropped = before - self.markers.len();
        if dropped > 0 {
            log::debug!("cat {}: dropped {} stale markers", cat_id, dropped);
        }

        for (id, sighting) in cat.entries() {
            if let Some(marker) = self.markers.get_mut(&id) {
                marker.bind_content(&self.popups.render(cat, sighting));
            }
        }
        self.bind_cat(cat);
    }

    /// Drop every marker belonging to a cat
    pub fn unbind_cat(&mut self, cat_id: CatId) {
        self.owners.remove(&cat_id);
        self.markers.retain(|id, _| id.cat != cat_id);
    }

    /// Select a cat: every marker highlighted, popups shown
    pub fn select_all(&mut self, cat: &mut Cat) {
        let changed = !cat.is_selected();
        cat.set_selected(true);
        self.apply_selection(cat, changed);
    }

    /// Deselect a cat: every marker back to default, popups hidden
    pub fn deselect_all(&mut self, cat: &mut Cat) {
        let changed = cat.is_selected();
        cat.set_selected(false);
        self.apply_selection(cat, changed);
    }

    /// Flip a cat's selection, returning the new state
    pub fn toggle(&mut self, cat: &mut Cat) -> bool {
        if cat.is_selected() {
            self.deselect_all(cat);
        } else {
            self.select_all(cat);
        }
        cat.is_selected()
    }

    pub fn is_bound(&self, id: SightingId) -> bool {
        self.markers.contains_key(&id)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Re-assert every marker's icon; popups only move on a state change.
    /// Markers created here already carry the right state.
    fn apply_selection(&mut self, cat: &Cat, changed: bool) {
        let created = self.bind_missing(cat);

        let selected = cat.is_selected();
        let icon = self.icons.get(variant_for(cat));
        for id in cat.sighting_ids() {
            if created.contains(id) {
                continue;
            }
            let Some(marker) = self.markers.get_mut(id) else {
                continue;
            };
            marker.set_icon(icon);
            if !changed {
                continue;
            }
            if selected {
                if self.open_popups_on_select {
                    marker.show_popup();
                }
            } else {
                marker.hide_popup();
            }
        }
        log::debug!(
            "cat {} {}",
            cat.id(),
            if selected { "selected" } else { "deselected" }
        );
    }
}

fn variant_for(cat: &Cat) -> IconVariant {
    if cat.is_selected() {
        IconVariant::Highlighted
    } else {
        IconVariant::Default
    }
}
