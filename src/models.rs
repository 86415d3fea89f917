//! Cat and CatSighting entities
//!
//! A `Cat` is the aggregate of every sighting reported for one animal. The
//! sighting records are plain data; their map markers live in the
//! presentation layer, keyed by `SightingId`.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::derived;
use crate::error::{CatError, Result};
use crate::values::LatLng;

/// Backend-assigned cat identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatId(pub u32);

impl fmt::Display for CatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one sighting inside its cat.
///
/// `seq` comes from a per-cat counter and is never handed out twice, so a
/// removed sighting's id cannot be confused with a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SightingId {
    pub cat: CatId,
    pub seq: u32,
}

/// Fixed labels for ratings 1..=5
pub const FRIENDLINESS_LABELS: [&str; 5] = [
    "Runs away",
    "Keeps a safe distance",
    "Indifferent",
    "Curious",
    "Will approach you",
];

/// A friendliness rating, always within 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Friendliness(u8);

impl Friendliness {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn label(&self) -> &'static str {
        FRIENDLINESS_LABELS[usize::from(self.0 - 1)]
    }
}

impl TryFrom<u8> for Friendliness {
    type Error = CatError;

    fn try_from(value: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CatError::InvariantViolation(format!(
                "friendliness {} is outside 1..=5",
                value
            )))
        }
    }
}

/// Colours the backend is known to send.
///
/// `Cat::colour` stays an open string; this is for callers that want strict
/// validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownColour {
    Black,
    White,
}

impl KnownColour {
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownColour::Black => "Black",
            KnownColour::White => "White",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Black" => Some(KnownColour::Black),
            "White" => Some(KnownColour::White),
            _ => None,
        }
    }
}

/// Pointer to `sightings[sighting].image_urls[image]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BestImage {
    pub sighting: usize,
    pub image: usize,
}

impl BestImage {
    pub fn new(sighting: usize, image: usize) -> Self {
        Self { sighting, image }
    }
}

/// One reported observation of a cat
#[derive(Debug, Clone, PartialEq)]
pub struct CatSighting {
    pub position: LatLng,
    pub observer: Option<String>,
    pub observed_at: DateTime<Utc>,
    /// Order matters: `BestImage::image` indexes into it
    pub image_urls: Vec<String>,
    pub friendliness: Option<Friendliness>,
    pub notes: Option<String>,
}

impl CatSighting {
    pub fn new(position: LatLng, observed_at: DateTime<Utc>) -> Self {
        Self {
            position,
            observer: None,
            observed_at,
            image_urls: Vec::new(),
            friendliness: None,
            notes: None,
        }
    }

    pub fn with_observer(mut self, observer: impl Into<String>) -> Self {
        self.observer = non_blank(Some(observer.into()));
        self
    }

    pub fn with_images<I, U>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<String>,
    {
        self.image_urls = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_friendliness(mut self, rating: Friendliness) -> Self {
        self.friendliness = Some(rating);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = non_blank(Some(notes.into()));
        self
    }

    pub fn has_images(&self) -> bool {
        !self.image_urls.is_empty()
    }
}

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

fn next_instance() -> u64 {
    NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed)
}

/// The aggregate record for one cat
#[derive(Debug)]
pub struct Cat {
    id: CatId,
    pub name: String,
    pub colour: String,
    pub markings: Option<String>,
    pub collar: Option<String>,
    pub description: Option<String>,
    sightings: Vec<CatSighting>,
    sighting_ids: Vec<SightingId>,
    next_seq: u32,
    best_image: Option<BestImage>,
    selected: bool,
    /// Distinguishes two in-memory cats with the same backend id
    instance: u64,
}

/// A clone is a separate instance; its sighting ids are not shared with
/// the original's markers.
impl Clone for Cat {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            colour: self.colour.clone(),
            markings: self.markings.clone(),
            collar: self.collar.clone(),
            description: self.description.clone(),
            sightings: self.sightings.clone(),
            sighting_ids: self.sighting_ids.clone(),
            next_seq: self.next_seq,
            best_image: self.best_image,
            selected: self.selected,
            instance: next_instance(),
        }
    }
}

impl Cat {
    /// Create a cat with no sightings
    pub fn new(id: CatId, name: impl Into<String>, colour: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            colour: colour.into(),
            markings: None,
            collar: None,
            description: None,
            sightings: Vec::new(),
            sighting_ids: Vec::new(),
            next_seq: 0,
            best_image: None,
            selected: false,
            instance: next_instance(),
        }
    }

    /// Build a cat from already-validated parts.
    ///
    /// An explicit `best_image` is kept as is (after a bounds check);
    /// otherwise the first-sighting fallback runs once.
    pub(crate) fn assemble(
        mut cat: Cat,
        sightings: Vec<CatSighting>,
        best_image: Option<BestImage>,
    ) -> Result<Self> {
        for sighting in sightings {
            cat.add_sighting(sighting);
        }
        cat.set_best_image(best_image)?;
        cat.refresh_best_image();
        Ok(cat)
    }

    pub fn id(&self) -> CatId {
        self.id
    }

    pub fn sightings(&self) -> &[CatSighting] {
        &self.sightings
    }

    pub fn sighting_ids(&self) -> &[SightingId] {
        &self.sighting_ids
    }

    /// Sightings in arrival order, paired with their ids
    pub fn entries(&self) -> impl Iterator<Item = (SightingId, &CatSighting)> + '_ {
        self.sighting_ids.iter().copied().zip(self.sightings.iter())
    }

    pub fn index_of(&self, id: SightingId) -> Option<usize> {
        self.sighting_ids.iter().position(|s| *s == id)
    }

    pub fn sighting(&self, id: SightingId) -> Option<&CatSighting> {
        self.index_of(id).map(|i| &self.sightings[i])
    }

    /// Append a sighting; arrival order is kept.
    ///
    /// Does not re-run best-image resolution.
    pub fn add_sighting(&mut self, sighting: CatSighting) -> SightingId {
        let id = SightingId {
            cat: self.id,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.sightings.push(sighting);
        self.sighting_ids.push(id);
        id
    }

    /// Remove a sighting, keeping `best_image` in bounds.
    ///
    /// A pointer into the removed sighting is cleared; pointers after it
    /// shift down by one.
    pub fn remove_sighting(&mut self, id: SightingId) -> Option<CatSighting> {
        let index = self.index_of(id)?;
        self.sighting_ids.remove(index);
        let removed = self.sightings.remove(index);
        self.best_image = match self.best_image {
            Some(best) if best.sighting == index => None,
            Some(best) if best.sighting > index => {
                Some(BestImage::new(best.sighting - 1, best.image))
            }
            other => other,
        };
        Some(removed)
    }

    pub fn best_image(&self) -> Option<BestImage> {
        self.best_image
    }

    /// Replace the best-image pointer; out-of-bounds pointers are refused
    pub fn set_best_image(&mut self, best: Option<BestImage>) -> Result<()> {
        if let Some(best) = best {
            if !self.points_at_image(best) {
                return Err(CatError::InvariantViolation(format!(
                    "best image ({}, {}) does not exist on cat {}",
                    best.sighting, best.image, self.id
                )));
            }
        }
        self.best_image = best;
        Ok(())
    }

    /// Run best-image resolution again, filling the pointer only if absent
    pub fn refresh_best_image(&mut self) {
        if self.best_image.is_none() {
            self.best_image = derived::resolve_best_image(self);
            if let Some(best) = self.best_image {
                log::debug!(
                    "cat {}: best image falls back to ({}, {})",
                    self.id,
                    best.sighting,
                    best.image
                );
            }
        }
    }

    pub(crate) fn instance(&self) -> u64 {
        self.instance
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub fn known_colour(&self) -> Option<KnownColour> {
        KnownColour::parse(&self.colour)
    }

    /// Check every structural invariant
    pub fn validate(&self) -> Result<()> {
        if self.sightings.len() != self.sighting_ids.len() {
            return Err(CatError::InvariantViolation(format!(
                "cat {} has {} sightings but {} sighting ids",
                self.id,
                self.sightings.len(),
                self.sighting_ids.len()
            )));
        }
        if let Some(best) = self.best_image {
            if !self.points_at_image(best) {
                return Err(CatError::InvariantViolation(format!(
                    "best image ({}, {}) does not exist on cat {}",
                    best.sighting, best.image, self.id
                )));
            }
        }
        Ok(())
    }

    fn points_at_image(&self, best: BestImage) -> bool {
        self.sightings
            .get(best.sighting)
            .is_some_and(|s| best.image < s.image_urls.len())
    }
}

/// Equality covers persisted data only: sighting ids and selection are
/// session state.
impl PartialEq for Cat {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.colour == other.colour
            && self.markings == other.markings
            && self.collar == other.collar
            && self.description == other.description
            && self.sightings == other.sightings
            && self.best_image == other.best_image
    }
}

/// Collapse empty or whitespace-only text to absent
pub(crate) fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}
