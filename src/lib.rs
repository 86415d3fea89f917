//! Cat Map Core
//!
//! Layered architecture:
//! - values / models: coordinates, timestamps and the Cat aggregate
//! - wire: JSON records exchanged with the backend
//! - derived: friendliness summary and best-image selection
//! - layer / store: markers, popups and selection on the map
//!
//! The core does no network I/O; it consumes and produces `serde_json` values.

mod config;
mod derived;
mod error;
mod layer;
mod marker;
mod models;
mod popup;
mod store;
mod values;
pub mod wire;

#[cfg(feature = "leaflet")]
pub mod leaflet;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod tests;

pub use config::{IconSet, IconVariant, MarkerIcon, PresentationConfig};
pub use derived::{best_image_url, friendliness, friendliness_label, resolve_best_image};
pub use error::{CatError, Result};
pub use layer::MapLayer;
pub use marker::{MarkerHandle, MarkerSurface};
pub use models::{
    BestImage, Cat, CatId, CatSighting, Friendliness, KnownColour, SightingId,
    FRIENDLINESS_LABELS,
};
pub use popup::PopupRenderer;
pub use store::{CatStore, LoadReport};
pub use values::{parse_timestamp, timestamp_from_unix, unix_seconds, CoordError, LatLng};
pub use wire::{deserialize_cat, serialize_cat};
