//! Marker Collaborator Interface
//!
//! The map surface that renders sightings is supplied by the host. The core
//! needs exactly these operations from it. A marker is removed from the map
//! when its handle is dropped.

use crate::config::MarkerIcon;
use crate::values::LatLng;

/// A map surface that can place markers
pub trait MarkerSurface {
    type Marker: MarkerHandle<Self>;

    fn create_marker(&self, position: LatLng) -> Self::Marker;
}

/// One rendered marker
pub trait MarkerHandle<S: ?Sized> {
    fn set_icon(&mut self, icon: &MarkerIcon);

    /// Popup content, as HTML
    fn bind_content(&mut self, html: &str);

    fn show_popup(&mut self);

    fn hide_popup(&mut self);

    fn attach(&mut self, surface: &S);
}
