//! Leaflet Marker Surface
//!
//! `MarkerSurface` over a Leaflet map already created by the page.
//! Expects the global `L` to be loaded.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::config::MarkerIcon;
use crate::marker::{MarkerHandle, MarkerSurface};
use crate::values::LatLng;

#[wasm_bindgen]
extern "C" {
    /// `L.Map`
    #[wasm_bindgen(js_namespace = L, js_name = Map)]
    pub type LeafletMap;

    #[wasm_bindgen(js_namespace = L, js_name = Marker)]
    type JsMarker;

    #[wasm_bindgen(js_namespace = L, js_name = marker)]
    fn new_marker(latlng: &js_sys::Array) -> JsMarker;

    #[wasm_bindgen(js_namespace = L, js_name = icon)]
    fn new_icon(options: &JsValue) -> JsValue;

    #[wasm_bindgen(method, js_name = setIcon)]
    fn set_icon(this: &JsMarker, icon: &JsValue);

    #[wasm_bindgen(method, js_name = bindPopup)]
    fn bind_popup(this: &JsMarker, content: &str);

    #[wasm_bindgen(method, js_name = openPopup)]
    fn open_popup(this: &JsMarker);

    #[wasm_bindgen(method, js_name = closePopup)]
    fn close_popup(this: &JsMarker);

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &JsMarker, map: &LeafletMap);

    #[wasm_bindgen(method)]
    fn remove(this: &JsMarker);
}

/// Options object for `L.icon`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IconOptions<'a> {
    icon_url: &'a str,
    icon_size: [f64; 2],
    icon_anchor: [f64; 2],
}

/// `L.icon` instances, created once per asset URL
type IconCache = Rc<RefCell<HashMap<String, JsValue>>>;

pub struct LeafletSurface {
    map: LeafletMap,
    icons: IconCache,
}

impl LeafletSurface {
    pub fn new(map: LeafletMap) -> Self {
        Self {
            map,
            icons: Rc::new(RefCell::new(HashMap::new())),
        }
    }
}

impl MarkerSurface for LeafletSurface {
    type Marker = LeafletMarker;

    fn create_marker(&self, position: LatLng) -> LeafletMarker {
        let latlng = js_sys::Array::of2(
            &JsValue::from_f64(position.lat()),
            &JsValue::from_f64(position.lng()),
        );
        LeafletMarker {
            inner: new_marker(&latlng),
            icons: Rc::clone(&self.icons),
        }
    }
}

/// A Leaflet marker; removed from the map when dropped
pub struct LeafletMarker {
    inner: JsMarker,
    icons: IconCache,
}

impl LeafletMarker {
    fn icon_for(&self, icon: &MarkerIcon) -> Option<JsValue> {
        if let Some(cached) = self.icons.borrow().get(&icon.url) {
            return Some(cached.clone());
        }
        let options = IconOptions {
            icon_url: &icon.url,
            icon_size: icon.size,
            icon_anchor: icon.anchor,
        };
        match serde_wasm_bindgen::to_value(&options) {
            Ok(options) => {
                let created = new_icon(&options);
                self.icons
                    .borrow_mut()
                    .insert(icon.url.clone(), created.clone());
                Some(created)
            }
            Err(e) => {
                log::warn!("cannot build Leaflet icon for {}: {}", icon.url, e);
                None
            }
        }
    }
}

impl MarkerHandle<LeafletSurface> for LeafletMarker {
    fn set_icon(&mut self, icon: &MarkerIcon) {
        if let Some(js_icon) = self.icon_for(icon) {
            self.inner.set_icon(&js_icon);
        }
    }

    fn bind_content(&mut self, html: &str) {
        self.inner.bind_popup(html);
    }

    fn show_popup(&mut self) {
        self.inner.open_popup();
    }

    fn hide_popup(&mut self) {
        self.inner.close_popup();
    }

    fn attach(&mut self, surface: &LeafletSurface) {
        self.inner.add_to(&surface.map);
    }
}

impl Drop for LeafletMarker {
    fn drop(&mut self) {
        self.inner.remove();
    }
}
