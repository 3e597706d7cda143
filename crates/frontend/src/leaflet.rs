use std::collections::HashMap;

use relief_shared::geo::{Bounds, LatLng, INITIAL_CENTER, INITIAL_ZOOM};
use relief_shared::markers::{MapSurface, MarkerLabel};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const TILE_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";

// Leaflet comes from a CDN script tag and is reached through the global `L`.
#[wasm_bindgen]
extern "C" {
    #[derive(Debug, Clone)]
    pub type LeafletMap;

    #[wasm_bindgen(catch, js_namespace = L, js_name = map)]
    fn new_map(element_id: &str) -> Result<LeafletMap, JsValue>;

    #[wasm_bindgen(method, js_name = setView)]
    fn set_view(this: &LeafletMap, center: &JsValue, zoom: f64, options: &JsValue) -> LeafletMap;

    #[wasm_bindgen(method, js_name = fitBounds)]
    fn fit_bounds(this: &LeafletMap, bounds: &JsValue, options: &JsValue) -> LeafletMap;

    #[wasm_bindgen(method)]
    fn remove(this: &LeafletMap) -> LeafletMap;

    type TileLayer;

    #[wasm_bindgen(js_namespace = L, js_name = tileLayer)]
    fn tile_layer(url: &str, options: &JsValue) -> TileLayer;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &TileLayer, map: &LeafletMap) -> TileLayer;

    #[derive(Debug, Clone)]
    pub type LeafletMarker;

    #[wasm_bindgen(js_namespace = L, js_name = marker)]
    fn new_marker(at: &JsValue) -> LeafletMarker;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &LeafletMarker, map: &LeafletMap) -> LeafletMarker;

    #[wasm_bindgen(method, js_name = bindPopup)]
    fn bind_popup(this: &LeafletMarker, html: &str) -> LeafletMarker;

    #[wasm_bindgen(method, js_name = openPopup)]
    fn open_popup(this: &LeafletMarker) -> LeafletMarker;

    #[wasm_bindgen(method)]
    fn remove(this: &LeafletMarker) -> LeafletMarker;

    #[wasm_bindgen(method)]
    fn on(this: &LeafletMarker, event: &str, handler: &js_sys::Function) -> LeafletMarker;
}

/// True once the Leaflet script has defined the global `L`.
pub fn leaflet_loaded() -> bool {
    js_sys::Reflect::has(&js_sys::global(), &JsValue::from_str("L")).unwrap_or(false)
}

fn lat_lng(at: LatLng) -> JsValue {
    js_sys::Array::of2(&at.lat.into(), &at.lng.into()).into()
}

fn bounds_value(bounds: Bounds) -> JsValue {
    let [[south, west], [north, east]] = bounds.corners();
    js_sys::Array::of2(
        &lat_lng(LatLng::new(south, west)),
        &lat_lng(LatLng::new(north, east)),
    )
    .into()
}

fn options(entries: &[(&str, JsValue)]) -> JsValue {
    let object = js_sys::Object::new();
    for (key, value) in entries {
        let _ = js_sys::Reflect::set(&object, &JsValue::from_str(key), value);
    }
    object.into()
}

/// A live marker plus the key its click closure is stored under.
#[derive(Debug, Clone)]
pub struct MarkerHandle {
    key: u32,
    marker: LeafletMarker,
}

/// A Leaflet map mounted in one DOM element.
pub struct LeafletSurface {
    map: LeafletMap,
    next_key: u32,
    click_handlers: HashMap<u32, Closure<dyn Fn()>>,
}

impl LeafletSurface {
    /// Create the map inside the element with `element_id`, with an
    /// OpenStreetMap tile layer and the world-level initial viewport.
    pub fn mount(element_id: &str) -> Result<Self, JsValue> {
        let map = new_map(element_id)?;
        map.set_view(&lat_lng(INITIAL_CENTER), INITIAL_ZOOM, &options(&[]));
        tile_layer(
            TILE_URL,
            &options(&[("attribution", JsValue::from_str(TILE_ATTRIBUTION))]),
        )
        .add_to(&map);

        tracing::debug!(element_id, "Mounted Leaflet map");
        Ok(LeafletSurface {
            map,
            next_key: 0,
            click_handlers: HashMap::new(),
        })
    }

    /// Tear the map down. Markers should be disposed first.
    pub fn destroy(self) {
        self.map.remove();
    }
}

impl MapSurface for LeafletSurface {
    type Marker = MarkerHandle;

    fn set_viewport(&mut self, center: LatLng, zoom: f64, animate: bool) {
        self.map.set_view(
            &lat_lng(center),
            zoom,
            &options(&[("animate", JsValue::from_bool(animate))]),
        );
    }

    fn fit_bounds(&mut self, bounds: Bounds, padding: f64, max_zoom: f64) {
        let padding = js_sys::Array::of2(&padding.into(), &padding.into());
        self.map.fit_bounds(
            &bounds_value(bounds),
            &options(&[
                ("padding", padding.into()),
                ("maxZoom", JsValue::from_f64(max_zoom)),
            ]),
        );
    }

    fn add_marker(&mut self, at: LatLng, label: &MarkerLabel) -> MarkerHandle {
        let marker = new_marker(&lat_lng(at)).add_to(&self.map);
        marker.bind_popup(&label.popup_html());
        self.next_key += 1;
        MarkerHandle {
            key: self.next_key,
            marker,
        }
    }

    fn remove_marker(&mut self, marker: &MarkerHandle) {
        marker.marker.remove();
        self.click_handlers.remove(&marker.key);
    }

    fn on_marker_click(&mut self, marker: &MarkerHandle, callback: Box<dyn Fn()>) {
        let closure = Closure::wrap(callback);
        marker.marker.on("click", closure.as_ref().unchecked_ref());
        self.click_handlers.insert(marker.key, closure);
    }

    fn open_popup(&mut self, marker: &MarkerHandle) {
        marker.marker.open_popup();
    }
}
