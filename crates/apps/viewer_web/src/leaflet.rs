use std::rc::Rc;

use formats::TileProvider;
use foundation::{LatLng, LatLngBounds};
use layers::{DrawCommand, MapSurface, MissingElement, PaneKind, PointHandler, SurfaceFactory};
use serde::Serialize;
use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::options;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = L, js_name = Map)]
    type LeafletMap;

    #[wasm_bindgen(js_namespace = L, js_name = map)]
    fn leaflet_map(el: &web_sys::HtmlElement) -> LeafletMap;

    #[wasm_bindgen(method, js_name = createPane)]
    fn create_pane(this: &LeafletMap, name: &str) -> web_sys::HtmlElement;

    #[wasm_bindgen(method, js_name = setView)]
    fn set_view(this: &LeafletMap, center: &JsValue, zoom: f64);

    #[wasm_bindgen(method, js_name = fitBounds)]
    fn fit_bounds(this: &LeafletMap, bounds: &JsValue);

    type Layer;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &Layer, map: &LeafletMap) -> Layer;

    #[wasm_bindgen(method, js_name = bindTooltip)]
    fn bind_tooltip(this: &Layer, text: &str, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = tileLayer)]
    fn tile_layer(url: &str, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = rectangle)]
    fn rectangle(bounds: &JsValue, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = geoJSON)]
    fn geo_json(data: &JsValue, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = circleMarker)]
    fn circle_marker(at: &JsValue, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = protomapsL, js_name = leafletLayer)]
    fn protomaps_layer(options: &JsValue) -> Layer;
}

fn to_js<T: Serialize + ?Sized>(v: &T) -> Result<JsValue, JsValue> {
    Ok(v.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?)
}

fn lat_lng(p: LatLng) -> Result<JsValue, JsValue> {
    to_js(&[p.lat, p.lng])
}

fn bounds(b: LatLngBounds) -> Result<JsValue, JsValue> {
    to_js(&[[b.south_west.lat, b.south_west.lng], [b.north_east.lat, b.north_east.lng]])
}

fn path_options<T: Serialize>(style: &T, pane: PaneKind) -> Result<JsValue, JsValue> {
    let opts = options::path_options(style, pane).map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&opts)
}

fn marker_layer(at: &JsValue, handler: &PointHandler) -> Result<Layer, JsValue> {
    Ok(circle_marker(at, &path_options(&handler.style, handler.marker_pane)?))
}

/// A Leaflet map bound to one element.
pub struct LeafletSurface {
    map: LeafletMap,
}

impl LeafletSurface {
    fn install_tiles(&self, provider: &TileProvider) -> Result<(), JsValue> {
        let opts = to_js(&options::tile_options(provider))?;
        let layer = match provider {
            TileProvider::Raster { url_template, .. } => tile_layer(url_template, &opts),
            TileProvider::Vector { .. } => protomaps_layer(&opts),
        };
        layer.add_to(&self.map);
        Ok(())
    }

    fn try_draw(&self, command: &DrawCommand) -> Result<(), JsValue> {
        match command {
            DrawCommand::BoundingBox { bounds: b, request } => {
                let opts = path_options(&request.style, request.pane)?;
                rectangle(&bounds(*b)?, &opts).add_to(&self.map);
            }
            DrawCommand::Geometry { geometry, request } => {
                let geo_opts = options::geometry_options(&request.style, request.pane)
                    .map_err(|e| JsValue::from_str(&e.to_string()))?;
                let geo_opts = to_js(&geo_opts)?;
                if let Some(handler) = request.point_to_layer {
                    let point_to_layer = Closure::<dyn Fn(JsValue, JsValue) -> JsValue>::new(
                        move |_feature: JsValue, at: JsValue| -> JsValue {
                            match marker_layer(&at, &handler) {
                                Ok(layer) => layer.into(),
                                Err(err) => {
                                    warn!(?err, "could not build point marker");
                                    JsValue::NULL
                                }
                            }
                        },
                    );
                    js_sys::Reflect::set(
                        &geo_opts,
                        &JsValue::from_str("pointToLayer"),
                        &point_to_layer.into_js_value(),
                    )?;
                }
                geo_json(&to_js(geometry)?, &geo_opts).add_to(&self.map);
            }
            DrawCommand::Marker {
                at,
                style,
                pane,
                tooltip,
            } => {
                let marker = circle_marker(&lat_lng(*at)?, &path_options(style, *pane)?);
                if let Some(t) = tooltip {
                    marker.bind_tooltip(&t.text, &to_js(&options::tooltip_options(t.pane))?);
                }
                marker.add_to(&self.map);
            }
        }
        Ok(())
    }
}

impl MapSurface for LeafletSurface {
    fn create_pane(&self, pane: PaneKind) {
        let el = self.map.create_pane(pane.name());
        if let Err(err) = el.style().set_property("z-index", &pane.z_index().to_string()) {
            warn!(pane = pane.name(), ?err, "could not set pane z-index");
        }
    }

    fn add_tile_layer(&self, provider: &TileProvider) {
        if let Err(err) = self.install_tiles(provider) {
            warn!(?err, "could not install tile layer");
        }
    }

    fn set_view(&self, center: LatLng, zoom: f64) {
        match lat_lng(center) {
            Ok(at) => self.map.set_view(&at, zoom),
            Err(err) => warn!(?err, "could not set view"),
        }
    }

    fn fit_bounds(&self, b: LatLngBounds) {
        match bounds(b) {
            Ok(b) => self.map.fit_bounds(&b),
            Err(err) => warn!(?err, "could not fit bounds"),
        }
    }

    fn draw(&self, command: &DrawCommand) {
        if let Err(err) = self.try_draw(command) {
            warn!(pane = command.pane().name(), ?err, "draw skipped");
        }
    }
}

/// Creates Leaflet maps on elements of the current document.
#[derive(Debug, Default)]
pub struct LeafletFactory;

impl SurfaceFactory for LeafletFactory {
    fn create(&self, mount_id: &str) -> Result<Rc<dyn MapSurface>, MissingElement> {
        let el = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(mount_id))
            .and_then(|e| e.dyn_into::<web_sys::HtmlElement>().ok())
            .ok_or_else(|| MissingElement(mount_id.to_string()))?;
        Ok(Rc::new(LeafletSurface {
            map: leaflet_map(&el),
        }))
    }
}
