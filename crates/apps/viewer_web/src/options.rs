//! Option objects handed to Leaflet, built as JSON so they can be checked
//! off the browser.

use formats::TileProvider;
use layers::{PaneKind, PathStyle};
use serde::Serialize;
use serde_json::{Map, Value, json};

/// Style options with the target pane folded in.
pub fn path_options<T: Serialize>(style: &T, pane: PaneKind) -> Result<Value, serde_json::Error> {
    let mut opts = serde_json::to_value(style)?;
    if let Value::Object(map) = &mut opts {
        map.insert("pane".to_string(), json!(pane.name()));
    }
    Ok(opts)
}

/// `L.geoJSON` options: a fixed style and the body's pane.
pub fn geometry_options(style: &PathStyle, pane: PaneKind) -> Result<Value, serde_json::Error> {
    Ok(json!({
        "style": serde_json::to_value(style)?,
        "pane": pane.name(),
    }))
}

pub fn tooltip_options(pane: PaneKind) -> Value {
    json!({ "pane": pane.name() })
}

/// Options for the tile layer constructor matching `provider`.
pub fn tile_options(provider: &TileProvider) -> Value {
    match provider {
        TileProvider::Raster { max_zoom, .. } => json!({ "maxZoom": max_zoom }),
        TileProvider::Vector {
            url,
            theme,
            max_data_zoom,
        } => {
            let mut opts = Map::new();
            opts.insert("url".to_string(), json!(url));
            if let Some(theme) = theme {
                opts.insert("theme".to_string(), json!(theme));
            }
            if let Some(z) = max_data_zoom {
                opts.insert("maxDataZoom".to_string(), json!(z));
            }
            Value::Object(opts)
        }
    }
}
