use serde::{Deserialize, Serialize};

use crate::DocumentError;

/// Fixed path of the map configuration document.
pub const MAP_CONFIG_PATH: &str = "/maps.json";

/// Raster tile layers never zoom past this level.
pub const RASTER_MAX_ZOOM: u8 = 19;

/// Map/tile configuration served by the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    pub provider: String,
    pub tile_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_data_zoom: Option<u8>,
    // Older servers nest the vector theme under the provider name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protomaps: Option<ProtomapsOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtomapsOptions {
    #[serde(default)]
    pub theme: Option<String>,
}

/// The base layer a map is provisioned with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TileProvider {
    Raster {
        url_template: String,
        max_zoom: u8,
    },
    Vector {
        url: String,
        theme: Option<String>,
        max_data_zoom: Option<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported map tile provider: {0:?}")]
pub struct UnsupportedProvider(pub String);

impl MapConfig {
    pub fn from_json(body: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn tile_provider(&self) -> Result<TileProvider, UnsupportedProvider> {
        match self.provider.trim().to_ascii_lowercase().as_str() {
            "tile" | "leaflet" => Ok(TileProvider::Raster {
                url_template: self.tile_url.clone(),
                max_zoom: RASTER_MAX_ZOOM,
            }),
            "vector" | "protomaps" => Ok(TileProvider::Vector {
                url: self.tile_url.clone(),
                theme: self
                    .theme
                    .clone()
                    .or_else(|| self.protomaps.as_ref().and_then(|p| p.theme.clone())),
                max_data_zoom: self.max_data_zoom,
            }),
            _ => Err(UnsupportedProvider(self.provider.clone())),
        }
    }
}
