use formats::Geometry;
use foundation::{LatLng, LatLngBounds};
use serde::Serialize;

use crate::pane::PaneKind;
use crate::symbology::{MarkerStyle, PathStyle};

/// How point positions inside a drawn geometry become markers.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct PointHandler {
    pub marker_pane: PaneKind,
    pub tooltip_pane: PaneKind,
    pub style: MarkerStyle,
}

impl PointHandler {
    /// Markers on the centroid pane, tooltips above them.
    pub const fn centroids(style: MarkerStyle) -> Self {
        Self {
            marker_pane: PaneKind::Centroids,
            tooltip_pane: PaneKind::Tooltips,
            style,
        }
    }
}

/// Draw configuration for one outline or geometry body.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct LayerRequest {
    pub style: PathStyle,
    pub pane: PaneKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_to_layer: Option<PointHandler>,
}

impl LayerRequest {
    pub const fn new(style: PathStyle, pane: PaneKind) -> Self {
        Self {
            style,
            pane,
            point_to_layer: None,
        }
    }

    pub const fn with_points(mut self, handler: PointHandler) -> Self {
        self.point_to_layer = Some(handler);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub text: String,
    pub pane: PaneKind,
}

impl Tooltip {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pane: PaneKind::Tooltips,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    BoundingBox {
        bounds: LatLngBounds,
        request: LayerRequest,
    },
    Geometry {
        geometry: Geometry,
        request: LayerRequest,
    },
    Marker {
        at: LatLng,
        style: MarkerStyle,
        pane: PaneKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        tooltip: Option<Tooltip>,
    },
}

impl DrawCommand {
    pub fn marker(at: LatLng, handler: PointHandler, tooltip: Option<String>) -> Self {
        DrawCommand::Marker {
            at,
            style: handler.style,
            pane: handler.marker_pane,
            tooltip: tooltip.map(|text| Tooltip {
                text,
                pane: handler.tooltip_pane,
            }),
        }
    }

    pub fn pane(&self) -> PaneKind {
        match self {
            DrawCommand::BoundingBox { request, .. } | DrawCommand::Geometry { request, .. } => {
                request.pane
            }
            DrawCommand::Marker { pane, .. } => *pane,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Viewport {
    Center { center: LatLng, zoom: f64 },
    Fit { bounds: LatLngBounds },
}
