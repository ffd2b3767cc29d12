use serde::Serialize;

/// Stroke/fill options for outlines and geometry bodies.
///
/// Field names follow Leaflet's path options so a surface can pass the style
/// through unchanged.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStyle {
    pub color: &'static str,
    pub weight: f32,
    pub opacity: f32,
    pub fill: bool,
    pub fill_color: &'static str,
    pub fill_opacity: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<&'static str>,
}

impl PathStyle {
    pub const fn stroke(color: &'static str, weight: f32) -> Self {
        Self {
            color,
            weight,
            opacity: 1.0,
            fill: false,
            fill_color: color,
            fill_opacity: 0.0,
            dash_array: None,
        }
    }

    pub const fn filled(mut self, fill_color: &'static str, fill_opacity: f32) -> Self {
        self.fill = true;
        self.fill_color = fill_color;
        self.fill_opacity = fill_opacity;
        self
    }

    pub const fn dashed(mut self, dash_array: &'static str) -> Self {
        self.dash_array = Some(dash_array);
        self
    }

    /// Thin dashed frame around the record's extent.
    pub const fn bbox() -> Self {
        PathStyle::stroke("#000000", 1.0).dashed("5, 5")
    }

    /// The record's own geometry.
    pub const fn consensus_polygon() -> Self {
        PathStyle::stroke("#ff0099", 2.0).filled("#ff69b4", 0.4)
    }

    /// The parent's outline, drawn beneath the record.
    pub const fn parent_polygon() -> Self {
        PathStyle::stroke("#000000", 1.5)
            .filled("#cccccc", 0.3)
            .dashed("3, 6")
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        PathStyle::consensus_polygon()
    }
}

/// Circle marker options.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub radius: f32,
    #[serde(flatten)]
    pub path: PathStyle,
}

impl MarkerStyle {
    pub const fn new(radius: f32, path: PathStyle) -> Self {
        Self { radius, path }
    }

    pub const fn label_centroid() -> Self {
        MarkerStyle::new(8.0, PathStyle::stroke("#ffffff", 2.0).filled("#ff0000", 1.0))
    }

    pub const fn math_centroid() -> Self {
        MarkerStyle::new(8.0, PathStyle::stroke("#ffffff", 2.0).filled("#0000ff", 1.0))
    }

    /// Members of a multi-point record.
    pub const fn search_centroid() -> Self {
        MarkerStyle::new(6.0, PathStyle::stroke("#000000", 1.0).filled("#ff9900", 0.8))
    }
}
