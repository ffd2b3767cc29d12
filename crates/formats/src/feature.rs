use foundation::{FeatureId, LatLng};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::DocumentError;
use crate::geometry::{Geometry, GeometryType, Position};

pub type Properties = serde_json::Map<String, Value>;

/// Property names as served by the record store.
pub mod keys {
    pub const ID: &str = "wof:id";
    pub const PARENT_ID: &str = "wof:parent_id";
    pub const MIN_ZOOM: &str = "mz:min_zoom";
    pub const LABEL_LATITUDE: &str = "lbl:latitude";
    pub const LABEL_LONGITUDE: &str = "lbl:longitude";
    pub const MATH_LATITUDE: &str = "geom:latitude";
    pub const MATH_LONGITUDE: &str = "geom:longitude";
    pub const SUPERSEDES: &str = "wof:supersedes";
    pub const SUPERSEDED_BY: &str = "wof:superseded_by";
    pub const GEOM_ALT: &str = "src:geom_alt";
    pub const LABEL: &str = "wof:label";
    pub const NAME: &str = "wof:name";
    pub const BRAND_NAME: &str = "wof:brand_name";
    pub const DEPRECATED: &str = "edtf:deprecated";
    pub const CESSATION: &str = "edtf:cessation";
    /// Per-position tooltip text for synthesized multi-point features.
    pub const LABEL_NAMES: &str = "lflt:label_names";
}

/// A single geographic record: geometry plus free-form properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Properties,
}

/// Where a record stands in its lifecycle, derived from EDTF properties.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum Lifecycle {
    Current,
    Ceased,
    Deprecated,
}

/// One alternate geometry label, `source[-function[-extra]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AltGeometry {
    pub label: String,
    pub source: String,
    pub function: Option<String>,
    pub extra: Option<String>,
}

impl AltGeometry {
    pub fn parse(label: &str) -> Option<Self> {
        let mut parts = label.splitn(3, '-');
        let source = parts.next().filter(|s| !s.is_empty())?;
        Some(Self {
            label: label.to_string(),
            source: source.to_string(),
            function: parts.next().map(str::to_string),
            extra: parts.next().map(str::to_string),
        })
    }
}

impl Feature {
    pub fn new(geometry: Geometry, properties: Properties) -> Self {
        Self {
            kind: "Feature".to_string(),
            geometry,
            properties,
        }
    }

    /// Parse a network response body. Anything but a `Feature` is rejected.
    pub fn from_json(body: &str) -> Result<Self, DocumentError> {
        let f: Feature = serde_json::from_str(body)?;
        if f.kind != "Feature" {
            return Err(DocumentError::NotAFeature(f.kind));
        }
        Ok(f)
    }

    pub fn geometry_type(&self) -> GeometryType {
        self.geometry.kind()
    }

    pub fn id(&self) -> Option<FeatureId> {
        self.int_property(keys::ID)
            .and_then(|raw| FeatureId::new(raw).ok())
    }

    /// Raw parent identifier; `-1` and `0` are the record store's "none".
    pub fn parent_id(&self) -> Option<i64> {
        self.int_property(keys::PARENT_ID)
    }

    pub fn min_zoom(&self) -> Option<f64> {
        self.number_property(keys::MIN_ZOOM)
    }

    pub fn label_centroid(&self) -> Option<LatLng> {
        self.centroid(keys::LABEL_LATITUDE, keys::LABEL_LONGITUDE)
    }

    pub fn math_centroid(&self) -> Option<LatLng> {
        self.centroid(keys::MATH_LATITUDE, keys::MATH_LONGITUDE)
    }

    pub fn supersedes(&self) -> Vec<i64> {
        self.int_list(keys::SUPERSEDES)
    }

    pub fn superseded_by(&self) -> Vec<i64> {
        self.int_list(keys::SUPERSEDED_BY)
    }

    pub fn alt_geometries(&self) -> Vec<AltGeometry> {
        let Some(Value::Array(labels)) = self.properties.get(keys::GEOM_ALT) else {
            return Vec::new();
        };
        labels
            .iter()
            .filter_map(Value::as_str)
            .filter_map(AltGeometry::parse)
            .collect()
    }

    /// Display label: `wof:label`, falling back to `wof:name`, then `wof:brand_name`.
    pub fn label(&self) -> Option<&str> {
        [keys::LABEL, keys::NAME, keys::BRAND_NAME]
            .into_iter()
            .filter_map(|k| self.properties.get(k).and_then(Value::as_str))
            .map(str::trim)
            .find(|s| !s.is_empty())
    }

    pub fn lifecycle(&self) -> Lifecycle {
        let is_set = |k: &str| {
            self.properties
                .get(k)
                .and_then(Value::as_str)
                .map(|s| !matches!(s.trim(), "" | "uuuu" | ".."))
                .unwrap_or(false)
        };
        if is_set(keys::DEPRECATED) {
            Lifecycle::Deprecated
        } else if is_set(keys::CESSATION) {
            Lifecycle::Ceased
        } else {
            Lifecycle::Current
        }
    }

    /// Tooltip text for one position of a multi-point feature.
    pub fn label_for_position(&self, p: Position) -> Option<&str> {
        let names = self.properties.get(keys::LABEL_NAMES)?.as_object()?;
        let key = format!("[{},{}]", coordinate_key(p.lon), coordinate_key(p.lat));
        names.get(&key).and_then(Value::as_str)
    }

    pub fn number_property(&self, key: &str) -> Option<f64> {
        let v = match self.properties.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        v.filter(|v| v.is_finite())
    }

    pub fn int_property(&self, key: &str) -> Option<i64> {
        integral(self.properties.get(key)?)
    }

    fn int_list(&self, key: &str) -> Vec<i64> {
        let Some(Value::Array(items)) = self.properties.get(key) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(integral)
            .collect()
    }

    fn centroid(&self, lat_key: &str, lon_key: &str) -> Option<LatLng> {
        let lat = self.number_property(lat_key)?;
        let lon = self.number_property(lon_key)?;
        Some(LatLng::new(lat, lon))
    }
}

// Whole numbers are written without a fractional part, as JSON producers do.
fn coordinate_key(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// An integer carried as a JSON integer, a whole-valued float, or a numeric string.
fn integral(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{AltGeometry, Feature, Lifecycle};
    use crate::DocumentError;
    use crate::geometry::{GeometryType, Position};
    use foundation::LatLng;
    use pretty_assertions::assert_eq;

    const SF: &str = r#"{
        "type": "Feature",
        "geometry": {"type": "Polygon", "coordinates": [[[0,0],[0,2],[2,2],[2,0],[0,0]]]},
        "properties": {
            "wof:id": 85922583,
            "wof:parent_id": "102087579",
            "wof:name": "San Francisco",
            "mz:min_zoom": 9,
            "lbl:latitude": 37.76, "lbl:longitude": -122.43,
            "geom:latitude": 37.75, "geom:longitude": -122.44,
            "wof:supersedes": [1108830809],
            "wof:superseded_by": [],
            "src:geom_alt": ["quattroshapes", "whosonfirst-reversegeo-display"],
            "edtf:deprecated": "",
            "edtf:cessation": "uuuu"
        }
    }"#;

    #[test]
    fn reads_properties_of_interest() {
        let f = Feature::from_json(SF).unwrap();
        assert_eq!(f.geometry_type(), GeometryType::Polygon);
        assert_eq!(f.id().map(|i| i.get()), Some(85922583));
        assert_eq!(f.parent_id(), Some(102087579));
        assert_eq!(f.min_zoom(), Some(9.0));
        assert_eq!(f.label_centroid(), Some(LatLng::new(37.76, -122.43)));
        assert_eq!(f.math_centroid(), Some(LatLng::new(37.75, -122.44)));
        assert_eq!(f.supersedes(), vec![1108830809]);
        assert!(f.superseded_by().is_empty());
        assert_eq!(f.label(), Some("San Francisco"));
        assert_eq!(f.lifecycle(), Lifecycle::Current);
    }

    #[test]
    fn alt_geometry_labels_split_into_discriminators() {
        let f = Feature::from_json(SF).unwrap();
        let alts = f.alt_geometries();
        assert_eq!(alts.len(), 2);
        assert_eq!(alts[0].source, "quattroshapes");
        assert_eq!(alts[0].function, None);
        assert_eq!(
            alts[1],
            AltGeometry {
                label: "whosonfirst-reversegeo-display".to_string(),
                source: "whosonfirst".to_string(),
                function: Some("reversegeo".to_string()),
                extra: Some("display".to_string()),
            }
        );
        assert!(AltGeometry::parse("").is_none());
    }

    #[test]
    fn label_prefers_wof_label() {
        let mut f = Feature::from_json(SF).unwrap();
        f.properties
            .insert("wof:label".into(), serde_json::json!("SF"));
        assert_eq!(f.label(), Some("SF"));
        f.properties.insert("wof:label".into(), serde_json::json!(""));
        assert_eq!(f.label(), Some("San Francisco"));
    }

    #[test]
    fn lifecycle_markers() {
        let mut f = Feature::from_json(SF).unwrap();
        f.properties
            .insert("edtf:cessation".into(), serde_json::json!("2019-01"));
        assert_eq!(f.lifecycle(), Lifecycle::Ceased);
        f.properties
            .insert("edtf:deprecated".into(), serde_json::json!("2020-02-02"));
        assert_eq!(f.lifecycle(), Lifecycle::Deprecated);
    }

    #[test]
    fn whole_valued_floats_count_as_ids() {
        let f = Feature::from_json(
            r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[0,0]},
                "properties":{"wof:id":85922583.0,"wof:parent_id":102087579.0,
                              "wof:supersedes":[1108830809.0, 2.5]}}"#,
        )
        .unwrap();
        assert_eq!(f.parent_id(), Some(102087579));
        assert_eq!(f.id().map(|i| i.get()), Some(85922583));
        assert_eq!(f.supersedes(), vec![1108830809]);

        let mut f = f;
        f.properties
            .insert("wof:parent_id".into(), serde_json::json!(102087579.5));
        assert_eq!(f.parent_id(), None);
    }

    #[test]
    fn rejects_non_feature_documents() {
        let err = Feature::from_json(
            r#"{"type":"FeatureCollection","geometry":{"type":"Point","coordinates":[0,0]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DocumentError::NotAFeature(t) if t == "FeatureCollection"));
        assert!(matches!(
            Feature::from_json("<html>").unwrap_err(),
            DocumentError::Json(_)
        ));
    }

    #[test]
    fn missing_properties_default_to_empty() {
        let f = Feature::from_json(r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[1,2]}}"#)
            .unwrap();
        assert!(f.properties.is_empty());
        assert_eq!(f.parent_id(), None);
        assert_eq!(f.label(), None);
    }

    #[test]
    fn multipoint_tooltips_are_keyed_by_position() {
        let f = Feature::from_json(
            r#"{"type":"Feature","geometry":{"type":"MultiPoint","coordinates":[[1.5,2.5]]},
                "properties":{"lflt:label_names":{"[1.5,2.5]":"Somewhere (7)"}}}"#,
        )
        .unwrap();
        assert_eq!(
            f.label_for_position(Position::new(1.5, 2.5)),
            Some("Somewhere (7)")
        );
        assert_eq!(f.label_for_position(Position::new(0.0, 0.0)), None);

        let whole = Feature::from_json(
            r#"{"type":"Feature","geometry":{"type":"MultiPoint","coordinates":[[-73,45]]},
                "properties":{"lflt:label_names":{"[-73,45]":"Montréal"}}}"#,
        )
        .unwrap();
        assert_eq!(
            whole.label_for_position(Position::new(-73.0, 45.0)),
            Some("Montréal")
        );
    }
}
