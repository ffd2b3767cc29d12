use foundation::LatLng;
use serde::{Deserialize, Serialize};

/// A GeoJSON position, read as `[longitude, latitude, ...]`.
///
/// Extra ordinates (elevation, measure) are accepted and dropped.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Position {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("a position needs at least 2 ordinates, got {0}")]
pub struct ShortPosition(pub usize);

impl Position {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Swap into the (lat, lng) order used for rendering.
    pub fn to_lat_lng(self) -> LatLng {
        LatLng::new(self.lat, self.lon)
    }
}

impl TryFrom<Vec<f64>> for Position {
    type Error = ShortPosition;

    fn try_from(v: Vec<f64>) -> Result<Self, Self::Error> {
        match v.as_slice() {
            [lon, lat, ..] => Ok(Position::new(*lon, *lat)),
            _ => Err(ShortPosition(v.len())),
        }
    }
}

impl From<Position> for Vec<f64> {
    fn from(p: Position) -> Self {
        vec![p.lon, p.lat]
    }
}

/// Closed set of geometry types the compositor knows how to dispatch on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum GeometryType {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    GeometryCollection,
    Unknown,
}

impl GeometryType {
    pub fn is_polygonal(self) -> bool {
        matches!(self, GeometryType::Polygon | GeometryType::MultiPolygon)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GeometryType::Point => "Point",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::LineString => "LineString",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPolygon => "MultiPolygon",
            GeometryType::GeometryCollection => "GeometryCollection",
            GeometryType::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: Position,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    GeometryCollection {
        geometries: Vec<Geometry>,
    },
    /// Any `type` this build does not know about; its payload is discarded.
    #[serde(other)]
    Unknown,
}

impl Geometry {
    pub fn kind(&self) -> GeometryType {
        match self {
            Geometry::Point { .. } => GeometryType::Point,
            Geometry::MultiPoint { .. } => GeometryType::MultiPoint,
            Geometry::LineString { .. } => GeometryType::LineString,
            Geometry::MultiLineString { .. } => GeometryType::MultiLineString,
            Geometry::Polygon { .. } => GeometryType::Polygon,
            Geometry::MultiPolygon { .. } => GeometryType::MultiPolygon,
            Geometry::GeometryCollection { .. } => GeometryType::GeometryCollection,
            Geometry::Unknown => GeometryType::Unknown,
        }
    }

    /// Visit every position reachable in the geometry, depth first.
    pub fn visit_positions<F: FnMut(Position)>(&self, f: &mut F) {
        match self {
            Geometry::Point { coordinates } => f(*coordinates),
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                coordinates.iter().copied().for_each(&mut *f)
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                coordinates.iter().flatten().copied().for_each(&mut *f)
            }
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .flatten()
                .flatten()
                .copied()
                .for_each(&mut *f),
            Geometry::GeometryCollection { geometries } => {
                for g in geometries {
                    g.visit_positions(f);
                }
            }
            Geometry::Unknown => {}
        }
    }

    pub fn positions(&self) -> Vec<Position> {
        let mut out = Vec::new();
        self.visit_positions(&mut |p| out.push(p));
        out
    }
}
