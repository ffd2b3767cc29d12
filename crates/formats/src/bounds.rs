use foundation::LatLngBounds;

use crate::feature::Feature;
use crate::geometry::Geometry;

/// Minimal rectangle enclosing every position of a geometry.
///
/// Input positions are (lon, lat); the result is in (lat, lng) order.
/// Returns `None` when the geometry has no positions at all.
pub fn geometry_bounds(geometry: &Geometry) -> Option<LatLngBounds> {
    let mut out: Option<LatLngBounds> = None;
    geometry.visit_positions(&mut |p| {
        let ll = p.to_lat_lng();
        match out.as_mut() {
            Some(b) => b.extend(ll),
            None => out = Some(LatLngBounds::from_point(ll)),
        }
    });
    out
}

/// Bounds of a feature's geometry. Point features are normally centred
/// directly by the caller; for them this returns a degenerate box.
pub fn derive_bounds(feature: &Feature) -> Option<LatLngBounds> {
    geometry_bounds(&feature.geometry)
}
