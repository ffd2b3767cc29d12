use std::rc::Rc;

use formats::{Feature, FetchOptions, GeometryType, derive_bounds};
use foundation::{LatLng, LatLngBounds};
use repository::{FeatureRepository, RepositoryError};
use runtime::Spawner;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::layer::{DrawCommand, LayerRequest, PointHandler};
use crate::pane::PaneKind;
use crate::parent::ParentResolver;
use crate::registry::{MapError, MapHandle, MapRegistry, MapState};
use crate::symbology::{MarkerStyle, PathStyle};

/// Zoom used for single points and collapsed extents.
pub const DEFAULT_ZOOM: f64 = 12.0;

pub const LABEL_CENTROID_TEXT: &str = "label centroid";
pub const MATH_CENTROID_TEXT: &str = "math centroid";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Map(#[from] MapError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// What a geometry type gets drawn as.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawRule {
    /// Centre on the point, one marker, nothing else.
    Point,
    /// One marker per member, framed by the members' extent.
    MultiPoint,
    /// Extent frame, body, both centroids, then the parent.
    Outlined,
}

pub fn draw_rule(kind: GeometryType) -> Option<DrawRule> {
    match kind {
        GeometryType::Point => Some(DrawRule::Point),
        GeometryType::MultiPoint => Some(DrawRule::MultiPoint),
        GeometryType::Polygon
        | GeometryType::MultiPolygon
        | GeometryType::LineString
        | GeometryType::MultiLineString
        | GeometryType::GeometryCollection => Some(DrawRule::Outlined),
        GeometryType::Unknown => None,
    }
}

/// Puts records on maps.
#[derive(Clone)]
pub struct MapCompositor {
    registry: MapRegistry,
    repository: FeatureRepository,
    parents: ParentResolver,
    spawner: Rc<dyn Spawner>,
}

impl MapCompositor {
    pub fn new(registry: MapRegistry, repository: FeatureRepository, spawner: Rc<dyn Spawner>) -> Self {
        Self {
            parents: ParentResolver::new(repository.clone()),
            registry,
            repository,
            spawner,
        }
    }

    pub fn registry(&self) -> &MapRegistry {
        &self.registry
    }

    /// Map, record, draw. The parent outline, if any, arrives later.
    pub async fn render(
        &self,
        mount_id: &str,
        id: i64,
        options: &FetchOptions,
    ) -> Result<MapHandle, RenderError> {
        let map = self.registry.map(mount_id).await?;
        let feature = self.repository.fetch(id, options).await?;
        info!(mount = %mount_id, id, kind = feature.geometry_type().as_str(), "rendering record");
        self.draw_feature(&map, &feature);
        Ok(map)
    }

    /// Draw `feature` according to its geometry type's rule.
    ///
    /// Returns the rule applied, or `None` for geometry types with no rule.
    pub fn draw_feature(&self, map: &MapHandle, feature: &Feature) -> Option<DrawRule> {
        let kind = feature.geometry_type();
        let Some(rule) = draw_rule(kind) else {
            warn!(mount = %map.mount_id(), kind = kind.as_str(), "no draw rule for geometry type");
            return None;
        };

        map.set_state(MapState::Rendering {
            feature: feature.id().map(i64::from),
        });

        match rule {
            DrawRule::Point => self.draw_point(map, feature),
            DrawRule::MultiPoint => self.draw_multi_point(map, feature),
            DrawRule::Outlined => self.draw_outlined(map, feature),
        }
        Some(rule)
    }

    fn draw_point(&self, map: &MapHandle, feature: &Feature) {
        let Some(at) = feature.geometry.positions().first().map(|p| p.to_lat_lng()) else {
            warn!(mount = %map.mount_id(), "point record without a position");
            return;
        };
        let zoom = feature
            .min_zoom()
            .map_or(DEFAULT_ZOOM, |z| z.max(DEFAULT_ZOOM));

        map.set_view(at, zoom);
        map.draw(&DrawCommand::marker(
            at,
            PointHandler::centroids(MarkerStyle::label_centroid()),
            feature.label().map(str::to_string),
        ));
    }

    fn draw_multi_point(&self, map: &MapHandle, feature: &Feature) {
        self.position_view(map, feature);

        let handler = PointHandler::centroids(MarkerStyle::search_centroid());
        for p in feature.geometry.positions() {
            let tooltip = feature.label_for_position(p).map(str::to_string);
            map.draw(&DrawCommand::marker(p.to_lat_lng(), handler, tooltip));
        }
    }

    fn draw_outlined(&self, map: &MapHandle, feature: &Feature) {
        if let Some(bounds) = self.position_view(map, feature) {
            map.draw(&DrawCommand::BoundingBox {
                bounds,
                request: LayerRequest::new(PathStyle::bbox(), PaneKind::BoundingBox),
            });
        }

        map.draw(&DrawCommand::Geometry {
            geometry: feature.geometry.clone(),
            request: LayerRequest::new(PathStyle::consensus_polygon(), PaneKind::Polygon)
                .with_points(PointHandler::centroids(MarkerStyle::label_centroid())),
        });

        self.draw_centroid(map, feature.label_centroid(), MarkerStyle::label_centroid(), LABEL_CENTROID_TEXT);
        self.draw_centroid(map, feature.math_centroid(), MarkerStyle::math_centroid(), MATH_CENTROID_TEXT);

        self.schedule_parent(map, feature);
    }

    fn draw_centroid(&self, map: &MapHandle, at: Option<LatLng>, style: MarkerStyle, text: &str) {
        if let Some(at) = at {
            map.draw(&DrawCommand::marker(
                at,
                PointHandler::centroids(style),
                Some(text.to_string()),
            ));
        }
    }

    /// Fit the view to the record's extent, falling back to a fixed zoom
    /// when the extent is a single point.
    fn position_view(&self, map: &MapHandle, feature: &Feature) -> Option<LatLngBounds> {
        let Some(bounds) = derive_bounds(feature) else {
            warn!(mount = %map.mount_id(), "record has no positions, leaving view alone");
            return None;
        };
        if bounds.is_degenerate() {
            map.set_view(bounds.center(), DEFAULT_ZOOM);
        } else {
            map.fit_bounds(bounds);
        }
        Some(bounds)
    }

    fn schedule_parent(&self, map: &MapHandle, feature: &Feature) {
        if !feature.parent_id().is_some_and(|id| id > 0) {
            return;
        }
        debug!(mount = %map.mount_id(), parent = ?feature.parent_id(), "scheduling parent");
        let parents = self.parents.clone();
        let map = map.clone();
        let feature = feature.clone();
        self.spawner.spawn_local(Box::pin(async move {
            parents.resolve_and_draw_parent(&map, &feature).await;
        }));
    }
}
