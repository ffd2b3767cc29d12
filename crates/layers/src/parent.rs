use formats::{Feature, FetchOptions, GeometryType};
use repository::{FeatureRepository, RepositoryError};
use tracing::{debug, warn};

use crate::layer::{DrawCommand, LayerRequest};
use crate::pane::PaneKind;
use crate::registry::{MapHandle, MapState};
use crate::symbology::PathStyle;

#[derive(Debug, Clone, PartialEq)]
pub enum ParentOutcome {
    /// The record has no usable parent id.
    NoParent,
    /// The parent exists but is not polygonal; nothing was drawn.
    NotPolygonal { parent: i64, kind: GeometryType },
    Drawn { parent: i64 },
    /// Logged and swallowed; the primary render is unaffected.
    Failed { parent: i64, error: RepositoryError },
}

/// Draws a record's immediate parent beneath it. One hop only.
#[derive(Clone)]
pub struct ParentResolver {
    repository: FeatureRepository,
}

impl ParentResolver {
    pub fn new(repository: FeatureRepository) -> Self {
        Self { repository }
    }

    pub async fn resolve_and_draw_parent(&self, map: &MapHandle, feature: &Feature) -> ParentOutcome {
        let parent = match feature.parent_id() {
            Some(id) if id > 0 => id,
            _ => return ParentOutcome::NoParent,
        };

        let parent_feature = match self.repository.fetch(parent, &FetchOptions::default()).await {
            Ok(f) => f,
            Err(error) => {
                warn!(mount = %map.mount_id(), parent, %error, "failed to fetch parent record");
                return ParentOutcome::Failed { parent, error };
            }
        };

        let kind = parent_feature.geometry_type();
        if !kind.is_polygonal() {
            debug!(parent, kind = kind.as_str(), "parent is not polygonal, skipping");
            return ParentOutcome::NotPolygonal { parent, kind };
        }

        map.draw(&DrawCommand::Geometry {
            geometry: parent_feature.geometry,
            request: LayerRequest::new(PathStyle::parent_polygon(), PaneKind::Parent),
        });
        if let MapState::Rendering { feature } = map.state() {
            map.set_state(MapState::RenderingWithParent { feature, parent });
        }
        ParentOutcome::Drawn { parent }
    }
}

#[cfg(test)]
mod tests {
    use super::{ParentOutcome, ParentResolver};
    use crate::pane::PaneKind;
    use crate::registry::{MapHandle, MapRegistry};
    use crate::surface::RecordingFactory;
    use cache::{MemoryStore, TtlCache};
    use formats::{Feature, GeometryType};
    use foundation::ManualClock;
    use pretty_assertions::assert_eq;
    use repository::{FeatureRepository, MemoryTransport, RepositoryError};
    use std::rc::Rc;

    struct Harness {
        resolver: ParentResolver,
        transport: Rc<MemoryTransport>,
        factory: Rc<RecordingFactory>,
    }

    impl Harness {
        fn new() -> Self {
            let transport = Rc::new(MemoryTransport::new());
            transport.insert(
                "/maps.json",
                r#"{"provider":"vector","tile_url":"https://t/world.pmtiles","theme":"light"}"#,
            );
            let cache = TtlCache::new(Rc::new(MemoryStore::new()), Rc::new(ManualClock::new(0)));
            Harness {
                resolver: ParentResolver::new(FeatureRepository::new(cache, transport.clone())),
                transport,
                factory: Rc::new(RecordingFactory::new()),
            }
        }

        async fn map(&self) -> MapHandle {
            MapRegistry::new(self.transport.clone(), self.factory.clone())
                .map("map")
                .await
                .unwrap()
        }

        fn parent_draws(&self) -> usize {
            self.factory
                .surface("map")
                .map(|s| s.draws_on(PaneKind::Parent).len())
                .unwrap_or(0)
        }
    }

    fn child(parent: &str) -> Feature {
        Feature::from_json(&format!(
            r#"{{"type":"Feature","geometry":{{"type":"Point","coordinates":[0,0]}},
                "properties":{{"wof:parent_id":{parent}}}}}"#
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn zero_parent_is_a_no_op() {
        let h = Harness::new();
        let map = h.map().await;
        for parent in ["0", "-1", "\"\""] {
            assert_eq!(
                h.resolver.resolve_and_draw_parent(&map, &child(parent)).await,
                ParentOutcome::NoParent
            );
        }
        assert_eq!(h.transport.requests(), vec!["/maps.json"]);
        assert_eq!(h.parent_draws(), 0);
    }

    #[tokio::test]
    async fn point_parent_is_fetched_but_not_drawn() {
        let h = Harness::new();
        h.transport.insert(
            "/id/85633793/geojson",
            r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[1,1]},"properties":{}}"#,
        );
        let map = h.map().await;

        assert_eq!(
            h.resolver
                .resolve_and_draw_parent(&map, &child("85633793"))
                .await,
            ParentOutcome::NotPolygonal {
                parent: 85633793,
                kind: GeometryType::Point
            }
        );
        assert_eq!(h.transport.request_count("/id/85633793/geojson"), 1);
        assert_eq!(h.parent_draws(), 0);
    }

    #[tokio::test]
    async fn polygonal_parent_is_drawn_once_without_recursing() {
        let h = Harness::new();
        h.transport.insert(
            "/id/7/geojson",
            r#"{"type":"Feature",
                "geometry":{"type":"Polygon","coordinates":[[[0,0],[0,1],[1,1],[0,0]]]},
                "properties":{"wof:parent_id":6}}"#,
        );
        let map = h.map().await;

        assert_eq!(
            h.resolver.resolve_and_draw_parent(&map, &child("7")).await,
            ParentOutcome::Drawn { parent: 7 }
        );
        assert_eq!(h.parent_draws(), 1);
        assert_eq!(h.transport.request_count("/id/6/geojson"), 0);
    }

    #[tokio::test]
    async fn fetch_failure_is_reported_not_raised() {
        let h = Harness::new();
        let map = h.map().await;

        match h.resolver.resolve_and_draw_parent(&map, &child("99")).await {
            ParentOutcome::Failed {
                parent: 99,
                error: RepositoryError::Fetch(e),
            } => assert_eq!(e.target, "/id/99/geojson"),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(h.parent_draws(), 0);
    }
}
