use std::rc::Rc;
use std::time::Duration;

use cache::{DEFAULT_TTL, TtlCache};
use formats::MAP_CONFIG_PATH;
use repository::{FeatureRepository, Transport};
use runtime::Spawner;
use serde::{Deserialize, Serialize};

use crate::compositor::MapCompositor;
use crate::registry::MapRegistry;
use crate::surface::SurfaceFactory;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Lifetime of every cache entry, in seconds.
    pub ttl_secs: u64,
    pub map_config_path: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL.as_secs(),
            map_config_path: MAP_CONFIG_PATH.to_string(),
        }
    }
}

impl ServicesConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

/// The page's service objects, built once and shared by handle.
#[derive(Clone)]
pub struct Services {
    pub cache: TtlCache,
    pub repository: FeatureRepository,
    pub registry: MapRegistry,
    pub compositor: MapCompositor,
}

impl Services {
    pub fn new(
        config: &ServicesConfig,
        cache: TtlCache,
        transport: Rc<dyn Transport>,
        surfaces: Rc<dyn SurfaceFactory>,
        spawner: Rc<dyn Spawner>,
    ) -> Self {
        let cache = cache.with_ttl(config.ttl());
        let repository = FeatureRepository::new(cache.clone(), transport.clone());
        let registry =
            MapRegistry::with_config_path(transport, surfaces, config.map_config_path.clone());
        let compositor = MapCompositor::new(registry.clone(), repository.clone(), spawner);
        Self {
            cache,
            repository,
            registry,
            compositor,
        }
    }
}
