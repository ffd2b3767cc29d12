use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use formats::{MAP_CONFIG_PATH, MapConfig, TileProvider, UnsupportedProvider};
use foundation::{LatLng, LatLngBounds};
use futures_util::FutureExt;
use futures_util::future::{LocalBoxFuture, Shared};
use repository::{FetchError, Transport};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::layer::DrawCommand;
use crate::pane::PaneKind;
use crate::surface::{MapSurface, MissingElement, SurfaceFactory};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("map configuration: {0}")]
    Config(#[from] FetchError),
    #[error(transparent)]
    UnsupportedProvider(#[from] UnsupportedProvider),
    #[error(transparent)]
    MissingElement(#[from] MissingElement),
}

/// Where a mount point is in its lifecycle.
///
/// `Failed` is terminal: the mount point never leaves it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MapState {
    Uninitialized,
    ProvisioningConfig,
    PaneReady,
    Rendering { feature: Option<i64> },
    RenderingWithParent { feature: Option<i64>, parent: i64 },
    Failed,
}

struct MapInner {
    mount_id: String,
    surface: Rc<dyn MapSurface>,
    provider: TileProvider,
    state: Cell<MapState>,
}

/// A provisioned map: surface, panes, tile layer, render state.
///
/// Clones refer to the same map.
#[derive(Clone)]
pub struct MapHandle {
    inner: Rc<MapInner>,
}

impl fmt::Debug for MapHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapHandle")
            .field("mount_id", &self.inner.mount_id)
            .field("provider", &self.inner.provider)
            .field("state", &self.inner.state.get())
            .finish()
    }
}

impl MapHandle {
    fn new(mount_id: String, surface: Rc<dyn MapSurface>, provider: TileProvider) -> Self {
        Self {
            inner: Rc::new(MapInner {
                mount_id,
                surface,
                provider,
                state: Cell::new(MapState::PaneReady),
            }),
        }
    }

    pub fn mount_id(&self) -> &str {
        &self.inner.mount_id
    }

    pub fn provider(&self) -> &TileProvider {
        &self.inner.provider
    }

    pub fn state(&self) -> MapState {
        self.inner.state.get()
    }

    pub(crate) fn set_state(&self, state: MapState) {
        self.inner.state.set(state);
    }

    pub fn set_view(&self, center: LatLng, zoom: f64) {
        self.inner.surface.set_view(center, zoom);
    }

    pub fn fit_bounds(&self, bounds: LatLngBounds) {
        self.inner.surface.fit_bounds(bounds);
    }

    pub fn draw(&self, command: &DrawCommand) {
        self.inner.surface.draw(command);
    }

    pub fn same_map(&self, other: &MapHandle) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

type Provisioning = Shared<LocalBoxFuture<'static, Result<MapHandle, MapError>>>;

enum Slot {
    Provisioning(Provisioning),
    Ready(MapHandle),
    Failed(MapError),
}

struct RegistryInner {
    transport: Rc<dyn Transport>,
    surfaces: Rc<dyn SurfaceFactory>,
    config_path: String,
    config: RefCell<Option<Rc<MapConfig>>>,
    slots: RefCell<BTreeMap<String, Slot>>,
}

/// One map per mount point, provisioned on first use.
///
/// Every caller for a mount point shares the same provisioning and therefore
/// the same outcome. A failed mount point stays failed; other mount points
/// are unaffected.
#[derive(Clone)]
pub struct MapRegistry {
    inner: Rc<RegistryInner>,
}

impl MapRegistry {
    pub fn new(transport: Rc<dyn Transport>, surfaces: Rc<dyn SurfaceFactory>) -> Self {
        Self::with_config_path(transport, surfaces, MAP_CONFIG_PATH)
    }

    pub fn with_config_path(
        transport: Rc<dyn Transport>,
        surfaces: Rc<dyn SurfaceFactory>,
        config_path: impl Into<String>,
    ) -> Self {
        Self {
            inner: Rc::new(RegistryInner {
                transport,
                surfaces,
                config_path: config_path.into(),
                config: RefCell::new(None),
                slots: RefCell::new(BTreeMap::new()),
            }),
        }
    }

    pub fn state(&self, mount_id: &str) -> MapState {
        match self.inner.slots.borrow().get(mount_id) {
            None => MapState::Uninitialized,
            Some(Slot::Provisioning(_)) => MapState::ProvisioningConfig,
            Some(Slot::Ready(map)) => map.state(),
            Some(Slot::Failed(_)) => MapState::Failed,
        }
    }

    /// The map for `mount_id`, provisioning it if this is the first request.
    pub async fn map(&self, mount_id: &str) -> Result<MapHandle, MapError> {
        // The slot is claimed before the first await so concurrent callers
        // join the same provisioning.
        let provisioning = {
            let mut slots = self.inner.slots.borrow_mut();
            match slots.get(mount_id) {
                Some(Slot::Ready(map)) => return Ok(map.clone()),
                Some(Slot::Failed(err)) => return Err(err.clone()),
                Some(Slot::Provisioning(p)) => p.clone(),
                None => {
                    let inner = self.inner.clone();
                    let mount = mount_id.to_string();
                    let p = async move { inner.provision(mount).await }
                        .boxed_local()
                        .shared();
                    slots.insert(mount_id.to_string(), Slot::Provisioning(p.clone()));
                    p
                }
            }
        };
        provisioning.await
    }
}

impl RegistryInner {
    async fn provision(self: Rc<Self>, mount_id: String) -> Result<MapHandle, MapError> {
        let outcome = self.build(&mount_id).await;
        let slot = match &outcome {
            Ok(map) => {
                info!(mount = %mount_id, "map ready");
                Slot::Ready(map.clone())
            }
            Err(err) => {
                warn!(mount = %mount_id, error = %err, "map provisioning failed");
                Slot::Failed(err.clone())
            }
        };
        self.slots.borrow_mut().insert(mount_id, slot);
        outcome
    }

    async fn build(&self, mount_id: &str) -> Result<MapHandle, MapError> {
        let config = self.config().await?;
        let provider = config.tile_provider()?;
        let surface = self.surfaces.create(mount_id)?;

        for pane in PaneKind::ALL {
            surface.create_pane(pane);
        }
        surface.add_tile_layer(&provider);

        Ok(MapHandle::new(mount_id.to_string(), surface, provider))
    }

    async fn config(&self) -> Result<Rc<MapConfig>, MapError> {
        if let Some(config) = self.config.borrow().as_ref() {
            return Ok(config.clone());
        }

        debug!(path = %self.config_path, "fetching map configuration");
        let body = self
            .transport
            .get_text(&self.config_path)
            .await
            .map_err(|e| FetchError::new(self.config_path.as_str(), e))?;
        let config = MapConfig::from_json(&body)
            .map(Rc::new)
            .map_err(|e| FetchError::malformed(self.config_path.as_str(), e))?;

        *self.config.borrow_mut() = Some(config.clone());
        Ok(config)
    }
}
