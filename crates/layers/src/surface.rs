use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use formats::TileProvider;
use foundation::{LatLng, LatLngBounds};
use serde::Serialize;

use crate::layer::{DrawCommand, Viewport};
use crate::pane::PaneKind;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no map element with id {0:?}")]
pub struct MissingElement(pub String);

/// A rendering target bound to one mount point.
///
/// Calls never fail: a surface that cannot honour a draw logs and moves on.
pub trait MapSurface {
    fn create_pane(&self, pane: PaneKind);
    fn add_tile_layer(&self, provider: &TileProvider);
    fn set_view(&self, center: LatLng, zoom: f64);
    fn fit_bounds(&self, bounds: LatLngBounds);
    fn draw(&self, command: &DrawCommand);
}

/// Creates the surface for a mount point id.
pub trait SurfaceFactory {
    fn create(&self, mount_id: &str) -> Result<Rc<dyn MapSurface>, MissingElement>;
}

/// Everything a [`RecordingSurface`] was asked to do, in call order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SurfaceEvent {
    CreatePane { pane: PaneKind, z_index: u32 },
    TileLayer { provider: TileProvider },
    View { viewport: Viewport },
    Draw { command: DrawCommand },
}

/// Surface that keeps a log instead of rendering.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    events: RefCell<Vec<SurfaceEvent>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events.borrow().clone()
    }

    pub fn panes(&self) -> Vec<PaneKind> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                SurfaceEvent::CreatePane { pane, .. } => Some(*pane),
                _ => None,
            })
            .collect()
    }

    pub fn draws(&self) -> Vec<DrawCommand> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                SurfaceEvent::Draw { command } => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn draws_on(&self, pane: PaneKind) -> Vec<DrawCommand> {
        self.draws().into_iter().filter(|d| d.pane() == pane).collect()
    }

    pub fn last_view(&self) -> Option<Viewport> {
        self.events.borrow().iter().rev().find_map(|e| match e {
            SurfaceEvent::View { viewport } => Some(*viewport),
            _ => None,
        })
    }

    fn push(&self, event: SurfaceEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl MapSurface for RecordingSurface {
    fn create_pane(&self, pane: PaneKind) {
        self.push(SurfaceEvent::CreatePane {
            pane,
            z_index: pane.z_index(),
        });
    }

    fn add_tile_layer(&self, provider: &TileProvider) {
        self.push(SurfaceEvent::TileLayer {
            provider: provider.clone(),
        });
    }

    fn set_view(&self, center: LatLng, zoom: f64) {
        self.push(SurfaceEvent::View {
            viewport: Viewport::Center { center, zoom },
        });
    }

    fn fit_bounds(&self, bounds: LatLngBounds) {
        self.push(SurfaceEvent::View {
            viewport: Viewport::Fit { bounds },
        });
    }

    fn draw(&self, command: &DrawCommand) {
        self.push(SurfaceEvent::Draw {
            command: command.clone(),
        });
    }
}

/// Hands out [`RecordingSurface`]s and keeps them for inspection.
///
/// By default every mount id exists; [`RecordingFactory::with_elements`]
/// restricts the page to a fixed set of ids.
#[derive(Debug, Default)]
pub struct RecordingFactory {
    elements: Option<BTreeSet<String>>,
    surfaces: RefCell<BTreeMap<String, Rc<RecordingSurface>>>,
    created: RefCell<Vec<String>>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_elements<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            elements: Some(ids.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn surface(&self, mount_id: &str) -> Option<Rc<RecordingSurface>> {
        self.surfaces.borrow().get(mount_id).cloned()
    }

    /// Mount ids in the order surfaces were created.
    pub fn created(&self) -> Vec<String> {
        self.created.borrow().clone()
    }
}

impl SurfaceFactory for RecordingFactory {
    fn create(&self, mount_id: &str) -> Result<Rc<dyn MapSurface>, MissingElement> {
        if let Some(elements) = &self.elements {
            if !elements.contains(mount_id) {
                return Err(MissingElement(mount_id.to_string()));
            }
        }
        let surface = Rc::new(RecordingSurface::new());
        self.surfaces
            .borrow_mut()
            .insert(mount_id.to_string(), surface.clone());
        self.created.borrow_mut().push(mount_id.to_string());
        Ok(surface)
    }
}
