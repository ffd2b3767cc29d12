pub mod compositor;
pub mod layer;
pub mod pane;
pub mod parent;
pub mod registry;
pub mod services;
pub mod surface;
pub mod symbology;

pub use compositor::*;
pub use layer::*;
pub use pane::*;
pub use parent::*;
pub use registry::*;
pub use services::*;
pub use surface::*;
pub use symbology::*;
