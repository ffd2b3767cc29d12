pub mod logging;
pub mod spawner;

pub use spawner::*;
