pub mod key;
pub mod store;
pub mod ttl;

pub use key::*;
pub use store::*;
pub use ttl::*;
