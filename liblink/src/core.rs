pub mod network_interface;
pub use network_interface::*;

pub mod router;
pub use router::*;
