pub mod ethernet_header;
pub use ethernet_header::*;

pub mod ethernet_frame;
pub use ethernet_frame::*;

pub mod arp_message;
pub use arp_message::*;

pub mod ipv4_header;
pub use ipv4_header::*;

pub mod ipv4_datagram;
pub use ipv4_datagram::*;
