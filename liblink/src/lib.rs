pub mod core;
pub mod net_helpers;
pub mod util;

pub use crate::core::{AsyncNetworkInterface, NetworkInterface, Router};
pub use net_helpers::{
    ARPMessage, EthernetAddress, EthernetFrame, EthernetHeader, IPv4Datagram, IPv4Header,
    InternetDatagram, ETHERNET_BROADCAST,
};
pub use util::{
    hexdump, timestamp_ms, Address, Buffer, BufferError, BufferList, InternetChecksum,
    Milliseconds, NetParser, NetUnparser, ParseError,
};
