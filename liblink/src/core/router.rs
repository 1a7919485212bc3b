use crate::{Address, EthernetAddress, EthernetFrame, InternetDatagram, NetworkInterface};

use log::debug;

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};

/// A [`NetworkInterface`] whose host side is asynchronous: datagrams
/// surfaced by `recv_frame` are buffered for later retrieval with
/// `maybe_receive` instead of being returned to the caller.
pub struct AsyncNetworkInterface {
    interface: NetworkInterface,
    datagrams_in: VecDeque<InternetDatagram>,
}

impl From<NetworkInterface> for AsyncNetworkInterface {
    fn from(interface: NetworkInterface) -> Self {
        AsyncNetworkInterface {
            interface,
            datagrams_in: VecDeque::new(),
        }
    }
}

impl AsyncNetworkInterface {
    pub fn new(ethernet_address: EthernetAddress, ip_address: Address) -> Self {
        NetworkInterface::new(ethernet_address, ip_address).into()
    }

    pub fn recv_frame(&mut self, frame: &EthernetFrame) {
        if let Some(dgram) = self.interface.recv_frame(frame) {
            self.datagrams_in.push_back(dgram);
        }
    }

    /// The next received datagram, oldest first.
    pub fn maybe_receive(&mut self) -> Option<InternetDatagram> {
        self.datagrams_in.pop_front()
    }
}

impl Deref for AsyncNetworkInterface {
    type Target = NetworkInterface;

    fn deref(&self) -> &Self::Target {
        &self.interface
    }
}

impl DerefMut for AsyncNetworkInterface {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.interface
    }
}

#[derive(Clone, Copy, Debug)]
struct RoutingTableEntry {
    route_prefix: u32,
    prefix_length: u8,
    next_hop: Option<Address>,
    interface_num: usize,
}

/// A router with multiple network interfaces, forwarding IPv4 datagrams
/// between them by longest-prefix-match.
#[derive(Default)]
pub struct Router {
    interfaces: Vec<AsyncNetworkInterface>,
    routing_table: Vec<RoutingTableEntry>,
}

impl Router {
    pub fn new() -> Self {
        Router::default()
    }

    /// Adds an interface, returning its permanent index.
    pub fn add_interface(&mut self, interface: AsyncNetworkInterface) -> usize {
        self.interfaces.push(interface);
        self.interfaces.len() - 1
    }

    pub fn interface(&mut self, n: usize) -> &mut AsyncNetworkInterface {
        &mut self.interfaces[n]
    }

    /// Installs a forwarding rule: datagrams whose destination matches the
    /// top `prefix_length` bits of `route_prefix` leave on interface
    /// `interface_num` toward `next_hop`, or toward their own destination
    /// when the network is directly attached (`next_hop` is `None`).
    pub fn add_route(
        &mut self,
        route_prefix: u32,
        prefix_length: u8,
        next_hop: Option<Address>,
        interface_num: usize,
    ) {
        debug!(
            "adding route {}/{} => {} on interface {}",
            Address::from_ipv4_numeric(route_prefix).ip(),
            prefix_length,
            match &next_hop {
                Some(hop) => hop.ip(),
                None => "(direct)".to_string(),
            },
            interface_num
        );
        self.routing_table.push(RoutingTableEntry {
            route_prefix,
            prefix_length,
            next_hop,
            interface_num,
        });
    }

    /// Forwards every datagram currently received on any interface.
    ///
    /// Datagrams with no matching route or with an expired TTL are dropped;
    /// everything else leaves with its TTL decremented and its header
    /// checksum recomputed.
    pub fn route(&mut self) {
        for i in 0..self.interfaces.len() {
            while let Some(mut dgram) = self.interfaces[i].maybe_receive() {
                let dst = dgram.header().dst;

                let Some(entry) = self.longest_prefix_match(dst) else {
                    debug!(
                        "no route for {}, dropping",
                        Address::from_ipv4_numeric(dst).ip()
                    );
                    continue;
                };

                if dgram.header().ttl <= 1 {
                    debug!(
                        "TTL ran out on datagram for {}, dropping",
                        Address::from_ipv4_numeric(dst).ip()
                    );
                    continue;
                }
                dgram.header_mut().ttl -= 1;
                dgram.header_mut().compute_checksum();

                let next_hop = entry
                    .next_hop
                    .unwrap_or_else(|| Address::from_ipv4_numeric(dst));
                self.interfaces[entry.interface_num].send_datagram(dgram, &next_hop);
            }
        }
    }

    /// The matching route with the greatest prefix length. Among equals the
    /// first-installed entry wins.
    fn longest_prefix_match(&self, dst: u32) -> Option<RoutingTableEntry> {
        let mut best: Option<RoutingTableEntry> = None;
        for entry in &self.routing_table {
            if !Self::is_prefix_match(dst, entry.route_prefix, entry.prefix_length) {
                continue;
            }
            match best {
                Some(b) if entry.prefix_length <= b.prefix_length => {}
                _ => best = Some(*entry),
            }
        }
        best
    }

    fn is_prefix_match(ip_address1: u32, ip_address2: u32, prefix_length: u8) -> bool {
        if prefix_length == 0 {
            return true;
        }
        let mask = if prefix_length >= 32 {
            u32::MAX
        } else {
            !0u32 << (32 - prefix_length as u32)
        };
        (ip_address1 & mask) == (ip_address2 & mask)
    }
}
