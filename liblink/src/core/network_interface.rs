use crate::{
    ARPMessage, Address, Buffer, BufferList, EthernetAddress, EthernetFrame, EthernetHeader,
    InternetDatagram, NetParser, ETHERNET_BROADCAST,
};

use log::{debug, trace};

use std::collections::{HashMap, VecDeque};

/// One ARP cache mapping. A pending entry owns the datagrams waiting on it,
/// so a pending queue exists exactly as long as its entry does.
#[derive(Debug)]
enum ArpEntry {
    Pending {
        ttl: i64,
        datagrams: VecDeque<InternetDatagram>,
    },
    Resolved {
        ttl: i64,
        mac: EthernetAddress,
    },
}

impl ArpEntry {
    fn ttl_mut(&mut self) -> &mut i64 {
        match self {
            ArpEntry::Pending { ttl, .. } => ttl,
            ArpEntry::Resolved { ttl, .. } => ttl,
        }
    }
}

/// A network interface that connects IP (the internet layer) with Ethernet
/// (the link layer).
///
/// Outbound datagrams become Ethernet frames once the next hop's Ethernet
/// address is known, asking for it over ARP and queueing behind the request
/// when it is not. Inbound frames are filtered by destination, surfaced to
/// the caller when they carry IPv4, and fed to the ARP state machine when
/// they carry ARP.
pub struct NetworkInterface {
    ethernet_address: EthernetAddress,
    ip_address: Address,
    frames_out: VecDeque<EthernetFrame>,
    arp_cache: HashMap<u32, ArpEntry>,
}

impl NetworkInterface {
    /// How long an unanswered ARP request reserves its cache slot, in ms.
    const MAX_RETX_WAITING_TIME: i64 = 5_000;
    /// How long a resolved mapping lives without refresh, in ms.
    const MAX_CACHE_TIME: i64 = 30_000;

    pub fn new(ethernet_address: EthernetAddress, ip_address: Address) -> Self {
        debug!(
            "network interface has Ethernet address {} and IP address {}",
            ethernet_address, ip_address
        );
        NetworkInterface {
            ethernet_address,
            ip_address,
            frames_out: VecDeque::new(),
            arp_cache: HashMap::new(),
        }
    }

    #[inline(always)]
    pub fn ethernet_address(&self) -> EthernetAddress {
        self.ethernet_address
    }

    #[inline(always)]
    pub fn ip_address(&self) -> &Address {
        &self.ip_address
    }

    /// Sends an IPv4 datagram toward `next_hop`, encapsulated in an Ethernet
    /// frame if the next hop's Ethernet address is already known. Otherwise
    /// the datagram waits on an ARP request; "sending" means `maybe_send`
    /// will release the frame once resolution completes.
    pub fn send_datagram(&mut self, dgram: InternetDatagram, next_hop: &Address) {
        let next_hop_ip = next_hop.ipv4_numeric();

        let resolved = match self.arp_cache.get_mut(&next_hop_ip) {
            Some(ArpEntry::Resolved { mac, .. }) => Some(*mac),
            Some(ArpEntry::Pending { datagrams, .. }) => {
                // A request for this hop is already in flight. Queue behind
                // it without refreshing the timer or asking again.
                datagrams.push_back(dgram);
                return;
            }
            None => None,
        };

        match resolved {
            Some(mac) => self.push_datagram_frame(mac, &dgram),
            None => {
                self.arp_cache.insert(
                    next_hop_ip,
                    ArpEntry::Pending {
                        ttl: Self::MAX_RETX_WAITING_TIME,
                        datagrams: VecDeque::from([dgram]),
                    },
                );

                let request = self.make_arp(
                    ARPMessage::OPCODE_REQUEST,
                    EthernetAddress::default(),
                    next_hop_ip,
                );
                trace!("sending {}", request);
                self.push_frame(
                    ETHERNET_BROADCAST,
                    EthernetHeader::TYPE_ARP,
                    request.serialize().into(),
                );
            }
        }
    }

    /// Processes an inbound Ethernet frame, returning the datagram it
    /// carries when it is an IPv4 frame for this interface.
    ///
    /// ARP payloads never surface: the sender mapping is learned (resolving
    /// any entry waiting on it), and requests that ask for this interface's
    /// own address are answered.
    pub fn recv_frame(&mut self, frame: &EthernetFrame) -> Option<InternetDatagram> {
        let header = frame.header();
        if header.dst != self.ethernet_address && header.dst != ETHERNET_BROADCAST {
            trace!("ignoring frame addressed to {}", header.dst);
            return None;
        }

        match header.ty {
            EthernetHeader::TYPE_IPV4 => {
                let mut dgram = InternetDatagram::default();
                match dgram.parse(Buffer::from(frame.payload().concat())) {
                    Ok(()) => Some(dgram),
                    Err(err) => {
                        debug!("discarding undecodable IPv4 payload: {}", err);
                        None
                    }
                }
            }
            EthernetHeader::TYPE_ARP => {
                let mut arp = ARPMessage::default();
                let mut p = NetParser::new(Buffer::from(frame.payload().concat()));
                match arp.parse(&mut p) {
                    Ok(()) => self.recv_arp(&arp),
                    Err(err) => debug!("discarding undecodable ARP payload: {}", err),
                }
                None
            }
            ty => {
                trace!("ignoring frame with unknown type {:#06x}", ty);
                None
            }
        }
    }

    fn recv_arp(&mut self, arp: &ARPMessage) {
        let sender_mac = arp.sender_ethernet_address;
        let sender_ip = arp.sender_ip_address;

        // Learn from the sender pair regardless of opcode. Replacing the
        // entry wholesale refreshes a resolved mapping (and adopts a changed
        // Ethernet address) and resolves a pending one.
        let prior = self.arp_cache.insert(
            sender_ip,
            ArpEntry::Resolved {
                ttl: Self::MAX_CACHE_TIME,
                mac: sender_mac,
            },
        );
        if let Some(ArpEntry::Pending { datagrams, .. }) = prior {
            trace!(
                "resolved {} => {}, releasing {} queued datagram(s)",
                Address::from_ipv4_numeric(sender_ip).ip(),
                sender_mac,
                datagrams.len()
            );
            for dgram in datagrams {
                self.push_datagram_frame(sender_mac, &dgram);
            }
        }

        // Answer requests that ask for our own address. Requests for other
        // addresses are learned from (above) but not answered.
        if arp.opcode == ARPMessage::OPCODE_REQUEST
            && arp.target_ip_address == self.ip_address.ipv4_numeric()
        {
            let reply = self.make_arp(ARPMessage::OPCODE_REPLY, sender_mac, sender_ip);
            trace!("sending {}", reply);
            self.push_frame(sender_mac, EthernetHeader::TYPE_ARP, reply.serialize().into());
        }
    }

    /// Ages every cache entry by `ms_since_last_tick`, dropping the ones
    /// whose lifetime ran out. An expired pending entry takes its queued
    /// datagrams with it, silently.
    pub fn tick(&mut self, ms_since_last_tick: u64) {
        self.arp_cache.retain(|_, entry| {
            let ttl = entry.ttl_mut();
            *ttl = ttl.saturating_sub(ms_since_last_tick as i64);
            *ttl > 0
        });
    }

    /// Releases the next frame awaiting transmission, oldest first.
    pub fn maybe_send(&mut self) -> Option<EthernetFrame> {
        self.frames_out.pop_front()
    }

    fn make_arp(
        &self,
        opcode: u16,
        target_ethernet_address: EthernetAddress,
        target_ip_address: u32,
    ) -> ARPMessage {
        ARPMessage {
            opcode,
            sender_ethernet_address: self.ethernet_address,
            sender_ip_address: self.ip_address.ipv4_numeric(),
            target_ethernet_address,
            target_ip_address,
        }
    }

    fn push_datagram_frame(&mut self, dst: EthernetAddress, dgram: &InternetDatagram) {
        match dgram.serialize() {
            Ok(payload) => self.push_frame(dst, EthernetHeader::TYPE_IPV4, payload),
            Err(err) => debug!("discarding unserializable datagram: {}", err),
        }
    }

    fn push_frame(&mut self, dst: EthernetAddress, ty: u16, payload: BufferList) {
        let frame = EthernetFrame::new(
            EthernetHeader {
                dst,
                src: self.ethernet_address,
                ty,
            },
            payload,
        );
        self.frames_out.push_back(frame);
    }
}
