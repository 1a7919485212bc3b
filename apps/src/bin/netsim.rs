//! Simulates two hosts joined by a router over in-memory wires and pushes a
//! datagram each way, printing the frames as they cross. Run with
//! `RUST_LOG=debug` (or `trace`) to watch the ARP conversations.

use anyhow::{bail, Result};
use liblink::{
    hexdump, timestamp_ms, Address, AsyncNetworkInterface, BufferList, EthernetAddress,
    EthernetFrame, IPv4Header, InternetDatagram, NetworkInterface, Router,
};
use log::{debug, info};
use rand::Rng;

/// A random locally-administered unicast Ethernet address.
fn random_host_ethernet_address() -> EthernetAddress {
    let mut octets: [u8; 6] = rand::thread_rng().gen();
    octets[0] = (octets[0] | 0x02) & !0x01;
    EthernetAddress::new(octets)
}

fn udp_datagram(src: &Address, dst: &Address, payload: &[u8]) -> InternetDatagram {
    let header = IPv4Header {
        len: (IPv4Header::LENGTH + payload.len()) as u16,
        ttl: 64,
        proto: 17,
        src: src.ipv4_numeric(),
        dst: dst.ipv4_numeric(),
        ..IPv4Header::default()
    };
    InternetDatagram::new(header, BufferList::from(payload.to_vec()))
}

fn log_frame(wire: &str, frame: &EthernetFrame) {
    debug!("[{}] {}", wire, frame.header());
    debug!("\n{}", hexdump(&frame.serialize().concat(), 4));
}

/// Moves queued frames from a host onto a router port and back, collecting
/// whatever the host's interface delivers upward.
fn pump_wire(
    wire: &str,
    host: &mut NetworkInterface,
    router: &mut Router,
    port: usize,
    inbox: &mut Vec<InternetDatagram>,
) {
    loop {
        let mut idle = true;
        while let Some(frame) = host.maybe_send() {
            log_frame(wire, &frame);
            router.interface(port).recv_frame(&frame);
            idle = false;
        }
        while let Some(frame) = router.interface(port).maybe_send() {
            log_frame(wire, &frame);
            if let Some(dgram) = host.recv_frame(&frame) {
                inbox.push(dgram);
            }
            idle = false;
        }
        if idle {
            return;
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let gateway_a = Address::try_from_string("10.0.0.1")?;
    let gateway_b = Address::try_from_string("10.1.0.1")?;
    let addr_a = Address::try_from_string("10.0.0.5")?;
    let addr_b = Address::try_from_string("10.1.0.9")?;

    let mut host_a = NetworkInterface::new(random_host_ethernet_address(), addr_a);
    let mut host_b = NetworkInterface::new(random_host_ethernet_address(), addr_b);

    let mut router = Router::new();
    router.add_interface(AsyncNetworkInterface::new(
        random_host_ethernet_address(),
        gateway_a,
    ));
    router.add_interface(AsyncNetworkInterface::new(
        random_host_ethernet_address(),
        gateway_b,
    ));
    router.add_route(addr_a.ipv4_numeric() & 0xffff_0000, 16, None, 0);
    router.add_route(addr_b.ipv4_numeric() & 0xffff_0000, 16, None, 1);

    info!("{} sends to {} via {}", addr_a, addr_b, gateway_a);
    host_a.send_datagram(udp_datagram(&addr_a, &addr_b, b"marco"), &gateway_a);

    let mut inbox_a = Vec::new();
    let mut inbox_b = Vec::new();
    let mut last_tick = timestamp_ms();

    for round in 0.. {
        pump_wire("wire A", &mut host_a, &mut router, 0, &mut inbox_a);
        router.route();
        pump_wire("wire B", &mut host_b, &mut router, 1, &mut inbox_b);

        // Time only passes when the host says so.
        let now = timestamp_ms();
        let elapsed: u64 = (now - last_tick).into();
        last_tick = now;
        host_a.tick(elapsed);
        host_b.tick(elapsed);
        router.interface(0).tick(elapsed);
        router.interface(1).tick(elapsed);

        if let Some(dgram) = inbox_b.pop() {
            info!(
                "{} got {:?} (ttl {})",
                addr_b,
                String::from_utf8_lossy(&dgram.payload().concat()),
                dgram.header().ttl
            );
            info!("{} answers via {}", addr_b, gateway_b);
            host_b.send_datagram(udp_datagram(&addr_b, &addr_a, b"polo"), &gateway_b);
        }

        if let Some(dgram) = inbox_a.pop() {
            println!(
                "round trip complete: {:?} back at {} with ttl {}",
                String::from_utf8_lossy(&dgram.payload().concat()),
                addr_a,
                dgram.header().ttl
            );
            return Ok(());
        }

        if round > 16 {
            bail!("network never converged");
        }
    }
    unreachable!()
}
