use std::cmp::min;

use core::dev::Device;
use core::repr::{
    ipv4_protocols,
    DestinationUnreachable,
    Icmpv4Packet,
    Icmpv4Repr,
    Ipv4Packet,
    Ipv4Repr,
};
use core::repr::ipv4::DEFAULT_TTL;
use core::service::{
    ipv4,
    Router,
};
use {
    Error,
    Result,
};

/// Sends an ICMP message inside a freshly built IPv4 datagram.
///
/// The closure writes the ICMP payload; both checksums are filled in before
/// the datagram enters the forwarding path.
pub fn send_packet<D, F>(
    router: &Router<D>,
    ipv4_repr: &Ipv4Repr,
    icmp_repr: &Icmpv4Repr,
    f: F,
) -> Result<()>
where
    D: Device,
    F: FnOnce(&mut [u8]),
{
    let mut ip_buffer = vec![0; ipv4_repr.buffer_len()];

    {
        let mut ip_packet = Ipv4Packet::try_new(&mut ip_buffer[..])?;
        // Serialize the header first so payload_mut() sees the header length.
        ipv4_repr.serialize(&mut ip_packet);

        let mut icmp_packet = Icmpv4Packet::try_new(ip_packet.payload_mut())?;
        icmp_repr.serialize(&mut icmp_packet)?;
        f(icmp_packet.payload_mut());
        icmp_packet.fill_checksum();
    }

    ipv4::forward(router, None, ip_buffer)
}

/// Receives an ICMP packet addressed to the router.
///
/// Echo requests get a reply with the payload mirrored back; everything else
/// is dropped.
pub fn recv_packet<D: Device>(router: &Router<D>, ipv4_packet: &Ipv4Packet<&[u8]>) -> Result<()> {
    let icmp_packet = Icmpv4Packet::try_new(ipv4_packet.payload())?;
    icmp_packet.check_encoding()?;

    match Icmpv4Repr::deserialize(&icmp_packet)? {
        Icmpv4Repr::EchoRequest {
            id,
            seq,
            payload_len,
        } => {
            debug!("Got a ping from {}; sending echo reply.", ipv4_packet.src_addr());

            let icmp_repr = Icmpv4Repr::EchoReply {
                id,
                seq,
                payload_len,
            };

            let ipv4_repr = Ipv4Repr {
                src_addr: ipv4_packet.dst_addr(),
                dst_addr: ipv4_packet.src_addr(),
                protocol: ipv4_protocols::ICMP,
                ttl: DEFAULT_TTL,
                dont_fragment: true,
                identification: router.next_ident(),
                payload_len: icmp_repr.buffer_len(),
            };

            send_packet(router, &ipv4_repr, &icmp_repr, |icmp_payload| {
                icmp_payload.copy_from_slice(icmp_packet.payload());
            })
        }
        message => {
            debug!("Ignoring ICMP message {:?}.", message);
            Err(Error::Ignored)
        }
    }
}

/// Sends a Host Unreachable toward the source of an undeliverable datagram.
pub fn send_host_unreachable<D: Device>(router: &Router<D>, original: &[u8]) -> Result<()> {
    send_error(
        router,
        Icmpv4Repr::DestinationUnreachable(DestinationUnreachable::HostUnreachable),
        original,
    )
}

/// Sends a Port Unreachable toward the source of a datagram for a protocol
/// the router does not terminate.
pub fn send_port_unreachable<D: Device>(router: &Router<D>, original: &[u8]) -> Result<()> {
    send_error(
        router,
        Icmpv4Repr::DestinationUnreachable(DestinationUnreachable::PortUnreachable),
        original,
    )
}

/// Sends a Time Exceeded toward the source of a datagram whose TTL ran out.
pub fn send_time_exceeded<D: Device>(router: &Router<D>, original: &[u8]) -> Result<()> {
    send_error(router, Icmpv4Repr::TimeExceeded, original)
}

/// Builds and routes an ICMP error quoting the offending datagram.
///
/// The error's source address is the address of the interface the reply
/// routes out of. Errors about our own traffic are suppressed to avoid
/// reflection loops, typically after an ARP failure on a locally originated
/// packet.
fn send_error<D: Device>(router: &Router<D>, icmp_repr: Icmpv4Repr, original: &[u8]) -> Result<()> {
    let original_packet = Ipv4Packet::try_new(original)?;
    let dst_addr = original_packet.src_addr();

    if router.interfaces().has_ip(dst_addr) {
        debug!("Suppressing ICMP error toward our own address {}.", dst_addr);
        return Ok(());
    }

    let src_addr = match router
        .routes()
        .route(dst_addr)
        .and_then(|route| router.interfaces().lookup(&route.iface))
    {
        Some(iface) => iface.ipv4_addr,
        None => {
            debug!("No route for ICMP error toward {}.", dst_addr);
            return Err(Error::Unroutable);
        }
    };

    let ipv4_repr = Ipv4Repr {
        src_addr,
        dst_addr,
        protocol: ipv4_protocols::ICMP,
        ttl: DEFAULT_TTL,
        dont_fragment: true,
        identification: router.next_ident(),
        payload_len: icmp_repr.buffer_len(),
    };

    send_packet(router, &ipv4_repr, &icmp_repr, |icmp_payload| {
        // Quote the offending header + leading payload bytes as received,
        // zero padded if the datagram was shorter than the quote.
        let quoted = min(icmp_payload.len(), original.len());
        icmp_payload[.. quoted].copy_from_slice(&original[.. quoted]);
    })
}
