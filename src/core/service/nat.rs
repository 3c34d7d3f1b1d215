use byteorder::{
    NetworkEndian,
    WriteBytesExt,
};

use core::dev::Device;
use core::iface::Interface;
use core::nat::{
    Mapping,
    MappingType,
    NatTable,
};
use core::repr::{
    ipv4_protocols,
    Icmpv4Packet,
    Icmpv4Repr,
    Ipv4Address,
    Ipv4Packet,
    TcpPacket,
};
use core::service::{
    icmpv4,
    ipv4,
    Router,
};
use {
    Error,
    Result,
};

/// Rewrites the source endpoint of a datagram leaving through the external
/// interface.
///
/// ICMP echo identifiers and TCP source ports are mapped through the NAT
/// table; other traffic passes untouched. The IP header checksum is
/// refilled later by the forwarding path.
///
/// # Errors
///
/// Causes an `Exhausted` error when the identifier space for the mapping
/// type is used up, in which case the packet must be dropped.
pub fn send_translate<D: Device>(
    router: &Router<D>,
    egress: &Interface,
    ip_buffer: &mut [u8],
) -> Result<()> {
    let nat = match router.nat() {
        Some(nat) => nat,
        None => return Ok(()),
    };

    // Only flows crossing onto the external link are rewritten.
    if egress.ipv4_addr != nat.external_addr() {
        return Ok(());
    }

    let mut ip_packet = Ipv4Packet::try_new(ip_buffer)?;
    let src_addr = ip_packet.src_addr();
    let dst_addr = ip_packet.dst_addr();

    if src_addr == nat.external_addr() {
        return Ok(());
    }

    match ip_packet.protocol() {
        ipv4_protocols::ICMP => {
            let id = {
                let icmp_packet = Icmpv4Packet::try_new(&ip_packet.payload()[..])?;
                match Icmpv4Repr::deserialize(&icmp_packet) {
                    Ok(Icmpv4Repr::EchoRequest { id, .. })
                    | Ok(Icmpv4Repr::EchoReply { id, .. }) => id,
                    _ => return Ok(()),
                }
            };

            let mapping = mapping_for(nat, MappingType::Icmp, src_addr, id)?;

            {
                let mut icmp_packet = Icmpv4Packet::try_new(ip_packet.payload_mut())?;
                (&mut icmp_packet.header_mut()[0 .. 2])
                    .write_u16::<NetworkEndian>(mapping.aux_ext)
                    .unwrap();
                icmp_packet.fill_checksum();
            }

            ip_packet.set_src_addr(mapping.ip_ext);
        }
        ipv4_protocols::TCP => {
            let src_port = TcpPacket::try_new(&ip_packet.payload()[..])?.src_port();
            let mapping = mapping_for(nat, MappingType::Tcp, src_addr, src_port)?;

            ip_packet.set_src_addr(mapping.ip_ext);

            let mut tcp_packet = TcpPacket::try_new(ip_packet.payload_mut())?;
            tcp_packet.set_src_port(mapping.aux_ext);
            tcp_packet.fill_checksum(&mapping.ip_ext, &dst_addr);
        }
        _ => {}
    }

    Ok(())
}

/// Intercepts a datagram addressed to the external address whose endpoint
/// identifier belongs to a live mapping, rewriting it back to the internal
/// endpoint and forwarding it.
///
/// Returns `true` when the datagram was consumed; otherwise the caller
/// continues with local delivery.
pub fn recv_translate<D: Device>(
    router: &Router<D>,
    in_iface: &Interface,
    ipv4_packet: &Ipv4Packet<&[u8]>,
) -> Result<bool> {
    let nat = match router.nat() {
        Some(nat) => nat,
        None => return Ok(false),
    };

    if ipv4_packet.dst_addr() != nat.external_addr() {
        return Ok(false);
    }

    let mapping = match ipv4_packet.protocol() {
        ipv4_protocols::ICMP => {
            let icmp_packet = Icmpv4Packet::try_new(ipv4_packet.payload())?;
            match Icmpv4Repr::deserialize(&icmp_packet) {
                // Only replies map back; echo requests from outside are for
                // the router's own responder.
                Ok(Icmpv4Repr::EchoReply { id, .. }) => {
                    nat.lookup_external(MappingType::Icmp, id)
                }
                _ => None,
            }
        }
        ipv4_protocols::TCP => {
            let tcp_packet = TcpPacket::try_new(ipv4_packet.payload())?;
            nat.lookup_external(MappingType::Tcp, tcp_packet.dst_port())
        }
        _ => None,
    };

    let mapping = match mapping {
        Some(mapping) => mapping,
        None => return Ok(false),
    };

    debug!(
        "Translating inbound {:?} flow back to {}.",
        mapping.mapping_type, mapping.ip_int
    );

    // The datagram continues on to the internal endpoint, so it ages like
    // any other forwarded traffic.
    if ipv4_packet.ttl() <= 1 {
        icmpv4::send_time_exceeded(router, ipv4_packet.as_ref())?;
        return Ok(true);
    }

    let packet_len = ipv4_packet.packet_len() as usize;
    let mut datagram = ipv4_packet.as_ref()[.. packet_len].to_vec();

    {
        let mut ip_packet = Ipv4Packet::try_new(&mut datagram[..])?;
        let src_addr = ip_packet.src_addr();
        let ttl = ip_packet.ttl();
        ip_packet.set_ttl(ttl - 1);
        ip_packet.set_dst_addr(mapping.ip_int);

        match mapping.mapping_type {
            MappingType::Icmp => {
                let mut icmp_packet = Icmpv4Packet::try_new(ip_packet.payload_mut())?;
                (&mut icmp_packet.header_mut()[0 .. 2])
                    .write_u16::<NetworkEndian>(mapping.aux_int)
                    .unwrap();
                icmp_packet.fill_checksum();
            }
            MappingType::Tcp => {
                let mut tcp_packet = TcpPacket::try_new(ip_packet.payload_mut())?;
                tcp_packet.set_dst_port(mapping.aux_int);
                tcp_packet.fill_checksum(&src_addr, &mapping.ip_int);
            }
        }
    }

    ipv4::forward(router, Some(in_iface), datagram)?;
    Ok(true)
}

fn mapping_for(
    nat: &NatTable,
    mapping_type: MappingType,
    ip_int: Ipv4Address,
    aux_int: u16,
) -> Result<Mapping> {
    if let Some(mapping) = nat.lookup_internal(mapping_type, ip_int, aux_int) {
        return Ok(mapping);
    }

    match nat.insert(mapping_type, ip_int, aux_int) {
        Some(mapping) => Ok(mapping),
        None => Err(Error::Exhausted),
    }
}
