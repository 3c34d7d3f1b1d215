use core::arp_cache::QueueResult;
use core::dev::Device;
use core::iface::Interface;
use core::repr::{
    eth_types,
    ipv4_protocols,
    EthernetFrame,
    Ipv4Address,
    Ipv4Packet,
};
use core::service::{
    arp,
    icmpv4,
    nat,
    Router,
};
use {
    Error,
    Result,
};

/// Receives an IPv4 packet from an interface.
///
/// The packet is validated, translated through NAT when applicable, and
/// either delivered to the router itself or forwarded.
pub fn recv_packet<D: Device>(
    router: &Router<D>,
    in_iface: &Interface,
    ipv4_buffer: &[u8],
) -> Result<()> {
    let ipv4_packet = Ipv4Packet::try_new(ipv4_buffer)?;
    ipv4_packet.check_encoding()?;

    // Inbound NAT interception happens ahead of local delivery so translated
    // flows transparently traverse the external address.
    if nat::recv_translate(router, in_iface, &ipv4_packet)? {
        return Ok(());
    }

    if router.interfaces().has_ip(ipv4_packet.dst_addr()) {
        if ipv4_packet.protocol() == ipv4_protocols::ICMP {
            icmpv4::recv_packet(router, &ipv4_packet)
        } else {
            debug!(
                "Received protocol {} for us; sending port unreachable to {}.",
                ipv4_packet.protocol(),
                ipv4_packet.src_addr()
            );
            icmpv4::send_port_unreachable(router, ipv4_buffer)
        }
    } else {
        if ipv4_packet.ttl() <= 1 {
            debug!(
                "TTL expired on packet from {}; sending time exceeded.",
                ipv4_packet.src_addr()
            );
            // The buffer still holds the frame as received (TTL intact), so
            // the quoted datagram matches what the source sent.
            return icmpv4::send_time_exceeded(router, ipv4_buffer);
        }

        let packet_len = ipv4_packet.packet_len() as usize;
        let mut datagram = ipv4_buffer[.. packet_len].to_vec();

        {
            let mut packet = Ipv4Packet::try_new(&mut datagram[..])?;
            let ttl = packet.ttl();
            packet.set_ttl(ttl - 1);
            packet.fill_header_checksum();
        }

        forward(router, Some(in_iface), datagram)
    }
}

/// Routes a complete IPv4 datagram and hands it to the link layer.
///
/// `in_iface` is the receiving interface when forwarding ingress traffic and
/// `None` for datagrams the router originates. The header checksum is
/// recomputed here, after any TTL or NAT edits.
pub fn forward<D: Device>(
    router: &Router<D>,
    in_iface: Option<&Interface>,
    mut datagram: Vec<u8>,
) -> Result<()> {
    let dst_addr = Ipv4Packet::try_new(&datagram[..])?.dst_addr();

    let route = match router.routes().route(dst_addr) {
        // A route pointing back out the receiving interface is as good as no
        // route at all.
        Some(route) if in_iface.map_or(true, |iface| iface.name != route.iface) => route,
        _ => {
            debug!("No viable route to {}; sending host unreachable.", dst_addr);
            return icmpv4::send_host_unreachable(router, &datagram[..]);
        }
    };

    let egress = match router.interfaces().lookup(&route.iface) {
        Some(iface) => iface,
        None => {
            debug!("Route to {} names unknown interface {}.", dst_addr, route.iface);
            return Err(Error::Unroutable);
        }
    };

    if let Some(in_iface) = in_iface {
        nat::send_translate(router, egress, &mut datagram[..])?;
        debug!(
            "Forwarding packet for {} from {} to {}.",
            dst_addr, in_iface.name, egress.name
        );
    }

    {
        let mut packet = Ipv4Packet::try_new(&mut datagram[..])?;
        packet.fill_header_checksum();
    }

    send_datagram(router, egress, route.gateway, &datagram[..])
}

/// Wraps a datagram in an Ethernet frame toward a next hop, transmitting it
/// immediately on an ARP cache hit or parking it behind an ARP request.
fn send_datagram<D: Device>(
    router: &Router<D>,
    egress: &Interface,
    next_hop: Ipv4Address,
    datagram: &[u8],
) -> Result<()> {
    let mut frame = vec![0; EthernetFrame::<&[u8]>::buffer_len(datagram.len())];

    {
        let mut eth_frame = EthernetFrame::try_new(&mut frame[..])?;
        eth_frame.set_src_addr(egress.ethernet_addr);
        eth_frame.set_ethertype(eth_types::IPV4);
        eth_frame.payload_mut().copy_from_slice(datagram);
    }

    if let Some(eth_addr) = router.arp_cache().lookup(next_hop) {
        let mut eth_frame = EthernetFrame::try_new(&mut frame[..])?;
        eth_frame.set_dst_addr(eth_addr);
        return router.dev().send(eth_frame.as_ref(), &egress.name);
    }

    match router.arp_cache().queue(next_hop, &frame[..], &egress.name) {
        QueueResult::Resolved(eth_addr) => {
            let mut eth_frame = EthernetFrame::try_new(&mut frame[..])?;
            eth_frame.set_dst_addr(eth_addr);
            router.dev().send(eth_frame.as_ref(), &egress.name)
        }
        QueueResult::NewRequest => {
            debug!("Sending ARP request for {} on {}.", next_hop, egress.name);
            arp::send_request(router, egress, next_hop)?;
            Err(Error::MacResolution(next_hop))
        }
        QueueResult::Pending => Err(Error::MacResolution(next_hop)),
    }
}
