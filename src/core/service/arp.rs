use core::dev::Device;
use core::iface::Interface;
use core::repr::{
    eth_types,
    Arp,
    ArpOp,
    EthernetAddress,
    EthernetFrame,
    Ipv4Address,
};
use core::service::{
    ethernet,
    Router,
};
use {
    Error,
    Result,
};

/// Sends an ARP packet out of an interface.
pub fn send_packet<D: Device>(
    router: &Router<D>,
    iface: &Interface,
    arp_repr: &Arp,
    dst_addr: EthernetAddress,
) -> Result<()> {
    let frame_len = EthernetFrame::<&[u8]>::buffer_len(arp_repr.buffer_len());

    ethernet::send_frame(router, frame_len, iface, |eth_frame| {
        eth_frame.set_dst_addr(dst_addr);
        eth_frame.set_ethertype(eth_types::ARP);
        arp_repr.serialize(eth_frame.payload_mut()).unwrap();
    })
}

/// Broadcasts an ARP request for a next hop on an interface.
pub fn send_request<D: Device>(
    router: &Router<D>,
    iface: &Interface,
    target_addr: Ipv4Address,
) -> Result<()> {
    let arp_repr = Arp {
        op: ArpOp::Request,
        source_hw_addr: iface.ethernet_addr,
        source_proto_addr: iface.ipv4_addr,
        target_hw_addr: EthernetAddress::new([0; 6]),
        target_proto_addr: target_addr,
    };

    send_packet(router, iface, &arp_repr, EthernetAddress::BROADCAST)
}

/// Receives an ARP packet from an interface.
///
/// Requests for the interface address get a reply; replies resolve the cache
/// and flush any frames queued behind the answered request.
pub fn recv_packet<D: Device>(
    router: &Router<D>,
    iface: &Interface,
    arp_buffer: &[u8],
) -> Result<()> {
    let arp_repr = Arp::deserialize(arp_buffer)?;

    if arp_repr.target_proto_addr != iface.ipv4_addr {
        debug!(
            "Ignoring ARP with target {} on {}.",
            arp_repr.target_proto_addr, iface.name
        );
        return Err(Error::Ignored);
    }

    match arp_repr.op {
        ArpOp::Request => {
            let arp_reply = Arp {
                op: ArpOp::Reply,
                source_hw_addr: iface.ethernet_addr,
                source_proto_addr: iface.ipv4_addr,
                target_hw_addr: arp_repr.source_hw_addr,
                target_proto_addr: arp_repr.source_proto_addr,
            };

            debug!(
                "Sending ARP reply to {}/{}.",
                arp_reply.target_proto_addr, arp_reply.target_hw_addr
            );

            send_packet(router, iface, &arp_reply, arp_reply.target_hw_addr)
        }
        ArpOp::Reply => {
            debug!(
                "Received ARP reply, adding mapping from {} to {}.",
                arp_repr.source_proto_addr, arp_repr.source_hw_addr
            );

            let request = router
                .arp_cache()
                .insert(arp_repr.source_proto_addr, arp_repr.source_hw_addr);

            if let Some(request) = request {
                debug!("Flushing {} queued frames.", request.frames.len());

                for mut pending in request.frames {
                    {
                        let mut eth_frame = EthernetFrame::try_new(&mut pending.buffer[..])?;
                        eth_frame.set_dst_addr(arp_repr.source_hw_addr);
                    }

                    if let Err(err) = router.dev().send(&pending.buffer, &pending.iface) {
                        debug!(
                            "Error flushing frame on {} with {:?}.",
                            pending.iface, err
                        );
                    }
                }
            }

            Ok(())
        }
    }
}
