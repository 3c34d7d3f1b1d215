use core::dev::Device;
use core::iface::Interface;
use core::repr::{
    eth_types,
    EthernetFrame,
};
use core::service::{
    arp,
    ipv4,
    Router,
};
use {
    Error,
    Result,
};

/// Sends an Ethernet frame out of an interface.
///
/// The frame's source address is filled in from the interface; the closure
/// writes the destination, ethertype and payload.
pub fn send_frame<D, F>(router: &Router<D>, frame_len: usize, iface: &Interface, f: F) -> Result<()>
where
    D: Device,
    F: FnOnce(&mut EthernetFrame<&mut [u8]>),
{
    let mut eth_buffer = vec![0; frame_len];

    {
        let mut eth_frame = EthernetFrame::try_new(&mut eth_buffer[..])?;
        f(&mut eth_frame);
        eth_frame.set_src_addr(iface.ethernet_addr);
    }

    router.dev().send(&eth_buffer, &iface.name)
}

/// Receives an Ethernet frame from an interface.
///
/// The frame is filtered against the interface's link address and propagated
/// up the stack by ethertype.
pub fn recv_frame<D: Device>(router: &Router<D>, eth_buffer: &[u8], iface_name: &str) -> Result<()> {
    let eth_frame = EthernetFrame::try_new(eth_buffer)?;

    let iface = match router.interfaces().lookup(iface_name) {
        Some(iface) => iface,
        None => {
            debug!("Ignoring frame on unknown interface {}.", iface_name);
            return Err(Error::Ignored);
        }
    };

    if eth_frame.dst_addr() != iface.ethernet_addr && !eth_frame.dst_addr().is_broadcast() {
        debug!(
            "Ignoring frame with destination {} on {}.",
            eth_frame.dst_addr(),
            iface.name
        );
        return Err(Error::Ignored);
    }

    match eth_frame.ethertype() {
        eth_types::ARP => arp::recv_packet(router, iface, eth_frame.payload()),
        eth_types::IPV4 => ipv4::recv_packet(router, iface, eth_frame.payload()),
        i => {
            debug!("Ignoring frame with ethertype 0x{:04X}.", i);
            Err(Error::Ignored)
        }
    }
}
