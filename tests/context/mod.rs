use std::str::FromStr;

use usrouter::core::config::Config;
use usrouter::core::dev::MockDevice;
use usrouter::core::iface::{
    Interface,
    Interfaces,
    Route,
    RoutingTable,
};
use usrouter::core::repr::{
    Arp,
    EthernetAddress,
    EthernetFrame,
    Icmpv4Packet,
    Icmpv4Repr,
    Ipv4Address,
    Ipv4Packet,
    Ipv4Repr,
    TcpPacket,
};
use usrouter::core::service::Router;

#[allow(dead_code)]
pub fn ip(addr: &str) -> Ipv4Address {
    Ipv4Address::from_str(addr).unwrap()
}

#[allow(dead_code)]
pub fn mac(addr: &str) -> EthernetAddress {
    EthernetAddress::from_str(addr).unwrap()
}

#[allow(dead_code)]
pub fn eth0_mac() -> EthernetAddress {
    mac("AA:00:00:00:00:01")
}

#[allow(dead_code)]
pub fn eth1_mac() -> EthernetAddress {
    mac("AA:00:00:00:00:02")
}

/// A host on the eth0 subnet.
#[allow(dead_code)]
pub fn host_mac() -> EthernetAddress {
    mac("BB:00:00:00:00:02")
}

/// The gateway both default and 192.168.1.0/24 routes point at.
#[allow(dead_code)]
pub fn gateway_mac() -> EthernetAddress {
    mac("CC:00:00:00:00:FE")
}

fn interfaces() -> Interfaces {
    Interfaces::new(vec![
        Interface {
            name: "eth0".to_string(),
            ethernet_addr: eth0_mac(),
            ipv4_addr: ip("10.0.0.1"),
        },
        Interface {
            name: "eth1".to_string(),
            ethernet_addr: eth1_mac(),
            ipv4_addr: ip("172.16.0.1"),
        },
    ])
}

fn routes() -> RoutingTable {
    RoutingTable::new(vec![
        Route {
            dest: ip("192.168.1.0"),
            mask: ip("255.255.255.0"),
            gateway: ip("10.0.0.254"),
            iface: "eth0".to_string(),
        },
        Route {
            dest: ip("172.16.0.0"),
            mask: ip("255.255.0.0"),
            gateway: ip("172.16.0.254"),
            iface: "eth1".to_string(),
        },
        Route {
            dest: ip("0.0.0.0"),
            mask: ip("0.0.0.0"),
            gateway: ip("10.0.0.254"),
            iface: "eth0".to_string(),
        },
    ])
}

/// A two interface router over a frame-capturing device.
#[allow(dead_code)]
pub fn router() -> Router<MockDevice> {
    let _ = ::env_logger::try_init();
    Router::new(MockDevice::new(), interfaces(), routes(), Config::default()).unwrap()
}

/// Same as router(), with NAT toward eth0 and a short ICMP mapping timeout.
#[allow(dead_code)]
pub fn nat_router() -> Router<MockDevice> {
    let _ = ::env_logger::try_init();

    let config = Config {
        nat_enabled: true,
        external_iface: Some("eth0".to_string()),
        icmp_timeout: 1,
        ..Config::default()
    };

    Router::new(MockDevice::new(), interfaces(), routes(), config).unwrap()
}

/// Builds a complete Ethernet frame around a payload.
#[allow(dead_code)]
pub fn frame(
    dst_addr: EthernetAddress,
    src_addr: EthernetAddress,
    ethertype: u16,
    payload: &[u8],
) -> Vec<u8> {
    let mut buffer = vec![0; EthernetFrame::<&[u8]>::buffer_len(payload.len())];

    {
        let mut eth_frame = EthernetFrame::try_new(&mut buffer[..]).unwrap();
        eth_frame.set_dst_addr(dst_addr);
        eth_frame.set_src_addr(src_addr);
        eth_frame.set_ethertype(ethertype);
        eth_frame.payload_mut().copy_from_slice(payload);
    }

    buffer
}

/// Serializes an ARP packet into a standalone buffer.
#[allow(dead_code)]
pub fn arp_payload(arp_repr: &Arp) -> Vec<u8> {
    let mut buffer = vec![0; arp_repr.buffer_len()];
    arp_repr.serialize(&mut buffer[..]).unwrap();
    buffer
}

/// Builds an IPv4 datagram with a valid header checksum.
#[allow(dead_code)]
pub fn ipv4_datagram(
    src_addr: Ipv4Address,
    dst_addr: Ipv4Address,
    protocol: u8,
    ttl: u8,
    payload: &[u8],
) -> Vec<u8> {
    let ipv4_repr = Ipv4Repr {
        src_addr,
        dst_addr,
        protocol,
        ttl,
        dont_fragment: false,
        identification: 1,
        payload_len: payload.len(),
    };

    let mut buffer = vec![0; ipv4_repr.buffer_len()];

    {
        let mut packet = Ipv4Packet::try_new(&mut buffer[..]).unwrap();
        ipv4_repr.serialize(&mut packet);
        packet.payload_mut().copy_from_slice(payload);
    }

    buffer
}

/// Builds an ICMP echo request message with a valid checksum.
#[allow(dead_code)]
pub fn echo_request(id: u16, seq: u16, payload: &[u8]) -> Vec<u8> {
    echo(
        Icmpv4Repr::EchoRequest {
            id,
            seq,
            payload_len: payload.len(),
        },
        payload,
    )
}

/// Builds an ICMP echo reply message with a valid checksum.
#[allow(dead_code)]
pub fn echo_reply(id: u16, seq: u16, payload: &[u8]) -> Vec<u8> {
    echo(
        Icmpv4Repr::EchoReply {
            id,
            seq,
            payload_len: payload.len(),
        },
        payload,
    )
}

#[allow(dead_code)]
fn echo(icmp_repr: Icmpv4Repr, payload: &[u8]) -> Vec<u8> {
    let mut buffer = vec![0; icmp_repr.buffer_len()];

    {
        let mut packet = Icmpv4Packet::try_new(&mut buffer[..]).unwrap();
        icmp_repr.serialize(&mut packet).unwrap();
        packet.payload_mut().copy_from_slice(payload);
        packet.fill_checksum();
    }

    buffer
}

/// Builds a bare TCP segment with a valid checksum for the given endpoints.
#[allow(dead_code)]
pub fn tcp_segment(
    src_addr: Ipv4Address,
    dst_addr: Ipv4Address,
    src_port: u16,
    dst_port: u16,
) -> Vec<u8> {
    let mut buffer = vec![0; TcpPacket::<&[u8]>::MIN_HEADER_LEN];
    // Data offset of 5 words keeps the segment parsable by observers.
    buffer[12] = 0x50;

    {
        let mut packet = TcpPacket::try_new(&mut buffer[..]).unwrap();
        packet.set_src_port(src_port);
        packet.set_dst_port(dst_port);
        packet.fill_checksum(&src_addr, &dst_addr);
    }

    buffer
}
