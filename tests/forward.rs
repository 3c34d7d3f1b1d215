#[macro_use]
extern crate assert_matches;
extern crate env_logger;
extern crate usrouter;

mod context;

use usrouter::core::repr::{
    eth_types,
    Arp,
    ArpOp,
    EthernetAddress,
    EthernetFrame,
    Icmpv4Packet,
    Ipv4Packet,
};
use usrouter::Error;

#[test]
fn forwarding_without_a_resolved_next_hop_queues_behind_arp() {
    let router = context::router();

    let datagram = context::ipv4_datagram(
        context::ip("172.16.0.5"),
        context::ip("192.168.1.9"),
        17,
        64,
        &[1, 2, 3, 4, 5, 6, 7, 8],
    );
    let frame = context::frame(
        context::eth1_mac(),
        context::host_mac(),
        eth_types::IPV4,
        &datagram,
    );

    assert_matches!(
        router.handle_frame(&frame, "eth1"),
        Err(Error::MacResolution(addr)) if addr == context::ip("10.0.0.254")
    );

    // The next hop is being ARPed on the egress interface.
    let sent = router.dev().take_sent();
    assert_eq!(1, sent.len());
    assert_eq!("eth0", sent[0].1);

    let eth_frame = EthernetFrame::try_new(&sent[0].0[..]).unwrap();
    assert!(eth_frame.dst_addr().is_broadcast());
    assert_eq!(context::eth0_mac(), eth_frame.src_addr());
    assert_eq!(eth_types::ARP, eth_frame.ethertype());

    let arp_request = Arp::deserialize(eth_frame.payload()).unwrap();
    assert_eq!(ArpOp::Request, arp_request.op);
    assert_eq!(context::ip("10.0.0.1"), arp_request.source_proto_addr);
    assert_eq!(context::ip("10.0.0.254"), arp_request.target_proto_addr);

    // The ARP reply releases the queued frame with the learned address.
    let arp_reply = Arp {
        op: ArpOp::Reply,
        source_hw_addr: context::gateway_mac(),
        source_proto_addr: context::ip("10.0.0.254"),
        target_hw_addr: context::eth0_mac(),
        target_proto_addr: context::ip("10.0.0.1"),
    };
    let reply_frame = context::frame(
        context::eth0_mac(),
        context::gateway_mac(),
        eth_types::ARP,
        &context::arp_payload(&arp_reply),
    );

    router.handle_frame(&reply_frame, "eth0").unwrap();

    let sent = router.dev().take_sent();
    assert_eq!(1, sent.len());
    assert_eq!("eth0", sent[0].1);

    let eth_frame = EthernetFrame::try_new(&sent[0].0[..]).unwrap();
    assert_eq!(context::gateway_mac(), eth_frame.dst_addr());
    assert_eq!(context::eth0_mac(), eth_frame.src_addr());
    assert_eq!(eth_types::IPV4, eth_frame.ethertype());

    let ip_packet = Ipv4Packet::try_new(eth_frame.payload()).unwrap();
    ip_packet.check_encoding().unwrap();
    assert_eq!(context::ip("172.16.0.5"), ip_packet.src_addr());
    assert_eq!(context::ip("192.168.1.9"), ip_packet.dst_addr());
    assert_eq!(63, ip_packet.ttl());
    assert_eq!(&[1, 2, 3, 4, 5, 6, 7, 8], ip_packet.payload());
}

#[test]
fn forwarding_with_a_resolved_next_hop_is_immediate() {
    let router = context::router();
    router
        .arp_cache()
        .insert(context::ip("10.0.0.254"), context::gateway_mac());

    let datagram = context::ipv4_datagram(
        context::ip("172.16.0.5"),
        context::ip("192.168.1.9"),
        17,
        2,
        &[1, 2, 3, 4, 5, 6, 7, 8],
    );
    let frame = context::frame(
        context::eth1_mac(),
        context::host_mac(),
        eth_types::IPV4,
        &datagram,
    );

    router.handle_frame(&frame, "eth1").unwrap();

    let sent = router.dev().take_sent();
    assert_eq!(1, sent.len());

    let eth_frame = EthernetFrame::try_new(&sent[0].0[..]).unwrap();
    let ip_packet = Ipv4Packet::try_new(eth_frame.payload()).unwrap();
    ip_packet.check_encoding().unwrap();
    assert_eq!(1, ip_packet.ttl());
}

#[test]
fn expired_ttl_generates_a_time_exceeded() {
    let router = context::router();
    router
        .arp_cache()
        .insert(context::ip("10.0.0.254"), context::gateway_mac());

    let datagram = context::ipv4_datagram(
        context::ip("1.2.3.4"),
        context::ip("192.168.1.9"),
        17,
        1,
        &[1, 2, 3, 4, 5, 6, 7, 8],
    );
    let frame = context::frame(
        context::eth1_mac(),
        context::host_mac(),
        eth_types::IPV4,
        &datagram,
    );

    router.handle_frame(&frame, "eth1").unwrap();

    let sent = router.dev().take_sent();
    assert_eq!(1, sent.len());
    assert_eq!("eth0", sent[0].1);

    let eth_frame = EthernetFrame::try_new(&sent[0].0[..]).unwrap();
    let ip_packet = Ipv4Packet::try_new(eth_frame.payload()).unwrap();
    ip_packet.check_encoding().unwrap();
    assert_eq!(context::ip("10.0.0.1"), ip_packet.src_addr());
    assert_eq!(context::ip("1.2.3.4"), ip_packet.dst_addr());

    let icmp_packet = Icmpv4Packet::try_new(ip_packet.payload()).unwrap();
    icmp_packet.check_encoding().unwrap();
    assert_eq!(11, icmp_packet.message_type());
    assert_eq!(0, icmp_packet.code());
    // The quoted datagram still carries the TTL of 1 it arrived with.
    assert_eq!(&datagram[..], icmp_packet.payload());
    assert_eq!(1, icmp_packet.payload()[8]);
}

#[test]
fn routes_back_out_the_ingress_interface_are_rejected() {
    let router = context::router();
    router
        .arp_cache()
        .insert(context::ip("10.0.0.254"), context::gateway_mac());

    // 192.168.1.0/24 routes out eth0, the interface the packet came in on.
    let datagram = context::ipv4_datagram(
        context::ip("10.0.0.2"),
        context::ip("192.168.1.9"),
        17,
        64,
        &[1, 2, 3, 4, 5, 6, 7, 8],
    );
    let frame = context::frame(
        context::eth0_mac(),
        context::host_mac(),
        eth_types::IPV4,
        &datagram,
    );

    router.handle_frame(&frame, "eth0").unwrap();

    let sent = router.dev().take_sent();
    assert_eq!(1, sent.len());

    let eth_frame = EthernetFrame::try_new(&sent[0].0[..]).unwrap();
    let ip_packet = Ipv4Packet::try_new(eth_frame.payload()).unwrap();
    assert_eq!(context::ip("10.0.0.2"), ip_packet.dst_addr());

    let icmp_packet = Icmpv4Packet::try_new(ip_packet.payload()).unwrap();
    icmp_packet.check_encoding().unwrap();
    assert_eq!(3, icmp_packet.message_type());
    assert_eq!(1, icmp_packet.code());
}

#[test]
fn frames_shorter_than_an_ethernet_header_are_dropped() {
    let router = context::router();

    assert!(router.handle_frame(&[0; 13], "eth0").is_err());
    assert!(router.dev().take_sent().is_empty());
}

#[test]
fn unknown_ethertypes_are_dropped() {
    let router = context::router();

    let frame = context::frame(
        EthernetAddress::BROADCAST,
        context::host_mac(),
        0x86DD,
        &[0; 40],
    );

    assert!(router.handle_frame(&frame, "eth0").is_err());
    assert!(router.dev().take_sent().is_empty());
}
