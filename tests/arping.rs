extern crate env_logger;
extern crate usrouter;

mod context;

use usrouter::core::repr::{
    eth_types,
    Arp,
    ArpOp,
    EthernetAddress,
    EthernetFrame,
};

#[test]
fn replies_to_arp_requests_for_an_interface_address() {
    let router = context::router();

    let arp_repr = Arp {
        op: ArpOp::Request,
        source_hw_addr: context::host_mac(),
        source_proto_addr: context::ip("10.0.0.2"),
        target_hw_addr: EthernetAddress::new([0; 6]),
        target_proto_addr: context::ip("10.0.0.1"),
    };

    let frame = context::frame(
        EthernetAddress::BROADCAST,
        context::host_mac(),
        eth_types::ARP,
        &context::arp_payload(&arp_repr),
    );

    router.handle_frame(&frame, "eth0").unwrap();

    let sent = router.dev().take_sent();
    assert_eq!(1, sent.len());
    assert_eq!("eth0", sent[0].1);

    let eth_frame = EthernetFrame::try_new(&sent[0].0[..]).unwrap();
    assert_eq!(context::host_mac(), eth_frame.dst_addr());
    assert_eq!(context::eth0_mac(), eth_frame.src_addr());
    assert_eq!(eth_types::ARP, eth_frame.ethertype());

    let arp_reply = Arp::deserialize(eth_frame.payload()).unwrap();
    assert_eq!(ArpOp::Reply, arp_reply.op);
    assert_eq!(context::eth0_mac(), arp_reply.source_hw_addr);
    assert_eq!(context::ip("10.0.0.1"), arp_reply.source_proto_addr);
    assert_eq!(context::host_mac(), arp_reply.target_hw_addr);
    assert_eq!(context::ip("10.0.0.2"), arp_reply.target_proto_addr);
}

#[test]
fn ignores_arp_requests_for_other_addresses() {
    let router = context::router();

    let arp_repr = Arp {
        op: ArpOp::Request,
        source_hw_addr: context::host_mac(),
        source_proto_addr: context::ip("10.0.0.2"),
        target_hw_addr: EthernetAddress::new([0; 6]),
        target_proto_addr: context::ip("10.0.0.9"),
    };

    let frame = context::frame(
        EthernetAddress::BROADCAST,
        context::host_mac(),
        eth_types::ARP,
        &context::arp_payload(&arp_repr),
    );

    assert!(router.handle_frame(&frame, "eth0").is_err());
    assert!(router.dev().take_sent().is_empty());
}

#[test]
fn ignores_frames_for_other_link_addresses() {
    let router = context::router();

    let arp_repr = Arp {
        op: ArpOp::Request,
        source_hw_addr: context::host_mac(),
        source_proto_addr: context::ip("10.0.0.2"),
        target_hw_addr: EthernetAddress::new([0; 6]),
        target_proto_addr: context::ip("10.0.0.1"),
    };

    let frame = context::frame(
        context::gateway_mac(),
        context::host_mac(),
        eth_types::ARP,
        &context::arp_payload(&arp_repr),
    );

    assert!(router.handle_frame(&frame, "eth0").is_err());
    assert!(router.dev().take_sent().is_empty());
}
