#![cfg(target_os = "linux")]

use arping_afpacket as afpacket;
use arping_packets as packets;
use rand::{self, Rng};
use std::{ffi::CString, net::Ipv4Addr, sync::mpsc, thread, time::Duration};

fn random_arp_request(rng: &mut impl Rng) -> packets::EthernetFrame {
    let src_mac = packets::MacAddr::new(rng.gen());
    let addrs = packets::ArpIpv4::new(
        src_mac,
        Ipv4Addr::from(rng.gen::<u32>()),
        packets::MacAddr::BROADCAST,
        Ipv4Addr::from(rng.gen::<u32>()),
    );
    let packet = packets::ArpPacket::new(
        packets::ETHERNET_HARDWARE_TYPE,
        packets::IPV4_ETHER_TYPE,
        packets::ETHERNET_HARDWARE_ADDR_LEN,
        packets::IPV4_PROTOCOL_ADDR_LEN,
        packets::ARP_REQUEST,
        addrs.to_bytes(),
    );
    packets::EthernetFrame::new(
        packets::MacAddr::BROADCAST,
        src_mac,
        packets::ARP_ETHER_TYPE,
        packet.to_bytes(),
    )
}

#[test]
#[ignore]
fn layer2_loopback() {
    // If this takes more than a second to occur, something's definitely wrong.
    let timeout = Duration::from_secs(1);

    let mut rng = rand::thread_rng();

    let iface_name = CString::new("lo").unwrap();

    let side_a = afpacket::Socket::new(packets::ARP_ETHER_TYPE).unwrap();
    let mut side_a = side_a.bind(&iface_name).unwrap();

    let side_b = afpacket::Socket::new(packets::ARP_ETHER_TYPE).unwrap();

    let (tx, rx) = mpsc::channel();

    let thread_b = thread::spawn(move || {
        let mut side_b = side_b.bind(&iface_name).unwrap();
        side_b.set_promiscuous(true).unwrap();

        println!("b: recving frame");
        let mut in_buffer = vec![0; 1500];
        let (len, _) = side_b.recv(&mut in_buffer).unwrap();
        in_buffer.resize(len, 0);
        println!("b: recved frame");

        side_b.set_promiscuous(false).unwrap();

        tx.send(in_buffer).unwrap();
    });

    // now send a frame from side a to side b
    let out_frame = random_arp_request(&mut rng).to_bytes();

    println!("a: sending frame");
    side_a.send(&out_frame).unwrap();
    println!("a: sent frame");

    let in_frame = rx.recv_timeout(timeout).unwrap();
    assert_eq!(in_frame, out_frame);

    thread_b.join().unwrap();
}

#[test]
#[ignore]
fn bound_socket_knows_its_interface() {
    let iface_name = CString::new("lo").unwrap();

    let sock = afpacket::Socket::new(packets::ARP_ETHER_TYPE).unwrap();
    let sock = sock.bind(&iface_name).unwrap();

    assert!(sock.if_index() > 0);
    // The loopback interface has no hardware address...
    assert_eq!(sock.hw_addr(), [0; 6]);
    // ...but it does carry an IPv4 address.
    assert_eq!(sock.local_ipv4().unwrap(), Ipv4Addr::LOCALHOST);
}

#[test]
#[ignore]
fn bind_rejects_missing_interface() {
    let iface_name = CString::new("does-not-exist0").unwrap();

    let sock = afpacket::Socket::new(packets::ARP_ETHER_TYPE).unwrap();
    assert!(sock.bind(&iface_name).is_err());
}

#[test]
#[ignore]
fn nonblocking_toggle() {
    let mut sock = afpacket::Socket::new(packets::ARP_ETHER_TYPE).unwrap();
    assert!(!sock.is_nonblocking().unwrap());
    sock.set_nonblocking(true).unwrap();
    assert!(sock.is_nonblocking().unwrap());
    sock.set_nonblocking(false).unwrap();
    assert!(!sock.is_nonblocking().unwrap());
}
