#![cfg(target_os = "linux")]

// These tests open raw AF_PACKET sockets on the loopback interface and
// therefore need CAP_NET_RAW; run them with `cargo test -- --ignored` as
// root.

use arping::{resolve, Config, ResolveError};
use arping_afpacket::AsyncBoundSocket;
use arping_packets::{
    ArpIpv4, ArpPacket, EthernetFrame, MacAddr, ARP_ETHER_TYPE, ARP_REQUEST,
};
use std::ffi::CString;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};
use tokio::{runtime, time};

#[test]
#[ignore]
fn timeout_is_reported_within_a_bounded_margin() {
    let mut rt = runtime::Runtime::new().unwrap();

    // TEST-NET-3 space; nothing on loopback will answer for it.
    let config = Config {
        interface: "lo".to_string(),
        target: "203.0.113.123".parse().unwrap(),
        timeout: Duration::from_millis(50),
    };

    let started = Instant::now();
    let result = rt.block_on(resolve(&config));
    let elapsed = started.elapsed();

    match result {
        Err(ResolveError::Timeout(t)) => assert_eq!(t, Duration::from_millis(50)),
        other => panic!("expected Timeout, got {:?}", other),
    }
    assert!(elapsed >= Duration::from_millis(50));
    assert!(
        elapsed <= Duration::from_millis(200),
        "timeout took {:?}",
        elapsed
    );
}

#[test]
#[ignore]
fn request_is_well_formed_on_the_wire() {
    let mut rt = runtime::Runtime::new().unwrap();

    rt.block_on(async {
        let iface = CString::new("lo").unwrap();
        let mut monitor = AsyncBoundSocket::from_interface(&iface, ARP_ETHER_TYPE).unwrap();
        monitor.set_promiscuous(true).unwrap();

        let target: Ipv4Addr = "203.0.113.7".parse().unwrap();
        let config = Config {
            interface: "lo".to_string(),
            target: target.into(),
            timeout: Duration::from_millis(100),
        };
        let exchange = tokio::spawn(async move {
            // Nobody answers on loopback; the exchange itself times out.
            match resolve(&config).await {
                Err(ResolveError::Timeout(_)) => {}
                other => panic!("expected Timeout, got {:?}", other),
            }
        });

        let mut buf = vec![0; 1500];
        let (len, _) = time::timeout(Duration::from_secs(1), monitor.recv(&mut buf))
            .await
            .unwrap()
            .unwrap();

        let frame = EthernetFrame::from_buffer(&buf[..len]).unwrap();
        assert_eq!(frame.dest_mac, MacAddr::BROADCAST);
        assert_eq!(frame.ether_type, ARP_ETHER_TYPE);
        let packet = ArpPacket::from_buffer(&frame.payload).unwrap();
        assert_eq!(packet.opcode, ARP_REQUEST);
        let addrs = ArpIpv4::from_buffer(&packet.payload).unwrap();
        assert_eq!(addrs.target_ip, target);
        assert_eq!(addrs.sender_ip, Ipv4Addr::LOCALHOST);

        exchange.await.unwrap();
    });
}
