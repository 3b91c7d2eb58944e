use crate::{Config, ResolveError};
use arping_afpacket::{AsyncBoundSocket, Socket};
use arping_packets::{
    ArpIpv4, ArpPacket, EthernetFrame, MacAddr, ARP_ETHER_TYPE, ARP_REPLY, ARP_REQUEST,
    ETHERNET_HARDWARE_ADDR_LEN, ETHERNET_HARDWARE_TYPE, IPV4_ETHER_TYPE, IPV4_PROTOCOL_ADDR_LEN,
};
use log::debug;
use std::ffi::CString;
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use tokio::time;

const RECV_BUFFER_LEN: usize = 1500;

/// Drives one request/reply cycle: broadcast a single ARP request for the
/// target and wait for the matching reply, bounded by `config.timeout`.
///
/// Exactly one request frame is sent per invocation; there is no retry. The
/// socket is exclusively owned by this call and closed when it returns. On
/// expiry the pending receive future is dropped and [`ResolveError::Timeout`]
/// is returned through the normal result channel.
pub async fn resolve(config: &Config) -> Result<MacAddr, ResolveError> {
    // Gate the address family before any socket is opened.
    let target = match config.target {
        IpAddr::V4(addr) => addr,
        IpAddr::V6(_) => return Err(ResolveError::UnsupportedAddressFamily),
    };

    let iface = CString::new(config.interface.as_str()).map_err(|_| ResolveError::Interface {
        name: config.interface.clone(),
        cause: io::Error::new(io::ErrorKind::InvalidInput, "interface name contains NUL"),
    })?;

    let mut sock = Socket::new(ARP_ETHER_TYPE).map_err(ResolveError::Socket)?;
    sock.set_nonblocking(true).map_err(ResolveError::Socket)?;
    let sock = sock.bind(&iface).map_err(|cause| ResolveError::Interface {
        name: config.interface.clone(),
        cause,
    })?;
    let mut sock = AsyncBoundSocket::new(sock).map_err(ResolveError::Socket)?;

    let src_mac = MacAddr::new(sock.hw_addr());
    let src_ip = sock.local_ipv4().map_err(|cause| ResolveError::Interface {
        name: config.interface.clone(),
        cause,
    })?;

    let request = build_request(src_mac, src_ip, target);
    debug!(
        "sending ARP request for {} on {} (sender {} / {})",
        target, config.interface, src_mac, src_ip
    );
    sock.send(&request).await.map_err(ResolveError::Socket)?;

    match time::timeout(config.timeout, await_reply(&mut sock, target)).await {
        Ok(result) => result,
        Err(_) => Err(ResolveError::Timeout(config.timeout)),
    }
}

/// Encodes the request frame: ArpIpv4 block, wrapped in an ARP header with
/// the request opcode, wrapped in a broadcast Ethernet frame.
fn build_request(src_mac: MacAddr, src_ip: Ipv4Addr, target: Ipv4Addr) -> Vec<u8> {
    // The target hardware address in a request is a placeholder; it must be
    // present but repliers ignore it.
    let addrs = ArpIpv4::new(src_mac, src_ip, MacAddr::BROADCAST, target);
    let packet = ArpPacket::new(
        ETHERNET_HARDWARE_TYPE,
        IPV4_ETHER_TYPE,
        ETHERNET_HARDWARE_ADDR_LEN,
        IPV4_PROTOCOL_ADDR_LEN,
        ARP_REQUEST,
        addrs.to_bytes(),
    );
    EthernetFrame::new(MacAddr::BROADCAST, src_mac, ARP_ETHER_TYPE, packet.to_bytes()).to_bytes()
}

/// Receives until a frame decodes as the reply for `target`. Frames that do
/// not decode or do not match are other hosts' traffic, not errors; only the
/// socket itself can fail here.
async fn await_reply(
    sock: &mut AsyncBoundSocket,
    target: Ipv4Addr,
) -> Result<MacAddr, ResolveError> {
    let mut buf = vec![0u8; RECV_BUFFER_LEN];
    loop {
        let (len, _) = sock.recv(&mut buf).await.map_err(ResolveError::Socket)?;
        match match_reply(&buf[..len], target) {
            Some(mac) => return Ok(mac),
            None => debug!("ignoring {} byte frame that is not a matching reply", len),
        }
    }
}

/// Extracts the sender hardware address from `buf` if it decodes through the
/// Frame -> ArpPacket -> ArpIpv4 chain as an IPv4-over-Ethernet ARP reply
/// whose sender is `target`.
fn match_reply(buf: &[u8], target: Ipv4Addr) -> Option<MacAddr> {
    let frame = EthernetFrame::from_buffer(buf).ok()?;
    if frame.ether_type != ARP_ETHER_TYPE {
        return None;
    }
    let packet = ArpPacket::from_buffer(&frame.payload).ok()?;
    if packet.opcode != ARP_REPLY
        || packet.hardware_type != ETHERNET_HARDWARE_TYPE
        || packet.protocol_type != IPV4_ETHER_TYPE
        || packet.hardware_addr_len != ETHERNET_HARDWARE_ADDR_LEN
        || packet.protocol_addr_len != IPV4_PROTOCOL_ADDR_LEN
    {
        return None;
    }
    let addrs = ArpIpv4::from_buffer(&packet.payload).ok()?;
    if addrs.sender_ip != target {
        return None;
    }
    Some(addrs.sender_mac)
}
