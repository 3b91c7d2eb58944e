use crate::{MacAddr, ParseError};
use std::convert::TryFrom;
use std::net::Ipv4Addr;

/// ARP opcode for a request.
pub const ARP_REQUEST: u16 = 1;
/// ARP opcode for a reply.
pub const ARP_REPLY: u16 = 2;
/// Hardware type value for Ethernet.
pub const ETHERNET_HARDWARE_TYPE: u16 = 1;
/// Hardware address length on Ethernet.
pub const ETHERNET_HARDWARE_ADDR_LEN: u8 = 6;
/// Protocol address length for IPv4.
pub const IPV4_PROTOCOL_ADDR_LEN: u8 = 4;

const ARP_HEADER_LEN: usize = 8;
const ARP_IPV4_LEN: usize = 20;

///
/// The fixed ARP header described in RFC 826, with the address block kept as
/// an opaque payload. The declared address lengths say how the payload must
/// be interpreted by the next layer; they are trusted, not verified, here.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArpPacket {
    pub hardware_type: u16,
    pub protocol_type: u16,
    pub hardware_addr_len: u8,
    pub protocol_addr_len: u8,
    pub opcode: u16,
    pub payload: Vec<u8>,
}

impl ArpPacket {
    pub fn new(
        hardware_type: u16,
        protocol_type: u16,
        hardware_addr_len: u8,
        protocol_addr_len: u8,
        opcode: u16,
        payload: Vec<u8>,
    ) -> Self {
        ArpPacket {
            hardware_type,
            protocol_type,
            hardware_addr_len,
            protocol_addr_len,
            opcode,
            payload,
        }
    }

    /// Parses an ARP packet from a raw buffer. Opcode and protocol-family
    /// values are not validated; downstream logic decides whether it
    /// understands them.
    pub fn from_buffer(buf: &[u8]) -> Result<ArpPacket, ParseError> {
        if buf.len() < ARP_HEADER_LEN {
            return Err(ParseError::Truncated {
                expected: ARP_HEADER_LEN,
                actual: buf.len(),
            });
        }

        Ok(ArpPacket {
            hardware_type: u16::from_be_bytes([buf[0], buf[1]]),
            protocol_type: u16::from_be_bytes([buf[2], buf[3]]),
            hardware_addr_len: buf[4],
            protocol_addr_len: buf[5],
            opcode: u16::from_be_bytes([buf[6], buf[7]]),
            payload: buf[ARP_HEADER_LEN..].to_vec(),
        })
    }

    /// Serializes the 8-byte header in network byte order followed by the
    /// payload verbatim.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(ARP_HEADER_LEN + self.payload.len());
        bytes.extend_from_slice(&self.hardware_type.to_be_bytes());
        bytes.extend_from_slice(&self.protocol_type.to_be_bytes());
        bytes.push(self.hardware_addr_len);
        bytes.push(self.protocol_addr_len);
        bytes.extend_from_slice(&self.opcode.to_be_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes
    }
}

///
/// The sender/target address block of an ARP packet for the IPv4-over-
/// Ethernet case: senderMAC(6) | senderIP(4) | targetMAC(6) | targetIP(4).
/// Only decoded once the enclosing header is known to declare hardware
/// length 6 and protocol length 4; this codec does not re-check that.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArpIpv4 {
    pub sender_mac: MacAddr,
    pub sender_ip: Ipv4Addr,
    pub target_mac: MacAddr,
    pub target_ip: Ipv4Addr,
}

impl ArpIpv4 {
    pub fn new(
        sender_mac: MacAddr,
        sender_ip: Ipv4Addr,
        target_mac: MacAddr,
        target_ip: Ipv4Addr,
    ) -> Self {
        ArpIpv4 {
            sender_mac,
            sender_ip,
            target_mac,
            target_ip,
        }
    }

    pub fn from_buffer(buf: &[u8]) -> Result<ArpIpv4, ParseError> {
        if buf.len() < ARP_IPV4_LEN {
            return Err(ParseError::Truncated {
                expected: ARP_IPV4_LEN,
                actual: buf.len(),
            });
        }

        Ok(ArpIpv4 {
            sender_mac: MacAddr::new(<[u8; 6]>::try_from(&buf[0..6]).unwrap()),
            sender_ip: Ipv4Addr::from(u32::from_be_bytes([buf[6], buf[7], buf[8], buf[9]])),
            target_mac: MacAddr::new(<[u8; 6]>::try_from(&buf[10..16]).unwrap()),
            target_ip: Ipv4Addr::from(u32::from_be_bytes([buf[16], buf[17], buf[18], buf[19]])),
        })
    }

    /// Serializes to exactly 20 bytes, IP addresses big-endian.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(ARP_IPV4_LEN);
        bytes.extend_from_slice(&self.sender_mac.bytes);
        bytes.extend_from_slice(&self.sender_ip.octets());
        bytes.extend_from_slice(&self.target_mac.bytes);
        bytes.extend_from_slice(&self.target_ip.octets());
        bytes
    }
}
