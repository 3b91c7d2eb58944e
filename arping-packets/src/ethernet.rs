use crate::{MacAddr, ParseError};
use std::convert::TryFrom;

/// Length of an Ethernet II header.
pub const ETHERNET_HEADER_LEN: usize = 14;

/// An Ethernet II frame, owned field by field. Built fresh for outbound
/// frames or parsed out of a receive buffer; immutable once constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EthernetFrame {
    pub dest_mac: MacAddr,
    pub src_mac: MacAddr,
    pub ether_type: u16,
    pub payload: Vec<u8>,
}

impl EthernetFrame {
    pub fn new(dest_mac: MacAddr, src_mac: MacAddr, ether_type: u16, payload: Vec<u8>) -> Self {
        EthernetFrame {
            dest_mac,
            src_mac,
            ether_type,
            payload,
        }
    }

    /// Parses a frame from a raw buffer.
    ///
    /// Ethernet II frames must be at least the header, which is 14 bytes
    /// 0                    6                    12                     14
    /// |---6 byte Dest_MAC--|---6 byte Src_MAC---|--2 Byte EtherType--|
    ///
    /// Hardware addresses and the EtherType value are not validated here;
    /// unrecognized EtherTypes pass through for the caller to reject.
    pub fn from_buffer(buf: &[u8]) -> Result<EthernetFrame, ParseError> {
        if buf.len() < ETHERNET_HEADER_LEN {
            return Err(ParseError::Truncated {
                expected: ETHERNET_HEADER_LEN,
                actual: buf.len(),
            });
        }

        Ok(EthernetFrame {
            dest_mac: MacAddr::new(<[u8; 6]>::try_from(&buf[0..6]).unwrap()),
            src_mac: MacAddr::new(<[u8; 6]>::try_from(&buf[6..12]).unwrap()),
            ether_type: u16::from_be_bytes([buf[12], buf[13]]),
            payload: buf[ETHERNET_HEADER_LEN..].to_vec(),
        })
    }

    /// Serializes the frame: 14-byte header (EtherType big-endian) followed
    /// by the payload verbatim. The payload length is not checked against
    /// any MTU; oversized frames are the caller's problem.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(ETHERNET_HEADER_LEN + self.payload.len());
        bytes.extend_from_slice(&self.dest_mac.bytes);
        bytes.extend_from_slice(&self.src_mac.bytes);
        bytes.extend_from_slice(&self.ether_type.to_be_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes
    }
}
