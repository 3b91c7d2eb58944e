use failure::Fail;
use std::fmt;

/// EtherType carried by frames that encapsulate ARP packets.
pub const ARP_ETHER_TYPE: u16 = 0x0806;
/// EtherType carried by frames that encapsulate IPv4 packets. ARP reuses
/// this value as its protocol type when resolving IPv4 addresses.
pub const IPV4_ETHER_TYPE: u16 = 0x0800;

/// A 6-byte link-layer hardware address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MacAddr {
    pub bytes: [u8; 6],
}

impl MacAddr {
    /// The all-ones broadcast address, FF:FF:FF:FF:FF:FF.
    pub const BROADCAST: MacAddr = MacAddr { bytes: [0xff; 6] };

    pub fn new(bytes: [u8; 6]) -> MacAddr {
        MacAddr { bytes }
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3], self.bytes[4], self.bytes[5]
        )
    }
}

/// Error returned when a byte buffer cannot be decoded as a wire structure.
#[derive(Clone, Debug, Fail, PartialEq, Eq)]
pub enum ParseError {
    /// The buffer is shorter than the format's fixed minimum. Short buffers
    /// are never padded out; the decode fails as a whole.
    #[fail(display = "buffer too short: need at least {} bytes, got {}", expected, actual)]
    Truncated { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_addr_displays_as_colon_hex() {
        let mac = MacAddr::new([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
        assert_eq!(mac.to_string(), "11:22:33:44:55:66");
        assert_eq!(MacAddr::BROADCAST.to_string(), "ff:ff:ff:ff:ff:ff");
    }

    #[test]
    fn parse_error_names_both_lengths() {
        let err = ParseError::Truncated {
            expected: 14,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "buffer too short: need at least 14 bytes, got 3"
        );
    }
}
