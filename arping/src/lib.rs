//! Single-shot ARP resolution over a raw `AF_PACKET` socket.
//!
//! Builds one ARP request for an IPv4 target, broadcasts it on a chosen
//! interface, and waits (bounded by a timeout) for the reply that names the
//! target's hardware address. The OS ARP cache is never consulted.

use std::net::IpAddr;
use std::time::Duration;

mod error;
pub use self::error::ResolveError;

mod resolve;
pub use self::resolve::resolve;

/// Settings for one resolution attempt. Constructed once from the command
/// line and passed by reference into [`resolve`]; nothing mutates it.
#[derive(Clone, Debug)]
pub struct Config {
    /// Interface to bind the socket to and to source the hardware address
    /// from.
    pub interface: String,
    /// Address to resolve. Only IPv4 targets are accepted.
    pub target: IpAddr,
    /// How long to wait for a reply before giving up.
    pub timeout: Duration,
}
