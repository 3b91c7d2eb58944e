use failure::Fail;
use std::io;
use std::time::Duration;

/// Ways a resolution attempt can fail. Nothing here is retried or recovered
/// locally; every variant propagates to process exit with its own message.
#[derive(Debug, Fail)]
pub enum ResolveError {
    /// The target address is not an IPv4 literal. Raised before any socket
    /// activity.
    #[fail(display = "target address family is not IPv4 (IPv6 is unsupported)")]
    UnsupportedAddressFamily,

    /// The named interface does not exist, cannot be queried, or carries no
    /// IPv4 address.
    #[fail(display = "failed to resolve interface {}: {}", name, cause)]
    Interface {
        name: String,
        #[fail(cause)]
        cause: io::Error,
    },

    /// Socket creation, configuration, send or receive failed at the OS
    /// boundary.
    #[fail(display = "socket error: {}", _0)]
    Socket(#[fail(cause)] io::Error),

    /// No matching reply was observed within the configured duration.
    /// Distinct from socket and parse failures.
    #[fail(display = "no reply within {:?}", _0)]
    Timeout(Duration),
}
