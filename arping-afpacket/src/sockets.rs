#![deny(missing_docs)]

use crate::linux;
use libc;
use std::{
    ffi::CStr,
    io,
    mem::{self, MaybeUninit},
    net::Ipv4Addr,
    ptr,
};

/// Represents the link-local address a frame was received from.
/// At this time, it's not particularly useful.
pub struct Addr {
    _inner: libc::sockaddr_storage,
    _len: libc::socklen_t,
}

/// Represents an unbound `AF_PACKET` socket, created for a specific
/// link-layer protocol. At this phase of a socket's lifecycle, it can be
/// configured.
pub struct Socket {
    fd: libc::c_int,
    protocol: u16,
}

/// Represents a bound `AF_PACKET` socket. At this phase of a socket's
/// lifecycle, it can be read from and written to, and the interface it is
/// bound to can be queried.
pub struct BoundSocket {
    fd: libc::c_int,
    if_index: libc::c_int,
    if_name: [libc::c_char; libc::IFNAMSIZ],
    hw_addr: [u8; 6],
    send_addr: libc::sockaddr_ll,
}

impl Socket {
    /// Creates a new unbound socket that carries frames of the given
    /// link-layer protocol (an `ETH_P_*` value in host byte order, e.g.
    /// 0x0806 for ARP). The kernel only delivers frames of that protocol.
    pub fn new(protocol: u16) -> io::Result<Self> {
        // This block must be marked as unsafe because it uses FFI with C code. We believe the code
        // in this block to be safe because it does not interact with any memory owned by Rust
        // code, nor does it violate the invariant of the Socket type -- namely, that it return an
        // Err if it fails to initialize.
        let fd = unsafe {
            // Resources:
            // https://beej.us/guide/bgnet/html/multi/syscalls.html#socket
            // man 7 packet
            let fd = libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW,
                libc::c_int::from(protocol.to_be()),
            );
            if fd < 0 {
                return Err(io::Error::last_os_error());
            }
            fd
        };
        Ok(Self { fd, protocol })
    }

    /// Binds the socket to a network interface, resolving the interface
    /// index and hardware address along the way. An error here means the
    /// named interface does not exist or cannot be queried. This function
    /// consumes the `Socket` instance, as no more configuration options may
    /// be safely changed.
    pub fn bind(self, iface: impl AsRef<CStr>) -> io::Result<BoundSocket> {
        let name = iface.as_ref().to_bytes_with_nul();
        if name.len() > libc::IFNAMSIZ {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "interface name is longer than IFNAMSIZ",
            ));
        }

        // This block is marked as unsafe because it uses FFI, however, we believe it to be safe
        // because 1) it handles FFI failures in accordance with the bound API's conventions, and
        // 2) it safely borrows the &CStr passed in.
        let (if_index, if_name, hw_addr) = unsafe {
            let mut ifr: linux::ifreq = MaybeUninit::zeroed().assume_init();
            ptr::copy_nonoverlapping(
                name.as_ptr() as *const libc::c_char,
                ifr.ifr_ifrn.ifrn_name.as_mut_ptr(),
                name.len(),
            );
            let if_name = ifr.ifr_ifrn.ifrn_name;

            // ioctl(SIOCGIFINDEX) fills in the index field of the ifreq object
            // Resources:
            // man 7 netdevice
            let err = libc::ioctl(self.fd, linux::SIOCGIFINDEX, &mut ifr);
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
            let if_index = ifr.ifr_ifru.ifru_ivalue; // expanded from `ifr_ifindex` in kernel headers

            // ioctl(SIOCGIFHWADDR) fills in the hardware address
            let err = libc::ioctl(self.fd, linux::SIOCGIFHWADDR, &mut ifr);
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
            let mut hw_addr = [0u8; 6];
            for (dst, src) in hw_addr
                .iter_mut()
                .zip(ifr.ifr_ifru.ifru_hwaddr.sa_data[..6].iter())
            {
                *dst = *src as u8;
            }

            (if_index, if_name, hw_addr)
        };

        // This block is marked as unsafe because it uses FFI; the sockaddr_ll
        // is zeroed and fully owned by this stack frame.
        unsafe {
            let mut ll: libc::sockaddr_ll = MaybeUninit::zeroed().assume_init();
            ll.sll_family = libc::AF_PACKET as libc::c_ushort;
            ll.sll_protocol = self.protocol.to_be();
            ll.sll_ifindex = if_index;
            // Resources:
            // https://beej.us/guide/bgnet/html/multi/syscalls.html#bind
            // man 7 packet regarding sockaddr_ll
            let err = libc::bind(
                self.fd,
                &mut ll as *mut _ as *mut libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::c_uint,
            );
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
        }

        // Outbound frames go to the link-layer broadcast address on the
        // bound interface.
        let send_addr = unsafe {
            let mut ll: libc::sockaddr_ll = MaybeUninit::zeroed().assume_init();
            ll.sll_family = libc::AF_PACKET as libc::c_ushort;
            ll.sll_protocol = self.protocol.to_be();
            ll.sll_ifindex = if_index;
            ll.sll_hatype = libc::ARPHRD_ETHER;
            ll.sll_pkttype = linux::PACKET_BROADCAST;
            ll.sll_halen = 6;
            ll.sll_addr = [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0, 0];
            ll
        };

        let fd = self.fd;
        // This ensures that `self` does not attempt to close the file descriptor, as the file
        // descriptor is transferred to the BoundSocket we're returning. This doesn't cause any
        // resource leaks since the stack-bound `self` is consumed and deallocated in
        // `mem::forget`.
        mem::forget(self);
        Ok(BoundSocket {
            fd,
            if_index,
            if_name,
            hw_addr,
            send_addr,
        })
    }

    /// Configures the socket's non-blocking status.
    pub fn set_nonblocking(&mut self, nonblocking: bool) -> io::Result<()> {
        // This block is marked as unsafe because it uses FFI, however, we assume this code to be
        // safe because we handle fcntl's failures properly. Additionally, we do not borrow any
        // Rust-owned memory.
        // Resources used to write syscall code:
        // https://beej.us/guide/bgnet/html/multi/advanced.html#blocking
        // man 2 fcntl
        unsafe {
            let flags = libc::fcntl(self.fd, libc::F_GETFL);
            if flags < 0 {
                return Err(io::Error::last_os_error());
            }
            let new_flags = if nonblocking {
                flags | libc::O_NONBLOCK
            } else {
                flags & (!libc::O_NONBLOCK)
            };
            let err = libc::fcntl(self.fd, libc::F_SETFL, new_flags);
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }

    /// Returns true if the socket is configured not to block, false otherwise.
    pub fn is_nonblocking(&self) -> io::Result<bool> {
        // See comments on block above (in set_nonblocking).
        let flags = unsafe {
            let flags = libc::fcntl(self.fd, libc::F_GETFL);
            if flags < 0 {
                return Err(io::Error::last_os_error());
            }
            flags
        };
        Ok(flags & libc::O_NONBLOCK == libc::O_NONBLOCK)
    }
}

impl BoundSocket {
    /// Sends a frame to the NIC, addressed to the link-layer broadcast
    /// address on the bound interface.
    pub fn send(&mut self, frame: &[u8]) -> io::Result<usize> {
        // This block is marked as unsafe because it uses FFI. We believe this code to be safe,
        // because it safely borrows the Rust-owned frame and passes the length of the frame to the
        // libc function, so it should not exhibit any C-side undefined behaviour.
        unsafe {
            // Resources:
            // https://beej.us/guide/bgnet/html/multi/syscalls.html#sendtorecv
            let bytes = libc::sendto(
                self.fd,
                frame.as_ptr() as *const _,
                frame.len(),
                0,
                &self.send_addr as *const _ as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            );
            if bytes < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok(bytes as usize)
            }
        }
    }

    /// Receives a frame from the NIC.
    pub fn recv(&mut self, frame: &mut [u8]) -> io::Result<(usize, Addr)> {
        // Note comment in `send` call.
        unsafe {
            let mut storage = MaybeUninit::<libc::sockaddr_storage>::zeroed();
            let mut addrlen = mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

            // Resources:
            // https://beej.us/guide/bgnet/html/multi/syscalls.html#sendtorecv
            let bytes = libc::recvfrom(
                self.fd,
                frame.as_mut_ptr() as *mut _,
                frame.len(),
                0,
                storage.as_mut_ptr() as *mut _,
                &mut addrlen,
            );
            if bytes < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok((
                    bytes as usize,
                    Addr {
                        _inner: storage.assume_init(),
                        _len: addrlen,
                    },
                ))
            }
        }
    }

    /// Returns the hardware address of the bound interface.
    pub fn hw_addr(&self) -> [u8; 6] {
        self.hw_addr
    }

    /// Returns the index of the bound interface.
    pub fn if_index(&self) -> libc::c_int {
        self.if_index
    }

    /// Queries the IPv4 address configured on the bound interface via
    /// `ioctl(SIOCGIFADDR)`. Fails if the interface carries none.
    pub fn local_ipv4(&self) -> io::Result<Ipv4Addr> {
        // This block is marked as unsafe because it uses FFI; the ifreq is
        // zeroed and owned by this stack frame, and the kernel writes at
        // most a sockaddr into its union.
        unsafe {
            let mut ifr: linux::ifreq = MaybeUninit::zeroed().assume_init();
            ifr.ifr_ifrn.ifrn_name = self.if_name;
            let err = libc::ioctl(self.fd, linux::SIOCGIFADDR, &mut ifr);
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
            let addr = *(&ifr.ifr_ifru.ifru_addr as *const libc::sockaddr
                as *const libc::sockaddr_in);
            Ok(Ipv4Addr::from(u32::from_be(addr.sin_addr.s_addr)))
        }
    }

    /// Turns promiscuous mode on or off on this NIC. Useful for receiving
    /// all packets on an interface, including those not addressed to the
    /// device.
    pub fn set_promiscuous(&mut self, enable: bool) -> io::Result<()> {
        // This block is marked as unsafe because it uses FFI; the
        // packet_mreq is zeroed and owned by this stack frame.
        // Resources:
        // man 7 packet regarding PACKET_ADD_MEMBERSHIP
        unsafe {
            let mut mreq: libc::packet_mreq = MaybeUninit::zeroed().assume_init();
            mreq.mr_ifindex = self.if_index;
            mreq.mr_type = libc::PACKET_MR_PROMISC as libc::c_ushort;
            let opt = if enable {
                libc::PACKET_ADD_MEMBERSHIP
            } else {
                libc::PACKET_DROP_MEMBERSHIP
            };
            let err = libc::setsockopt(
                self.fd,
                libc::SOL_PACKET,
                opt,
                &mreq as *const _ as *const libc::c_void,
                mem::size_of::<libc::packet_mreq>() as libc::socklen_t,
            );
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }
}

#[cfg(feature = "tokio-support")]
impl mio::event::Evented for BoundSocket {
    fn register(
        &self,
        poll: &mio::Poll,
        token: mio::Token,
        interest: mio::Ready,
        opts: mio::PollOpt,
    ) -> io::Result<()> {
        mio::unix::EventedFd(&self.fd).register(poll, token, interest, opts)
    }

    fn reregister(
        &self,
        poll: &mio::Poll,
        token: mio::Token,
        interest: mio::Ready,
        opts: mio::PollOpt,
    ) -> io::Result<()> {
        mio::unix::EventedFd(&self.fd).reregister(poll, token, interest, opts)
    }

    fn deregister(&self, poll: &mio::Poll) -> io::Result<()> {
        mio::unix::EventedFd(&self.fd).deregister(poll)
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

impl Drop for BoundSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
