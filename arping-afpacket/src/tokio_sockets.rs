use crate::sockets;
use futures::{
    ready,
    task::{Context, Poll},
    Future,
};
use mio::Ready;
use std::{ffi::CStr, io, net::Ipv4Addr, pin::Pin};
use tokio::io::PollEvented;

/// Represents a bound `AF_PACKET` socket for use with Tokio. Receives can be
/// raced against timers and simply dropped, instead of abandoning a thread
/// in a blocking call.
pub struct AsyncBoundSocket {
    sock: PollEvented<sockets::BoundSocket>,
}

impl AsyncBoundSocket {
    /// Registers an already-bound socket with the reactor. The socket must
    /// have been set non-blocking.
    pub fn new(sock: sockets::BoundSocket) -> io::Result<Self> {
        Ok(Self {
            sock: PollEvented::new(sock)?,
        })
    }

    /// Constructs an `AsyncBoundSocket` for the given link-layer protocol,
    /// bound to the named network interface.
    pub fn from_interface(iface: impl AsRef<CStr>, protocol: u16) -> io::Result<Self> {
        let mut sock = sockets::Socket::new(protocol)?;
        sock.set_nonblocking(true)?;
        let sock = sock.bind(iface)?;
        Self::new(sock)
    }

    /// Returns the hardware address of the bound interface.
    pub fn hw_addr(&self) -> [u8; 6] {
        self.sock.get_ref().hw_addr()
    }

    /// Returns the index of the bound interface.
    pub fn if_index(&self) -> i32 {
        self.sock.get_ref().if_index()
    }

    /// Queries the IPv4 address configured on the bound interface.
    pub fn local_ipv4(&self) -> io::Result<Ipv4Addr> {
        self.sock.get_ref().local_ipv4()
    }

    /// Turns promiscuous mode on or off on this NIC. Useful for receiving all
    /// packets on an interface, including those not addressed to the device.
    pub fn set_promiscuous(&mut self, p: bool) -> io::Result<()> {
        self.sock.get_mut().set_promiscuous(p)
    }

    /// Returns `Poll::Pending` until there is a packet available.
    pub fn poll_can_rx(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let ready = Ready::readable();
        ready!(self.sock.poll_read_ready(cx, ready))?;
        Poll::Ready(Ok(()))
    }

    /// Returns `Poll::Pending` until a packet can be sent.
    pub fn poll_can_tx(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        ready!(self.sock.poll_write_ready(cx))?;
        Poll::Ready(Ok(()))
    }

    /// Clears the "can transmit" state of the socket.
    pub fn clear_can_tx(&mut self, cx: &mut Context<'_>) -> io::Result<()> {
        self.sock.clear_write_ready(cx)
    }

    /// Clears the "can receive" state of the socket.
    pub fn clear_can_rx(&mut self, cx: &mut Context<'_>) -> io::Result<()> {
        let ready = Ready::readable();
        self.sock.clear_read_ready(cx, ready)
    }

    /// Sends a frame to the socket asynchronously.
    /// Returns `Poll::Pending` if the socket cannot be sent to.
    pub fn poll_send(&mut self, cx: &mut Context<'_>, frame: &[u8]) -> Poll<io::Result<usize>> {
        ready!(self.poll_can_tx(cx))?;
        match self.sock.get_mut().send(frame) {
            Ok(count) => Poll::Ready(Ok(count)),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                self.clear_can_tx(cx)?;
                Poll::Pending
            }
            Err(e) => Poll::Ready(Err(e)),
        }
    }

    /// Receives a frame from the socket asynchronously.
    /// Returns `Poll::Pending` if the socket cannot be read from.
    pub fn poll_recv(
        &mut self,
        cx: &mut Context<'_>,
        frame: &mut [u8],
    ) -> Poll<io::Result<(usize, sockets::Addr)>> {
        ready!(self.poll_can_rx(cx))?;
        match self.sock.get_mut().recv(frame) {
            Ok(x) => {
                self.clear_can_rx(cx)?;
                Poll::Ready(Ok(x))
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                self.clear_can_rx(cx)?;
                Poll::Pending
            }
            Err(e) => Poll::Ready(Err(e)),
        }
    }

    /// Returns a `Future` that calls [`poll_send`](), enabling use of async/await.
    pub fn send<'a>(&'a mut self, frame: &'a [u8]) -> impl Future<Output = io::Result<usize>> + 'a {
        SendFuture { sock: self, frame }
    }

    /// Returns a `Future` that calls [`poll_recv`](), enabling use of async/await.
    pub fn recv<'a>(
        &'a mut self,
        frame: &'a mut [u8],
    ) -> impl Future<Output = io::Result<(usize, sockets::Addr)>> + 'a {
        RecvFuture { sock: self, frame }
    }
}

struct SendFuture<'a> {
    sock: &'a mut AsyncBoundSocket,
    frame: &'a [u8],
}

impl Unpin for SendFuture<'_> {}

impl Future for SendFuture<'_> {
    type Output = io::Result<usize>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let me = self.get_mut();
        let sock = &mut me.sock;
        let frame = &me.frame;
        sock.poll_send(cx, &frame)
    }
}

struct RecvFuture<'a> {
    sock: &'a mut AsyncBoundSocket,
    frame: &'a mut [u8],
}

impl Unpin for RecvFuture<'_> {}

impl Future for RecvFuture<'_> {
    type Output = io::Result<(usize, sockets::Addr)>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let me = self.get_mut();
        let sock = &mut me.sock;
        let mut frame = &mut me.frame;
        sock.poll_recv(cx, &mut frame)
    }
}
