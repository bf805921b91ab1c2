//! Non-blocking UDP endpoint

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};

use ledmap_core::DatagramSocket;

use crate::error::{IoError, Result};

/// A UDP socket bound on all interfaces in non-blocking mode
#[derive(Debug)]
pub struct UdpEndpoint {
    socket: UdpSocket,
}

impl UdpEndpoint {
    /// Bind `0.0.0.0:port`; `broadcast` enables sending to broadcast addresses
    pub fn bind(port: u16, broadcast: bool) -> Result<Self> {
        let addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
        let socket = UdpSocket::bind(addr).map_err(|source| IoError::Bind { port, source })?;
        socket.set_nonblocking(true)?;
        socket.set_broadcast(broadcast)?;
        tracing::info!("Listening on UDP {}", addr);
        Ok(Self { socket })
    }
}

impl DatagramSocket for UdpEndpoint {
    fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<Option<(usize, SocketAddr)>> {
        match self.socket.recv_from(buf) {
            Ok(received) => Ok(Some(received)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn send_to(&mut self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(buf, target)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}
