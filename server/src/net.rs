//! Best-effort discovery of the LAN-reachable address, for the startup log
//! line that tells the installation crew where to point the clients.

use std::net::{IpAddr, UdpSocket};

/// The source address the OS would route outbound traffic from. Connecting
/// a UDP socket sends no packets; it only selects a route.
pub fn local_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind(("0.0.0.0", 0)).ok()?;
    socket.connect(("192.0.2.1", 80)).ok()?;
    Some(socket.local_addr().ok()?.ip())
}
