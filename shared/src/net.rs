//! Local address discovery.

use std::net::UdpSocket;

/// Best-effort discovery of this machine's outbound IP address.
///
/// Connecting a UDP socket sends no packets; it only asks the OS which
/// source address it would route from. Returns `None` when the host has no
/// route at all.
pub fn local_ip() -> Option<String> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("10.255.255.255:1").ok()?;
    let addr = socket.local_addr().ok()?;
    Some(addr.ip().to_string())
}
