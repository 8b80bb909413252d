//! Host/port encoding used by PASV replies and PORT arguments.
//!
//! The wire form is six decimals `h1,h2,h3,h4,p1,p2` where the port is
//! `p1 * 256 + p2`.

use filehop_core::{XferError, XferResult};
use lazy_static::lazy_static;
use regex::Regex;
use std::net::{Ipv4Addr, SocketAddrV4};

lazy_static! {
    static ref HOST_PORT: Regex =
        Regex::new(r"(\d+),(\d+),(\d+),(\d+),(\d+),(\d+)").expect("host-port grammar");
}

/// Join the two port bytes of a PASV/PORT tuple.
pub fn decimals_to_port(hi: u8, lo: u8) -> u16 {
    (u16::from(hi) << 8) | u16::from(lo)
}

/// Split a port into its two wire bytes.
///
/// The port's hex form decides the split: up to two digits is all low
/// byte, three digits give one digit to the high byte, four split evenly.
/// Anything wider cannot be expressed and is a codec error.
pub fn port_to_bytes(port: u32) -> XferResult<(u8, u8)> {
    let hex = format!("{:x}", port);
    let (hi, lo) = match hex.len() {
        1 | 2 => ("0", hex.as_str()),
        3 => hex.split_at(1),
        4 => hex.split_at(2),
        n => {
            return Err(XferError::codec(format!(
                "port {} needs {} hex digits, at most 4 fit in two bytes",
                port, n
            )))
        }
    };
    let byte = |s: &str| {
        u8::from_str_radix(s, 16).map_err(|e| XferError::codec(format!("port byte '{}': {}", s, e)))
    };
    Ok((byte(hi)?, byte(lo)?))
}

/// Extract the data endpoint from a `227 Entering Passive Mode (...)` text.
pub fn parse_pasv_reply(text: &str) -> XferResult<SocketAddrV4> {
    let caps = HOST_PORT
        .captures(text)
        .ok_or_else(|| XferError::parse(format!("no host-port tuple in PASV reply: '{}'", text)))?;

    let mut n = [0u8; 6];
    for (i, slot) in n.iter_mut().enumerate() {
        let raw = &caps[i + 1];
        *slot = raw
            .parse::<u8>()
            .map_err(|_| XferError::parse(format!("PASV field '{}' is not a byte", raw)))?;
    }

    let ip = Ipv4Addr::new(n[0], n[1], n[2], n[3]);
    Ok(SocketAddrV4::new(ip, decimals_to_port(n[4], n[5])))
}

/// Build the `a,b,c,d,hi,lo` argument of PORT.
pub fn format_port_argument(ip: Ipv4Addr, port: u16) -> XferResult<String> {
    let (hi, lo) = port_to_bytes(u32::from(port))?;
    let o = ip.octets();
    Ok(format!("{},{},{},{},{},{}", o[0], o[1], o[2], o[3], hi, lo))
}
