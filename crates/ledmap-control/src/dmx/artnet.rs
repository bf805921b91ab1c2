//! Art-Net protocol implementation (Poll, PollReply, Dmx)
//!
//! Art-Net is a UDP-based protocol for transmitting DMX512 over Ethernet.
//! Only node discovery and OpDmx are handled; addressing, merge and sync
//! extensions are not.

use std::net::Ipv4Addr;

use ledmap_core::DMX_UNIVERSE_SIZE;

use crate::error::ControlError;

/// Packet identifier, NUL terminated
pub const ARTNET_ID: &[u8; 8] = b"Art-Net\0";
/// OpPoll
pub const OP_POLL: u16 = 0x2000;
/// OpPollReply
pub const OP_POLL_REPLY: u16 = 0x2100;
/// OpDmx
pub const OP_DMX: u16 = 0x5000;
/// Protocol revision sent in outbound packets
pub const PROTOCOL_VERSION: u16 = 14;
/// Size of an OpPoll packet; anything shorter is ignored
pub const POLL_SIZE: usize = 14;
/// OpDmx header size in front of the channel data
pub const DMX_HEADER_SIZE: usize = 18;
/// Largest packet the input side needs to receive
pub const DMX_PACKET_SIZE: usize = DMX_HEADER_SIZE + DMX_UNIVERSE_SIZE;
/// Size of an OpPollReply packet
pub const POLL_REPLY_SIZE: usize = 239;
/// OEM code advertised in PollReply
pub const OEM_CODE: u16 = 0x9999;
/// Default node short name
pub const SHORT_NAME: &str = "Ledmap";

const SHORT_NAME_LEN: usize = 18;
const LONG_NAME_LEN: usize = 64;

/// A decoded inbound Art-Net packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtNetPacket<'a> {
    /// Discovery request
    Poll,
    /// One universe of channel data
    Dmx {
        /// 15-bit port address (`Net << 8 | SubUni`)
        universe: u16,
        /// Sequence number (0 = disabled)
        sequence: u8,
        /// Received channel data, 1 to 512 bytes
        data: &'a [u8],
    },
}

/// Decode a received datagram.
///
/// Returns `Ok(None)` for anything that is not an Art-Net Poll or Dmx packet:
/// short packets, a wrong identifier and every other opcode. A Dmx packet
/// whose data size falls outside `(0, 512]` is an error naming the universe.
pub fn parse(packet: &[u8]) -> Result<Option<ArtNetPacket<'_>>, ControlError> {
    if packet.len() < POLL_SIZE || packet[..7] != ARTNET_ID[..7] {
        return Ok(None);
    }

    match u16::from_le_bytes([packet[8], packet[9]]) {
        OP_POLL => Ok(Some(ArtNetPacket::Poll)),
        OP_DMX => {
            // SubUni at 14, Net at 15
            let sub_uni = packet.get(14).copied().unwrap_or(0);
            let net = packet.get(15).copied().unwrap_or(0);
            let universe = (u16::from(net) << 8) + u16::from(sub_uni);

            let size = packet.len() as isize - DMX_HEADER_SIZE as isize;
            if size <= 0 || size > DMX_UNIVERSE_SIZE as isize {
                return Err(ControlError::DmxSize { universe, size });
            }

            Ok(Some(ArtNetPacket::Dmx {
                universe,
                sequence: packet[12],
                data: &packet[DMX_HEADER_SIZE..],
            }))
        }
        _ => Ok(None),
    }
}

/// Identity advertised in PollReply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    /// Host IPv4 address
    pub ip: Ipv4Addr,
    /// Host MAC address
    pub mac: [u8; 6],
    /// Short name (17 characters max)
    pub short_name: String,
    /// Long name (63 characters max)
    pub long_name: String,
}

impl NodeInfo {
    /// Create node info; an empty `long_name` falls back to the short name
    pub fn new(ip: Ipv4Addr, mac: [u8; 6], long_name: &str) -> Self {
        let long_name = if long_name.is_empty() {
            SHORT_NAME
        } else {
            long_name
        };
        Self {
            ip,
            mac,
            short_name: SHORT_NAME.to_string(),
            long_name: long_name.to_string(),
        }
    }
}

/// Build an Art-Net PollReply advertising one output universe.
///
/// `bind_index` is the zero based position of the universe among those
/// advertised; the packet carries `1 + bind_index`.
pub fn build_poll_reply(node: &NodeInfo, universe: u16, bind_index: u8) -> [u8; POLL_REPLY_SIZE] {
    let mut packet = [0u8; POLL_REPLY_SIZE];

    // Header: "Art-Net\0"
    packet[0..8].copy_from_slice(ARTNET_ID);

    // OpCode: OpPollReply (0x2100)
    packet[8..10].copy_from_slice(&OP_POLL_REPLY.to_le_bytes());

    // Node address and port
    packet[10..14].copy_from_slice(&node.ip.octets());
    packet[14..16].copy_from_slice(&ledmap_core::config::ARTNET_PORT.to_le_bytes());

    // Firmware version 16..18 left at zero

    // Port-Address switches
    packet[18] = (universe >> 8) as u8;
    packet[19] = ((universe >> 4) & 0x0F) as u8;

    // OEM
    packet[20] = (OEM_CODE >> 8) as u8;
    packet[21] = (OEM_CODE & 0xFF) as u8;

    // ESTA manufacturer, low byte first
    packet[24] = b'M';
    packet[25] = b'L';

    write_name(&mut packet[26..26 + SHORT_NAME_LEN], &node.short_name);
    write_name(&mut packet[44..44 + LONG_NAME_LEN], &node.long_name);
    // NodeReport 108..172 empty

    // One output port
    packet[173] = 1;
    packet[174] = 0x80;
    // Data transmitted, merge disabled
    packet[182] = 0x80 | 0x02;
    packet[190] = (universe & 0x0F) as u8;

    packet[201..207].copy_from_slice(&node.mac);
    packet[207..211].copy_from_slice(&node.ip.octets());
    packet[211] = bind_index.wrapping_add(1);
    // Web configuration, DHCP capable, 15-bit port addresses
    packet[212] = 0x0D;

    packet
}

/// Copy a name into a fixed field, always leaving a terminating NUL
fn write_name(field: &mut [u8], name: &str) {
    let len = name.len().min(field.len() - 1);
    field[..len].copy_from_slice(&name.as_bytes()[..len]);
}

/// Build an Art-Net DMX packet (OpDmx).
///
/// `data` is zero padded (or truncated) to a full 512 byte universe.
pub fn build_dmx_packet(universe: u16, sequence: u8, data: &[u8]) -> Vec<u8> {
    let mut packet = vec![0u8; DMX_PACKET_SIZE];

    packet[0..8].copy_from_slice(ARTNET_ID);
    packet[8..10].copy_from_slice(&OP_DMX.to_le_bytes());

    // Protocol version, big-endian
    packet[10..12].copy_from_slice(&PROTOCOL_VERSION.to_be_bytes());

    packet[12] = sequence;
    packet[13] = 0;

    // SubUni, Net
    packet[14..16].copy_from_slice(&universe.to_le_bytes());

    // Length, big-endian
    packet[16..18].copy_from_slice(&(DMX_UNIVERSE_SIZE as u16).to_be_bytes());

    let len = data.len().min(DMX_UNIVERSE_SIZE);
    packet[DMX_HEADER_SIZE..DMX_HEADER_SIZE + len].copy_from_slice(&data[..len]);

    packet
}

/// Build an Art-Net Poll packet
pub fn build_poll_packet() -> [u8; POLL_SIZE] {
    let mut packet = [0u8; POLL_SIZE];
    packet[0..8].copy_from_slice(ARTNET_ID);
    packet[8..10].copy_from_slice(&OP_POLL.to_le_bytes());
    packet[10..12].copy_from_slice(&PROTOCOL_VERSION.to_be_bytes());
    packet
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> NodeInfo {
        NodeInfo::new(
            Ipv4Addr::new(192, 168, 1, 40),
            [0xB8, 0x27, 0xEB, 0x01, 0x02, 0x03],
            "",
        )
    }

    #[test]
    fn test_dmx_packet_structure() {
        let packet = build_dmx_packet(0x0123, 7, &[1, 2, 3]);

        assert_eq!(&packet[0..8], b"Art-Net\0");
        assert_eq!(packet[8], 0x00);
        assert_eq!(packet[9], 0x50);
        assert_eq!(packet[10], 0);
        assert_eq!(packet[11], 14);
        assert_eq!(packet[12], 7);
        assert_eq!(packet[14], 0x23);
        assert_eq!(packet[15], 0x01);
        assert_eq!(packet[16], 0x02);
        assert_eq!(packet[17], 0x00);
        assert_eq!(&packet[18..21], &[1, 2, 3]);
        assert_eq!(packet.len(), 18 + 512);
    }

    #[test]
    fn test_parse_dmx_roundtrip() {
        let packet = build_dmx_packet(0x0203, 9, &[0xAA; 512]);
        match parse(&packet).unwrap() {
            Some(ArtNetPacket::Dmx {
                universe,
                sequence,
                data,
            }) => {
                assert_eq!(universe, (2 << 8) + 3);
                assert_eq!(sequence, 9);
                assert_eq!(data.len(), 512);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_poll() {
        assert_eq!(parse(&build_poll_packet()).unwrap(), Some(ArtNetPacket::Poll));
    }

    #[test]
    fn test_parse_rejects_short_and_foreign() {
        let poll = build_poll_packet();
        assert_eq!(parse(&poll[..POLL_SIZE - 1]).unwrap(), None);

        let mut bad = poll;
        bad[3] = b'x';
        assert_eq!(parse(&bad).unwrap(), None);

        // 8th byte is not compared
        let mut no_nul = poll;
        no_nul[7] = b'!';
        assert_eq!(parse(&no_nul).unwrap(), Some(ArtNetPacket::Poll));
    }

    #[test]
    fn test_parse_ignores_other_opcodes() {
        let reply = build_poll_reply(&node(), 0, 0);
        assert_eq!(parse(&reply).unwrap(), None);

        let mut sync = build_poll_packet();
        sync[8..10].copy_from_slice(&0x5200u16.to_le_bytes());
        assert_eq!(parse(&sync).unwrap(), None);
    }

    #[test]
    fn test_dmx_size_boundaries() {
        let full = build_dmx_packet(4, 0, &[]);

        // 1 and 512 data bytes accepted
        for size in [1usize, 512] {
            let result = parse(&full[..DMX_HEADER_SIZE + size]).unwrap();
            assert!(matches!(result, Some(ArtNetPacket::Dmx { data, .. }) if data.len() == size));
        }

        // 0 data bytes rejected
        assert!(matches!(
            parse(&full[..DMX_HEADER_SIZE]),
            Err(ControlError::DmxSize {
                universe: 4,
                size: 0
            })
        ));

        // 513 data bytes rejected
        let mut long = full.clone();
        long.push(0);
        assert!(matches!(
            parse(&long),
            Err(ControlError::DmxSize { size: 513, .. })
        ));

        // Shorter than the header
        assert!(matches!(
            parse(&full[..16]),
            Err(ControlError::DmxSize { size: -2, .. })
        ));
    }

    #[test]
    fn test_poll_reply_layout() {
        let reply = build_poll_reply(&node(), 0x0123, 2);

        assert_eq!(reply.len(), 239);
        assert_eq!(&reply[0..8], b"Art-Net\0");
        assert_eq!(&reply[8..10], &[0x00, 0x21]);
        assert_eq!(&reply[10..14], &[192, 168, 1, 40]);
        assert_eq!(&reply[14..16], &[0x36, 0x19]);
        assert_eq!(reply[18], 0x01);
        assert_eq!(reply[19], 0x02);
        assert_eq!(&reply[20..22], &[0x99, 0x99]);
        assert_eq!(&reply[24..26], b"ML");
        assert_eq!(&reply[26..33], b"Ledmap\0");
        assert_eq!(&reply[44..51], b"Ledmap\0");
        assert_eq!(reply[173], 1);
        assert_eq!(reply[174], 0x80);
        assert_eq!(reply[182], 0x82);
        assert_eq!(reply[190], 0x03);
        assert_eq!(&reply[201..207], &[0xB8, 0x27, 0xEB, 0x01, 0x02, 0x03]);
        assert_eq!(&reply[207..211], &[192, 168, 1, 40]);
        assert_eq!(reply[211], 3);
        assert_eq!(reply[212], 0x0D);
        assert!(reply[213..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_poll_reply_long_name_truncated() {
        let node = NodeInfo::new(Ipv4Addr::LOCALHOST, [0; 6], &"x".repeat(100));
        let reply = build_poll_reply(&node, 0, 0);
        assert!(reply[44..107].iter().all(|&b| b == b'x'));
        assert_eq!(reply[107], 0);
    }
}
