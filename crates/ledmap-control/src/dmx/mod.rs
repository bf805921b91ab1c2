//! DMX input over Art-Net
//!
//! ## Art-Net
//!
//! Art-Net is a UDP broadcast protocol for DMX transmission over Ethernet.
//! - Listens on UDP port 6454
//! - Answers OpPoll with one OpPollReply per advertised universe
//! - Accepts OpDmx carrying 1 to 512 channel bytes
//!
//! ## Example Usage
//!
//! ```rust
//! use ledmap_control::dmx::{artnet, ArtNetPacket};
//!
//! let packet = artnet::build_dmx_packet(3, 0, &[255, 0, 0]);
//! match artnet::parse(&packet) {
//!     Ok(Some(ArtNetPacket::Dmx { universe, data, .. })) => {
//!         assert_eq!(universe, 3);
//!         assert_eq!(&data[..3], &[255, 0, 0]);
//!     }
//!     _ => unreachable!(),
//! }
//! ```

pub mod artnet;

pub use artnet::{build_dmx_packet, build_poll_reply, parse, ArtNetPacket, NodeInfo};
