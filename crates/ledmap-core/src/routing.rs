//! Universe to output channel routing
//!
//! A [`RoutingTable`] lists, per output channel, the universes whose pixels
//! land on that channel. The position of a universe within its channel's list
//! selects the pixel offset: position `p` starts at `p * PIXELS_PER_UNIVERSE`.

use serde::{Deserialize, Serialize};

use crate::frame::PIXELS_PER_UNIVERSE;

/// Where a universe's pixels land
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniverseRoute {
    /// Output channel index
    pub channel: usize,
    /// First pixel within the channel
    pub pixel_offset: usize,
}

/// Ordered per-channel universe lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingTable {
    channels: Vec<Vec<u16>>,
}

impl RoutingTable {
    /// Create a routing table from per-channel universe lists
    pub fn new(channels: Vec<Vec<u16>>) -> Self {
        let table = Self { channels };
        if let Some(universe) = table.first_duplicate() {
            tracing::warn!(
                "Universe {} is routed to more than one channel, first match wins",
                universe
            );
        }
        table
    }

    /// Spread `universes` over channels, `per_channel` universes each
    pub fn chunked(universes: &[u16], per_channel: usize) -> Self {
        let per_channel = per_channel.max(1);
        Self::new(universes.chunks(per_channel).map(<[u16]>::to_vec).collect())
    }

    /// Find the channel and pixel offset for a universe.
    ///
    /// Channels are scanned in table order and the first match wins.
    pub fn route(&self, universe: u16) -> Option<UniverseRoute> {
        self.channels
            .iter()
            .enumerate()
            .find_map(|(channel, universes)| {
                universes
                    .iter()
                    .position(|&u| u == universe)
                    .map(|position| UniverseRoute {
                        channel,
                        pixel_offset: position * PIXELS_PER_UNIVERSE,
                    })
            })
    }

    /// Universe list of one channel
    pub fn channel(&self, channel: usize) -> Option<&[u16]> {
        self.channels.get(channel).map(Vec::as_slice)
    }

    /// Number of channels in the table
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// All routed universes in table order
    pub fn universes(&self) -> impl Iterator<Item = u16> + '_ {
        self.channels.iter().flatten().copied()
    }

    /// Check if no universe is routed
    pub fn is_empty(&self) -> bool {
        self.channels.iter().all(Vec::is_empty)
    }

    fn first_duplicate(&self) -> Option<u16> {
        let mut seen = std::collections::HashSet::new();
        self.universes().find(|u| !seen.insert(*u))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_position_offset() {
        let table = RoutingTable::new(vec![vec![0, 1, 2], vec![10, 11]]);

        assert_eq!(
            table.route(0),
            Some(UniverseRoute {
                channel: 0,
                pixel_offset: 0
            })
        );
        assert_eq!(
            table.route(2),
            Some(UniverseRoute {
                channel: 0,
                pixel_offset: 340
            })
        );
        assert_eq!(
            table.route(11),
            Some(UniverseRoute {
                channel: 1,
                pixel_offset: 170
            })
        );
    }

    #[test]
    fn test_route_miss() {
        let table = RoutingTable::new(vec![vec![0, 1]]);
        assert_eq!(table.route(5), None);
        assert_eq!(RoutingTable::default().route(0), None);
    }

    #[test]
    fn test_duplicate_first_match_wins() {
        let table = RoutingTable::new(vec![vec![4], vec![7, 4]]);
        assert_eq!(table.route(4).map(|r| r.channel), Some(0));
    }

    #[test]
    fn test_chunked() {
        let universes: Vec<u16> = (0..12).collect();
        let table = RoutingTable::chunked(&universes, 6);
        assert_eq!(table.channel_count(), 2);
        assert_eq!(table.channel(1), Some(&[6, 7, 8, 9, 10, 11][..]));
        assert_eq!(table.route(7).map(|r| r.pixel_offset), Some(170));
    }

    #[test]
    fn test_is_empty() {
        assert!(RoutingTable::new(vec![vec![], vec![]]).is_empty());
        assert!(!RoutingTable::new(vec![vec![], vec![3]]).is_empty());
    }
}
