//! Sector address map
//!
//! Each directory entry carries a 195-byte bitmap with one bit per sector in
//! the data area, starting at track 4 sector 1. Bits are little-endian within
//! each byte, so bit 0 of byte 0 is the first data sector.

use bit_vec::BitVec;
use std::ops::{BitOr, BitOrAssign};

use crate::format::constants::{DEFAULT_DIR_TRACKS, SECTOR_MAP_BITS, SECTOR_MAP_BYTES, SIDE1_FLAG, TRACKS_PER_SIDE};

/// Allocation bitmap over the data area
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorMap {
    bits: BitVec,
}

impl SectorMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            bits: BitVec::from_elem(SECTOR_MAP_BITS, false),
        }
    }

    /// Decode a map from directory entry bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let bits = BitVec::from_fn(SECTOR_MAP_BITS, |i| {
            bytes.get(i / 8).map_or(false, |b| b & (1 << (i % 8)) != 0)
        });
        Self { bits }
    }

    /// Encode the map as 195 directory entry bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; SECTOR_MAP_BYTES];
        for (i, set) in self.bits.iter().enumerate() {
            if set {
                bytes[i / 8] |= 1 << (i % 8);
            }
        }
        bytes
    }

    /// Map of `sectors` consecutive data sectors from a start location
    ///
    /// Slots past the end of the map are not representable and are dropped.
    pub fn contiguous(sectors: usize, start_track: u8, start_sector: u8, spt: u8) -> Self {
        let mut map = Self::new();
        if sectors == 0 {
            return map;
        }

        let start = slot_index(start_track, start_sector, spt);
        for slot in start..start.saturating_add(sectors).min(SECTOR_MAP_BITS) {
            map.bits.set(slot, true);
        }
        map
    }

    /// Number of sectors marked as used
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&b| b).count()
    }

    /// Check whether a data area slot is marked as used
    pub fn is_set(&self, slot: usize) -> bool {
        self.bits.get(slot).unwrap_or(false)
    }

    /// Mark a data area slot as used
    pub fn set(&mut self, slot: usize) {
        if slot < SECTOR_MAP_BITS {
            self.bits.set(slot, true);
        }
    }

    /// Check whether no sectors are marked
    pub fn is_empty(&self) -> bool {
        self.bits.none()
    }

    /// Check whether any slot is marked in both maps
    pub fn overlaps(&self, other: &SectorMap) -> bool {
        self.bits.iter().zip(other.bits.iter()).any(|(a, b)| a && b)
    }

    /// Iterate over used slot indexes
    pub fn slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter().enumerate().filter(|(_, b)| *b).map(|(i, _)| i)
    }
}

impl Default for SectorMap {
    fn default() -> Self {
        Self::new()
    }
}

impl BitOrAssign<&SectorMap> for SectorMap {
    fn bitor_assign(&mut self, rhs: &SectorMap) {
        self.bits.or(&rhs.bits);
    }
}

impl BitOr for SectorMap {
    type Output = SectorMap;

    fn bitor(mut self, rhs: SectorMap) -> SectorMap {
        self |= &rhs;
        self
    }
}

/// Zero-based data area slot of a track/sector location
///
/// Side 1 tracks continue directly after track 79 of side 0.
pub fn slot_index(track: u8, sector: u8, spt: u8) -> usize {
    let cylinder = if track & SIDE1_FLAG != 0 {
        (track & !SIDE1_FLAG) as usize + TRACKS_PER_SIDE as usize
    } else {
        track as usize
    };
    cylinder.saturating_sub(DEFAULT_DIR_TRACKS as usize) * spt as usize
        + (sector as usize).saturating_sub(1)
}
