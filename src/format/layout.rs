//! Sector offset calculations
//!
//! Every container presents the same 80 x 2 x spt logical 512-byte sectors.
//! A sector is addressed by track (bit 7 set for side 1) and a 1-based
//! sector number; these functions map that address to a byte offset.

use crate::error::{MgtError, Result};
use crate::format::constants::*;
use crate::format::ContainerKind;

/// Check a track/sector location against the disk geometry
pub fn check_location(track: u8, sector: u8, spt: u8) -> Result<()> {
    if (track & !SIDE1_FLAG) >= TRACKS_PER_SIDE || sector < 1 || sector > spt {
        return Err(MgtError::sector(track, sector));
    }
    Ok(())
}

#[inline]
fn cylinder(track: u8) -> usize {
    (track & !SIDE1_FLAG) as usize
}

#[inline]
fn side(track: u8) -> usize {
    (track >> 7) as usize
}

/// Offset in a raw MGT image, where both sides of a cylinder are adjacent
pub fn mgt_offset(spt: u8, track: u8, sector: u8) -> usize {
    let spt = spt as usize;
    (cylinder(track) * spt * 2 + side(track) * spt + (sector as usize - 1)) * SECTOR_SIZE
}

/// Offset in a SAD image, where all of side 0 precedes side 1
pub fn sad_offset(spt: u8, track: u8, sector: u8) -> usize {
    let spt = spt as usize;
    let track_index = side(track) * TRACKS_PER_SIDE as usize + cylinder(track);
    SAD_HEADER_SIZE + (track_index * spt + (sector as usize - 1)) * SECTOR_SIZE
}

/// Offset of a track's info block in an EDSK image
pub fn edsk_track_offset(spt: u8, track: u8) -> usize {
    let track_index = cylinder(track) * 2 + side(track);
    DISK_INFO_BLOCK_SIZE + track_index * ContainerKind::Edsk.track_size(spt)
}

/// Offset in an EDSK image, found by looking the sector up in the track's ID table
pub fn edsk_offset(data: &[u8], spt: u8, track: u8, sector: u8) -> Result<usize> {
    let track_offset = edsk_track_offset(spt, track);
    let ids_offset = track_offset + TRACK_INFO_SECTOR_LIST_OFFSET + SECTOR_INFO_ID_OFFSET;

    let index = (0..spt as usize)
        .find(|&i| data.get(ids_offset + i * SECTOR_INFO_SIZE) == Some(&sector))
        .ok_or_else(|| MgtError::sector(track, sector))?;

    Ok(track_offset + TRACK_INFO_BLOCK_SIZE + index * SECTOR_SIZE)
}

impl ContainerKind {
    /// Resolve a track/sector location to the offset of its 512 bytes in `data`
    pub fn sector_offset(&self, data: &[u8], spt: u8, track: u8, sector: u8) -> Result<usize> {
        check_location(track, sector, spt)?;

        let offset = match self {
            ContainerKind::Mgt => mgt_offset(spt, track, sector),
            ContainerKind::Sad => sad_offset(spt, track, sector),
            ContainerKind::Edsk => edsk_offset(data, spt, track, sector)?,
        };

        if offset + SECTOR_SIZE > data.len() {
            return Err(MgtError::sector(track, sector));
        }
        Ok(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_location() {
        assert!(check_location(0, 1, 10).is_ok());
        assert!(check_location(79, 10, 10).is_ok());
        assert!(check_location(128, 1, 10).is_ok());
        assert!(check_location(207, 10, 10).is_ok());
        assert!(check_location(0, 0, 10).is_err());
        assert!(check_location(0, 11, 10).is_err());
        assert!(check_location(0, 10, 9).is_err());
        assert!(check_location(80, 1, 10).is_err());
        assert!(check_location(208, 1, 10).is_err());
    }

    #[test]
    fn test_mgt_offsets() {
        assert_eq!(mgt_offset(10, 0, 1), 0);
        assert_eq!(mgt_offset(10, 0, 2), 512);
        assert_eq!(mgt_offset(10, 1, 1), 2 * 10 * 512);
        assert_eq!(mgt_offset(10, 79, 10), (79 * 2 * 10 + 9) * 512);
        assert_eq!(mgt_offset(10, 128, 1), 10 * 512);
        assert_eq!(mgt_offset(10, 207, 10), (80 * 2 * 10 - 1) * 512);
    }

    #[test]
    fn test_mgt_offsets_9spt() {
        assert_eq!(mgt_offset(9, 1, 1), 2 * 9 * 512);
        assert_eq!(mgt_offset(9, 79, 9), (79 * 2 * 9 + 8) * 512);
        assert_eq!(mgt_offset(9, 128, 1), 9 * 512);
        assert_eq!(mgt_offset(9, 207, 9), (80 * 2 * 9 - 1) * 512);
    }

    #[test]
    fn test_sad_offsets() {
        assert_eq!(sad_offset(10, 0, 1), 22);
        assert_eq!(sad_offset(10, 0, 2), 22 + 512);
        assert_eq!(sad_offset(10, 1, 1), 22 + 10 * 512);
        assert_eq!(sad_offset(10, 79, 10), 22 + (79 * 10 + 9) * 512);
        assert_eq!(sad_offset(10, 128, 1), 22 + 80 * 10 * 512);
        assert_eq!(sad_offset(10, 207, 10), 22 + ((80 + 79) * 10 + 9) * 512);
    }

    #[test]
    fn test_edsk_track_offsets() {
        assert_eq!(edsk_track_offset(10, 0), 0x100);
        assert_eq!(edsk_track_offset(10, 128), 0x100 + 0x1500);
        assert_eq!(edsk_track_offset(10, 1), 0x100 + 0x1500 * 2);
        assert_eq!(edsk_track_offset(9, 207), 0x100 + 0x1300 * (79 * 2 + 1));
    }

    #[test]
    fn test_edsk_offset_follows_id_table() {
        let spt = 3;
        let mut data = vec![0u8; ContainerKind::Edsk.image_size(spt)];
        let ids = 0x100 + TRACK_INFO_SECTOR_LIST_OFFSET + SECTOR_INFO_ID_OFFSET;
        for (i, id) in [2u8, 3, 1].iter().enumerate() {
            data[ids + i * SECTOR_INFO_SIZE] = *id;
        }

        assert_eq!(edsk_offset(&data, spt, 0, 2).unwrap(), 0x200);
        assert_eq!(edsk_offset(&data, spt, 0, 1).unwrap(), 0x200 + 2 * 512);
        // Track 0 side 1 has an empty ID table
        assert!(edsk_offset(&data, spt, 128, 1).is_err());
    }

    #[test]
    fn test_sector_offset_rejects_short_buffer() {
        let data = vec![0u8; 1024];
        assert_eq!(ContainerKind::Mgt.sector_offset(&data, 10, 0, 2).unwrap(), 512);
        assert!(ContainerKind::Mgt.sector_offset(&data, 10, 0, 3).is_err());
        assert!(matches!(
            ContainerKind::Sad.sector_offset(&data, 10, 0, 0),
            Err(MgtError::InvalidSector { track: 0, sector: 0 })
        ));
    }
}
