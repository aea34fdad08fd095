//! File data sector chains
//!
//! Most file types link their sectors: the last two bytes of each sector
//! hold the track and sector of the next one, leaving 510 bytes of data.
//! A few types instead occupy a contiguous run of whole sectors.

use crate::error::{MgtError, Result};
use crate::format::constants::{SECTOR_SIZE, SIDE1_FLAG, TRACKS_PER_SIDE};
use crate::format::layout::check_location;
use crate::image::DiskImage;

/// Bytes of file data in each chained sector
pub const CHAINED_BYTES_PER_SECTOR: usize = SECTOR_SIZE - 2;

/// How a file's data sectors are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    /// Sectors linked by trailing track/sector bytes
    Chained,
    /// Consecutive whole sectors
    Contiguous,
}

impl Allocation {
    /// Bytes of file data held by each sector
    pub fn bytes_per_sector(&self) -> usize {
        match self {
            Allocation::Chained => CHAINED_BYTES_PER_SECTOR,
            Allocation::Contiguous => SECTOR_SIZE,
        }
    }

    /// Sectors needed to hold `len` bytes of data
    pub fn sectors_for(&self, len: usize) -> usize {
        len.div_ceil(self.bytes_per_sector())
    }
}

/// Determine the sector location following the given one
///
/// Track 79 of side 0 is followed by track 0 of side 1 (track 128). The
/// location after the final sector is returned without error and only
/// rejected when it is used.
pub fn next_sector(track: u8, sector: u8, spt: u8) -> Result<(u8, u8)> {
    check_location(track, sector, spt)?;

    if sector < spt {
        return Ok((track, sector + 1));
    }

    let track = track + 1;
    if track == TRACKS_PER_SIDE {
        Ok((SIDE1_FLAG, 1))
    } else {
        Ok((track, 1))
    }
}

/// Read `sectors` sectors of file data starting at the given location
///
/// A broken chain or a run off the end of the disk ends the read early,
/// returning the data gathered so far.
pub fn read_payload(
    image: &DiskImage,
    allocation: Allocation,
    sectors: usize,
    start_track: u8,
    start_sector: u8,
) -> Vec<u8> {
    let spt = image.sectors_per_track();
    let mut data = Vec::with_capacity(sectors * allocation.bytes_per_sector());
    let (mut track, mut sector) = (start_track, start_sector);

    for remaining in (0..sectors).rev() {
        let chunk = match image.read_sector(track, sector) {
            Ok(chunk) => chunk,
            Err(e) => {
                log::warn!("file data truncated after {} bytes: {}", data.len(), e);
                break;
            }
        };
        log::trace!("read track {} sector {}", track, sector);

        match allocation {
            Allocation::Contiguous => {
                data.extend_from_slice(chunk);
                if remaining > 0 {
                    match next_sector(track, sector, spt) {
                        Ok(next) => (track, sector) = next,
                        Err(e) => {
                            log::warn!("file data truncated after {} bytes: {}", data.len(), e);
                            break;
                        }
                    }
                }
            }
            Allocation::Chained => {
                data.extend_from_slice(&chunk[..CHAINED_BYTES_PER_SECTOR]);
                (track, sector) = (chunk[SECTOR_SIZE - 2], chunk[SECTOR_SIZE - 1]);
            }
        }
    }

    data
}

/// Write file data from the given location, returning the next unused location
///
/// The final chunk is zero-padded to a whole sector. Chained sectors point
/// to their successor, with `00 00` after the last one. Every location is
/// checked before anything is written, so a full disk is reported without
/// modifying the image.
pub fn write_payload(
    image: &mut DiskImage,
    allocation: Allocation,
    start_track: u8,
    start_sector: u8,
    data: &[u8],
) -> Result<(u8, u8)> {
    let spt = image.sectors_per_track();
    let chunk_size = allocation.bytes_per_sector();
    let count = allocation.sectors_for(data.len());

    let mut locations = Vec::with_capacity(count + 1);
    locations.push((start_track, start_sector));
    for i in 0..count {
        let (track, sector) = locations[i];
        let next = next_sector(track, sector, spt).map_err(|_| MgtError::DiskFull)?;
        locations.push(next);
    }

    for (i, chunk) in data.chunks(chunk_size).enumerate() {
        let mut buf = [0u8; SECTOR_SIZE];
        buf[..chunk.len()].copy_from_slice(chunk);

        if allocation == Allocation::Chained && i + 1 < count {
            let (next_track, next_sector) = locations[i + 1];
            buf[SECTOR_SIZE - 2] = next_track;
            buf[SECTOR_SIZE - 1] = next_sector;
        }

        let (track, sector) = locations[i];
        log::trace!("write track {} sector {}", track, sector);
        image.write_sector(track, sector, &buf)?;
    }

    Ok(locations[count])
}
