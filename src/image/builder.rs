//! Builder for creating blank disk images

use crate::error::{MgtError, Result};
use crate::format::constants::*;
use crate::format::layout::edsk_track_offset;
use crate::format::ContainerKind;
use crate::image::DiskImage;

/// GAP#3 length recorded in EDSK track headers
const EDSK_GAP3_LENGTH: u8 = 0x17;

/// Filler byte recorded in EDSK track headers
const EDSK_FILLER_BYTE: u8 = 0x00;

/// Builder for constructing blank disk images
#[derive(Debug, Clone)]
pub struct DiskImageBuilder {
    kind: ContainerKind,
    sectors_per_track: u8,
    interleave: u8,
}

impl DiskImageBuilder {
    /// Create a new builder for a 10-sector MGT image
    pub fn new() -> Self {
        Self {
            kind: ContainerKind::Mgt,
            sectors_per_track: DEFAULT_SECTORS_PER_TRACK,
            interleave: 1,
        }
    }

    /// Set the container kind
    pub fn kind(mut self, kind: ContainerKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set sectors per track
    pub fn sectors_per_track(mut self, sectors_per_track: u8) -> Self {
        self.sectors_per_track = sectors_per_track;
        self
    }

    /// Set the physical sector interleave (EDSK only, other layouts store sectors in order)
    pub fn interleave(mut self, interleave: u8) -> Self {
        self.interleave = interleave;
        self
    }

    /// Build the image with the specified configuration
    pub fn build(self) -> Result<DiskImage> {
        let spt = self.sectors_per_track;
        if spt == 0 || spt > MAX_SECTORS_PER_TRACK {
            return Err(MgtError::invalid_value(format!(
                "invalid sectors per track ({})",
                spt
            )));
        }
        if self.interleave == 0 {
            return Err(MgtError::invalid_value("interleave must be at least 1"));
        }

        let mut data = vec![0u8; self.kind.image_size(spt)];
        match self.kind {
            ContainerKind::Mgt => {}
            ContainerKind::Sad => write_sad_header(&mut data, spt),
            ContainerKind::Edsk => write_edsk_headers(&mut data, spt, self.interleave),
        }

        Ok(DiskImage {
            kind: self.kind,
            spt,
            data,
            compressed: false,
            filename: None,
        })
    }
}

impl Default for DiskImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Physical order of sector IDs on a track for the given interleave
pub fn interleaved_ids(spt: u8, interleave: u8) -> Vec<u8> {
    let count = spt as usize;
    let mut ids = vec![0u8; count];
    let mut pos = 0;

    for id in 1..=spt {
        while ids[pos] != 0 {
            pos = (pos + 1) % count;
        }
        ids[pos] = id;
        pos = (pos + interleave as usize) % count;
    }

    ids
}

fn write_sad_header(data: &mut [u8], spt: u8) {
    data[..SAD_SIGNATURE.len()].copy_from_slice(SAD_SIGNATURE);
    let fields = SAD_SIGNATURE.len();
    data[fields] = SIDES as u8;
    data[fields + 1] = TRACKS_PER_SIDE;
    data[fields + 2] = spt;
    data[fields + 3] = (SECTOR_SIZE / 64) as u8;
}

fn write_edsk_headers(data: &mut [u8], spt: u8, interleave: u8) {
    data[..EXTENDED_DSK_SIGNATURE.len()].copy_from_slice(EXTENDED_DSK_SIGNATURE);
    data[DISK_INFO_CREATOR_OFFSET..DISK_INFO_CREATOR_OFFSET + CREATOR_SIGNATURE.len()]
        .copy_from_slice(CREATOR_SIGNATURE);
    data[DISK_INFO_TRACK_COUNT_OFFSET] = TRACKS_PER_SIDE;
    data[DISK_INFO_SIDE_COUNT_OFFSET] = SIDES as u8;

    let track_size = ContainerKind::Edsk.track_size(spt);
    let tracks = TRACKS_PER_SIDE as usize * SIDES;
    for i in 0..tracks {
        // Size table is in 256-byte units
        data[DISK_INFO_EXT_TRACK_SIZE_OFFSET + i] = (track_size / 256) as u8;
    }

    let ids = interleaved_ids(spt, interleave);
    for cylinder in 0..TRACKS_PER_SIDE {
        for side in 0..SIDES as u8 {
            let track = cylinder | (side << 7);
            let offset = edsk_track_offset(spt, track);
            let header = &mut data[offset..offset + TRACK_INFO_BLOCK_SIZE];

            header[..TRACK_INFO_MARKER.len()].copy_from_slice(TRACK_INFO_MARKER);
            header[0x10] = cylinder;
            header[0x11] = side;
            header[0x14] = SECTOR_SIZE_CODE;
            header[0x15] = spt;
            header[0x16] = EDSK_GAP3_LENGTH;
            header[0x17] = EDSK_FILLER_BYTE;

            for (i, &id) in ids.iter().enumerate() {
                let sib = TRACK_INFO_SECTOR_LIST_OFFSET + i * SECTOR_INFO_SIZE;
                let info = &mut header[sib..sib + SECTOR_INFO_SIZE];
                info[0] = cylinder;
                info[1] = side;
                info[SECTOR_INFO_ID_OFFSET] = id;
                info[3] = SECTOR_SIZE_CODE;
                info[6..8].copy_from_slice(&(SECTOR_SIZE as u16).to_le_bytes());
            }
        }
    }
}
