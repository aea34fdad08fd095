//! Container formats and constants

/// Format constants
pub mod constants;
/// Sector offset calculations for each container
pub mod layout;

pub use constants::*;

/// Physical container layout of a disk image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// Raw sector dump with both sides of each cylinder adjacent
    Mgt,
    /// 22-byte header followed by all of side 0 then all of side 1
    Sad,
    /// Extended DSK with per-track headers and sector ID tables
    Edsk,
}

impl ContainerKind {
    /// Get a human-readable name for this format
    pub fn name(&self) -> &'static str {
        match self {
            ContainerKind::Mgt => "MGT",
            ContainerKind::Sad => "SAD",
            ContainerKind::Edsk => "Extended DSK",
        }
    }

    /// Size of one track's storage, including any per-track header
    pub fn track_size(&self, spt: u8) -> usize {
        let data = spt as usize * SECTOR_SIZE;
        match self {
            ContainerKind::Mgt | ContainerKind::Sad => data,
            ContainerKind::Edsk => TRACK_INFO_BLOCK_SIZE + data,
        }
    }

    /// Size of the fixed image header
    pub fn header_size(&self) -> usize {
        match self {
            ContainerKind::Mgt => 0,
            ContainerKind::Sad => SAD_HEADER_SIZE,
            ContainerKind::Edsk => DISK_INFO_BLOCK_SIZE,
        }
    }

    /// Total image size for the given sectors per track
    pub fn image_size(&self, spt: u8) -> usize {
        self.header_size() + TRACKS_PER_SIDE as usize * SIDES * self.track_size(spt)
    }

    /// Sectors per track implied by an image of `size` bytes in this layout
    pub fn sectors_per_track_for(&self, size: usize) -> Option<u8> {
        let body = size.checked_sub(self.header_size())?;
        let tracks = TRACKS_PER_SIDE as usize * SIDES;
        if body % tracks != 0 {
            return None;
        }

        let per_track = match self {
            ContainerKind::Mgt | ContainerKind::Sad => body / tracks,
            ContainerKind::Edsk => (body / tracks).checked_sub(TRACK_INFO_BLOCK_SIZE)?,
        };

        if per_track % SECTOR_SIZE != 0 {
            return None;
        }

        let spt = per_track / SECTOR_SIZE;
        if spt == 0 || spt > MAX_SECTORS_PER_TRACK as usize {
            return None;
        }
        Some(spt as u8)
    }
}

impl std::fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Detect container kind and sectors per track from an image size
pub fn detect_format(size: usize) -> Option<(ContainerKind, u8)> {
    [ContainerKind::Mgt, ContainerKind::Sad, ContainerKind::Edsk]
        .into_iter()
        .find_map(|kind| {
            DETECTABLE_SECTORS_PER_TRACK
                .iter()
                .find(|&&spt| kind.image_size(spt) == size)
                .map(|&spt| (kind, spt))
        })
}
