//! Geometry, container magic bytes and directory constants

/// Bytes in every logical sector
pub const SECTOR_SIZE: usize = 512;

/// Tracks on each side of the disk
pub const TRACKS_PER_SIDE: u8 = 80;

/// Number of disk sides
pub const SIDES: usize = 2;

/// Track number flag selecting side 1
pub const SIDE1_FLAG: u8 = 0x80;

/// Sectors per track used when none is given
pub const DEFAULT_SECTORS_PER_TRACK: u8 = 10;

/// Sectors per track that can be detected from an image size alone
pub const DETECTABLE_SECTORS_PER_TRACK: [u8; 2] = [9, 10];

/// Maximum number of sectors per track (limited by the EDSK sector info list)
pub const MAX_SECTORS_PER_TRACK: u8 = 29;

/// SAD header signature
pub const SAD_SIGNATURE: &[u8] = b"Aley's disk backup";

/// Size of the SAD header
pub const SAD_HEADER_SIZE: usize = 22;

/// Extended DSK format signature
pub const EXTENDED_DSK_SIGNATURE: &[u8] = b"EXTENDED CPC DSK File\r\nDisk-Info\r\n";

/// Track-Info block marker
pub const TRACK_INFO_MARKER: &[u8] = b"Track-Info\r\n";

/// Creator signature for this library
pub const CREATOR_SIGNATURE: &[u8] = b"mgtdisk v0.1\0\0";

/// Size of disk info block
pub const DISK_INFO_BLOCK_SIZE: usize = 0x100;

/// Size of track info block
pub const TRACK_INFO_BLOCK_SIZE: usize = 0x100;

/// Size of sector info entry
pub const SECTOR_INFO_SIZE: usize = 8;

/// Offset of the sector info list in a track info block
pub const TRACK_INFO_SECTOR_LIST_OFFSET: usize = 0x18;

/// Offset of the sector ID within a sector info entry
pub const SECTOR_INFO_ID_OFFSET: usize = 2;

/// Offset of creator in disk info block
pub const DISK_INFO_CREATOR_OFFSET: usize = 0x22;

/// Offset of track count in disk info block
pub const DISK_INFO_TRACK_COUNT_OFFSET: usize = 0x30;

/// Offset of side count in disk info block
pub const DISK_INFO_SIDE_COUNT_OFFSET: usize = 0x31;

/// Offset of extended track size table in disk info block
pub const DISK_INFO_EXT_TRACK_SIZE_OFFSET: usize = 0x34;

/// FDC size code for 512-byte sectors
pub const SECTOR_SIZE_CODE: u8 = 2;

/// Size of each directory entry
pub const DIR_ENTRY_SIZE: usize = 256;

/// Directory entries per sector
pub const DIR_ENTRIES_PER_SECTOR: usize = SECTOR_SIZE / DIR_ENTRY_SIZE;

/// Directory tracks on a standard disk
pub const DEFAULT_DIR_TRACKS: u8 = 4;

/// Most directory tracks a MasterDOS disk can declare
pub const MAX_DIR_TRACKS: u8 = 39;

/// Bits in a sector address map
pub const SECTOR_MAP_BITS: usize = 1560;

/// Bytes in a sector address map
pub const SECTOR_MAP_BYTES: usize = SECTOR_MAP_BITS / 8;

/// Size of an 80 track double-sided image with the given sectors per track
#[inline]
pub fn raw_size(spt: u8) -> usize {
    TRACKS_PER_SIDE as usize * SIDES * spt as usize * SECTOR_SIZE
}
