//! Disk image container

/// Image builder for creating blank images
pub mod builder;

pub use builder::DiskImageBuilder;

use crate::error::{MgtError, Result};
use crate::format::constants::*;
use crate::format::{detect_format, ContainerKind};

/// A disk image held in memory as its stored bytes
///
/// The container hides which physical layout backs the buffer: every
/// sector is reached by track (bit 7 selects side 1) and 1-based sector
/// number, whatever the `ContainerKind`.
#[derive(Debug, Clone)]
pub struct DiskImage {
    /// Physical layout of `data`
    pub(crate) kind: ContainerKind,
    /// Sectors per track
    pub(crate) spt: u8,
    /// Stored image bytes
    pub(crate) data: Vec<u8>,
    /// Was the image gzip-compressed when loaded?
    pub(crate) compressed: bool,
    /// Original filename if loaded from disk
    pub(crate) filename: Option<String>,
}

impl DiskImage {
    /// Create a blank MGT image with the given sectors per track
    pub fn new(spt: u8) -> Result<Self> {
        DiskImageBuilder::new().sectors_per_track(spt).build()
    }

    /// Create a blank image of any kind
    pub fn create(kind: ContainerKind, spt: u8) -> Result<Self> {
        DiskImageBuilder::new()
            .kind(kind)
            .sectors_per_track(spt)
            .build()
    }

    /// Create a new builder for constructing images
    pub fn builder() -> DiskImageBuilder {
        DiskImageBuilder::new()
    }

    /// Wrap image bytes, detecting the container kind from their size
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let (kind, spt) =
            detect_format(data.len()).ok_or(MgtError::UnsupportedFormat { size: data.len() })?;
        log::debug!("detected {} image with {} sectors per track", kind, spt);

        Ok(Self {
            kind,
            spt,
            data,
            compressed: false,
            filename: None,
        })
    }

    /// Wrap image bytes of a known container kind
    pub fn with_kind(kind: ContainerKind, data: Vec<u8>) -> Result<Self> {
        let spt = kind
            .sectors_per_track_for(data.len())
            .ok_or(MgtError::UnsupportedFormat { size: data.len() })?;

        Ok(Self {
            kind,
            spt,
            data,
            compressed: false,
            filename: None,
        })
    }

    /// Get the container kind
    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// Get the number of sectors per track
    pub fn sectors_per_track(&self) -> u8 {
        self.spt
    }

    /// Get the stored image bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the image, returning its stored bytes
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Check whether the image was gzip-compressed when loaded
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Set the compressed flag
    pub fn set_compressed(&mut self, compressed: bool) {
        self.compressed = compressed;
    }

    /// Get the original filename if loaded from disk
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Total logical sectors on the disk
    pub fn total_sectors(&self) -> usize {
        TRACKS_PER_SIDE as usize * SIDES * self.spt as usize
    }

    /// Calculate the offset of a sector's data in the image
    pub fn sector_offset(&self, track: u8, sector: u8) -> Result<usize> {
        self.kind.sector_offset(&self.data, self.spt, track, sector)
    }

    /// Read sector data
    pub fn read_sector(&self, track: u8, sector: u8) -> Result<&[u8]> {
        let offset = self.sector_offset(track, sector)?;
        Ok(&self.data[offset..offset + SECTOR_SIZE])
    }

    /// Write sector data
    pub fn write_sector(&mut self, track: u8, sector: u8, data: &[u8]) -> Result<()> {
        if data.len() != SECTOR_SIZE {
            return Err(MgtError::invalid_value(format!(
                "sector data should be {} bytes, got {}",
                SECTOR_SIZE,
                data.len()
            )));
        }

        let offset = self.sector_offset(track, sector)?;
        self.data[offset..offset + SECTOR_SIZE].copy_from_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct_image() {
        let image = DiskImage::new(10).unwrap();
        assert_eq!(image.sectors_per_track(), 10);
        assert!(!image.is_compressed());
        assert_eq!(image.data().len(), 819_200);
        assert_eq!(image.total_sectors(), 1600);
    }

    #[test]
    fn test_construct_image_9spt() {
        let image = DiskImage::new(9).unwrap();
        assert_eq!(image.sectors_per_track(), 9);
        assert_eq!(image.data().len(), 737_280);
    }

    #[test]
    fn test_from_bytes() {
        let image = DiskImage::from_bytes(vec![0; 819_222]).unwrap();
        assert_eq!(image.kind(), ContainerKind::Sad);
        assert_eq!(image.sectors_per_track(), 10);

        let image = DiskImage::from_bytes(vec![0; 778_496]).unwrap();
        assert_eq!(image.kind(), ContainerKind::Edsk);
        assert_eq!(image.sectors_per_track(), 9);
    }

    #[test]
    fn test_from_bytes_invalid() {
        let result = DiskImage::from_bytes(vec![0; 1000]);
        assert!(matches!(result, Err(MgtError::UnsupportedFormat { size: 1000 })));
    }

    #[test]
    fn test_with_kind() {
        let image = DiskImage::with_kind(ContainerKind::Mgt, vec![0; 819_200]).unwrap();
        assert_eq!(image.sectors_per_track(), 10);
        assert!(DiskImage::with_kind(ContainerKind::Edsk, vec![0; 819_200]).is_err());
    }

    #[test]
    fn test_read_write_sector() {
        let mut image = DiskImage::new(10).unwrap();
        let data: Vec<u8> = (0..512).map(|x| (x & 0xff) as u8).collect();

        image.write_sector(10, 5, &data).unwrap();
        assert_eq!(image.read_sector(10, 5).unwrap(), data.as_slice());
        assert_eq!(image.sector_offset(10, 5).unwrap(), (10 * 20 + 4) * 512);
    }

    #[test]
    fn test_write_sector_wrong_size() {
        let mut image = DiskImage::new(10).unwrap();
        assert!(matches!(
            image.write_sector(0, 1, &[0; 511]),
            Err(MgtError::InvalidValue(_))
        ));
        assert!(image.write_sector(0, 1, &[0; 513]).is_err());
    }

    #[test]
    fn test_read_invalid_sector() {
        let image = DiskImage::new(10).unwrap();
        assert!(image.read_sector(0, 0).is_err());
        assert!(image.read_sector(0, 11).is_err());
        assert!(image.read_sector(80, 1).is_err());
        assert!(matches!(
            image.read_sector(208, 1),
            Err(MgtError::InvalidSector { track: 208, sector: 1 })
        ));
    }

    #[test]
    fn test_edsk_sector_offsets() {
        let image = DiskImage::create(ContainerKind::Edsk, 10).unwrap();
        assert_eq!(image.sector_offset(0, 1).unwrap(), 0x100 + 0x100);
        assert_eq!(image.sector_offset(0, 2).unwrap(), 0x100 + 0x100 + 512);
        assert_eq!(image.sector_offset(128, 1).unwrap(), 0x100 + 0x1500 + 0x100);
        assert_eq!(
            image.sector_offset(207, 10).unwrap(),
            0x100 + 0x1500 * (79 * 2 + 1) + 0x100 + 9 * 512
        );
        assert!(image.sector_offset(0, 11).is_err());
    }

    #[test]
    fn test_edsk_interleaved_offsets() {
        let image = DiskImage::builder()
            .kind(ContainerKind::Edsk)
            .sectors_per_track(9)
            .interleave(2)
            .build()
            .unwrap();

        // IDs run 1,6,2,7,3,8,4,9,5
        assert_eq!(image.sector_offset(0, 1).unwrap(), 0x200);
        assert_eq!(image.sector_offset(0, 6).unwrap(), 0x200 + 512);
        assert_eq!(image.sector_offset(0, 2).unwrap(), 0x200 + 2 * 512);
        assert_eq!(image.sector_offset(0, 5).unwrap(), 0x200 + 8 * 512);
    }

    #[test]
    fn test_sad_read_write() {
        let mut image = DiskImage::create(ContainerKind::Sad, 10).unwrap();
        image.write_sector(128, 1, &[0xAA; 512]).unwrap();
        assert_eq!(image.sector_offset(128, 1).unwrap(), 22 + 80 * 10 * 512);
        assert_eq!(&image.data()[22 + 80 * 10 * 512], &0xAA);
    }
}
