//! Image and exported file writer

use crate::error::Result;
use crate::filesystem::{File, TimeFormat};
use crate::format::constants::{DEFAULT_DIR_TRACKS, DEFAULT_SECTORS_PER_TRACK};
use crate::image::DiskImage;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::path::Path;

/// Write a disk image file, optionally gzip-compressed
pub fn write_image<P: AsRef<Path>>(image: &DiskImage, path: P, compressed: bool) -> Result<()> {
    let mut file = std::fs::File::create(path)?;

    if compressed {
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(image.data())?;
        encoder.finish()?;
    } else {
        file.write_all(image.data())?;
    }

    Ok(())
}

/// Export a file as its directory entry followed by its data
///
/// The entry describes the data as if it were stored at the start of
/// the data area.
pub fn export_file<P: AsRef<Path>>(file: &File, path: P) -> Result<()> {
    let entry = file.to_dir(
        DEFAULT_DIR_TRACKS,
        1,
        DEFAULT_SECTORS_PER_TRACK,
        TimeFormat::Bdos,
    )?;

    let mut out = std::fs::File::create(path)?;
    out.write_all(&entry)?;
    if !file.kind.is_free() {
        out.write_all(&file.data)?;
    }
    Ok(())
}
