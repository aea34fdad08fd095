//! Image and exported file reader

use crate::error::Result;
use crate::filesystem::File;
use crate::format::constants::DIR_ENTRY_SIZE;
use crate::image::DiskImage;
use crate::io::GZIP_SIGNATURE;
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::Path;

/// Read a disk image file, decompressing it if gzipped
///
/// The container kind is detected from the (decompressed) size.
pub fn read_image<P: AsRef<Path>>(path: P) -> Result<DiskImage> {
    let path = path.as_ref();
    let raw = std::fs::read(path)?;

    let compressed = raw.starts_with(GZIP_SIGNATURE);
    let data = if compressed {
        let mut data = Vec::new();
        GzDecoder::new(raw.as_slice()).read_to_end(&mut data)?;
        log::debug!("decompressed {} to {} bytes", path.display(), data.len());
        data
    } else {
        raw
    };

    let mut image = DiskImage::from_bytes(data)?;
    image.compressed = compressed;
    image.filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.to_string());
    Ok(image)
}

/// Import a file exported with `export_file`
///
/// The file holds a 256-byte directory entry followed by the file data.
pub fn import_file<P: AsRef<Path>>(path: P) -> Result<File> {
    let raw = std::fs::read(path)?;
    let (entry, data) = raw.split_at(raw.len().min(DIR_ENTRY_SIZE));

    let mut file = File::from_dir(entry)?;
    if !file.kind.is_free() {
        file.data = data.to_vec();
    }
    Ok(file)
}
