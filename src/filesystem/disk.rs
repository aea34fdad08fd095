//! Logical disk: dialect, volume details and the ordered file list

use globset::GlobBuilder;
use std::fmt;
use std::path::Path;

use crate::error::{MgtError, Result};
use crate::filesystem::chain::{read_payload, write_payload};
use crate::filesystem::file::{File, DEFAULT_CODE_START, MAX_NAME_LEN};
use crate::filesystem::file_type::FileKind;
use crate::filesystem::sector_map::SectorMap;
use crate::filesystem::time::TimeFormat;
use crate::format::constants::*;
use crate::format::ContainerKind;
use crate::image::DiskImage;
use crate::io::{read_image, write_image};

const BDOS_SIGNATURE: &[u8; 4] = b"BDOS";
const BDOS_SIGNATURE_OFFSET: usize = 232;
const LABEL_OFFSET: usize = 210;
const LABEL_LEN: usize = 10;
const BDOS_LABEL_EXT_OFFSET: usize = 250;
const BDOS_LABEL_LEN: usize = 16;
const SERIAL_OFFSET: usize = 252;
const EXTRA_DIR_TRACKS_OFFSET: usize = 255;
const NO_LABEL: u8 = b'*';

/// Directory conventions of the DOS that wrote the disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiskType {
    /// SAM DOS, and the +D/DISCiPLE systems it grew from
    #[default]
    SamDos,
    /// MasterDOS: label, serial number and a variable directory size
    MasterDos,
    /// BDOS: signature and 16-character label
    Bdos,
}

impl DiskType {
    /// Name shown when a disk has no label
    pub fn name(&self) -> &'static str {
        match self {
            DiskType::SamDos => "SAMDOS",
            DiskType::MasterDos => "MASTERDOS",
            DiskType::Bdos => "BDOS",
        }
    }

    /// Date/time packing used when writing entries for this dialect
    pub fn time_format(&self) -> TimeFormat {
        match self {
            DiskType::MasterDos => TimeFormat::MasterDos,
            _ => TimeFormat::Bdos,
        }
    }
}

impl fmt::Display for DiskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A logical disk
///
/// File order is directory slot order: `files[i]` is written to directory
/// entry `i`, and files are decoded back in the same order.
#[derive(Debug, Clone)]
pub struct Disk {
    /// Disk dialect
    pub disk_type: DiskType,
    /// Number of tracks holding the directory
    pub dir_tracks: u8,
    /// Volume label
    pub label: Option<String>,
    /// Volume serial number (MasterDOS)
    ///
    /// MasterDOS always stores a serial, so `None` is written as 0 and
    /// decodes as `Some(0)`.
    pub serial: Option<u16>,
    /// Files in directory slot order
    pub files: Vec<File>,
    /// Was the image gzip-compressed when loaded?
    pub compressed: bool,
}

impl Disk {
    /// Create an empty SAM DOS disk
    pub fn new() -> Self {
        Self {
            disk_type: DiskType::SamDos,
            dir_tracks: DEFAULT_DIR_TRACKS,
            label: None,
            serial: None,
            files: Vec::new(),
            compressed: false,
        }
    }

    /// Load a disk image file, which may be gzip-compressed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_image(&read_image(path)?)
    }

    /// Decode a disk from image bytes, detecting the container kind
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_image(&DiskImage::from_bytes(data)?)
    }

    /// Decode a disk from image bytes of a known container kind
    pub fn from_bytes_as(kind: ContainerKind, data: Vec<u8>) -> Result<Self> {
        Self::from_image(&DiskImage::with_kind(kind, data)?)
    }

    /// Decode a disk from a container
    pub fn from_image(image: &DiskImage) -> Result<Self> {
        let mut disk = Self::new();
        disk.compressed = image.is_compressed();
        disk.detect_dialect(image.read_sector(0, 1)?);
        log::debug!(
            "{} disk, {} directory tracks, label {:?}",
            disk.disk_type,
            disk.dir_tracks,
            disk.label
        );

        let spt = image.sectors_per_track();
        for index in 0..disk.max_files(spt) {
            let mut file = File::from_dir(&Self::read_dir(image, index)?)?;

            if !file.kind.is_free() {
                file.data = read_payload(
                    image,
                    file.kind.allocation(),
                    file.sectors,
                    file.start_track,
                    file.start_sector,
                );
                disk.files.push(file);
            } else if file.name.is_empty() {
                break;
            }
        }

        // A BDOS label ends in the first entry's parent directory byte
        if disk.disk_type == DiskType::Bdos && disk.label.is_some() {
            if let Some(file) = disk.files.first_mut() {
                file.dir = None;
            }
        }

        Ok(disk)
    }

    fn detect_dialect(&mut self, boot: &[u8]) {
        let mut label = None;

        if &boot[BDOS_SIGNATURE_OFFSET..BDOS_SIGNATURE_OFFSET + 4] == BDOS_SIGNATURE {
            self.disk_type = DiskType::Bdos;
            if boot[LABEL_OFFSET] != 0 {
                let mut raw = boot[LABEL_OFFSET..LABEL_OFFSET + LABEL_LEN].to_vec();
                raw.extend_from_slice(&boot[BDOS_LABEL_EXT_OFFSET..BDOS_LABEL_EXT_OFFSET + 6]);
                label = Some(raw);
            }
        } else if boot[LABEL_OFFSET] != 0 && boot[LABEL_OFFSET] != 0xff {
            self.disk_type = DiskType::MasterDos;

            let dir_tracks = DEFAULT_DIR_TRACKS as usize + boot[EXTRA_DIR_TRACKS_OFFSET] as usize;
            if dir_tracks > MAX_DIR_TRACKS as usize {
                log::warn!("directory size of {} tracks limited to {}", dir_tracks, MAX_DIR_TRACKS);
            }
            self.dir_tracks = dir_tracks.min(MAX_DIR_TRACKS as usize) as u8;

            if boot[LABEL_OFFSET] != NO_LABEL {
                label = Some(boot[LABEL_OFFSET..LABEL_OFFSET + LABEL_LEN].to_vec());
            }
            self.serial = Some(u16::from_le_bytes([boot[SERIAL_OFFSET], boot[SERIAL_OFFSET + 1]]));
        }

        self.label = label
            .map(|raw| raw.iter().map(|&b| (b & 0x7f) as char).collect::<String>())
            .map(|label| label.trim_end().to_string())
            .filter(|label| !label.is_empty());
    }

    /// Encode the disk as an MGT image
    pub fn to_image(&self, spt: u8) -> Result<DiskImage> {
        self.to_image_as(ContainerKind::Mgt, spt)
    }

    /// Encode the disk into a container of the given kind
    ///
    /// Files are laid out back to back from the first track after the
    /// directory. Capacity is checked before anything is written.
    pub fn to_image_as(&self, kind: ContainerKind, spt: u8) -> Result<DiskImage> {
        if spt == 0 {
            return Err(MgtError::invalid_value("invalid sectors per track (0)"));
        }
        if !(DEFAULT_DIR_TRACKS..=MAX_DIR_TRACKS).contains(&self.dir_tracks) {
            return Err(MgtError::invalid_value(format!(
                "invalid directory size ({} tracks)",
                self.dir_tracks
            )));
        }
        if self.disk_type != DiskType::MasterDos && self.dir_tracks != DEFAULT_DIR_TRACKS {
            return Err(MgtError::invalid_value(format!(
                "{} disks have {} directory tracks",
                self.disk_type, DEFAULT_DIR_TRACKS
            )));
        }
        let max = self.max_files(spt);
        if self.files.len() > max {
            return Err(MgtError::TooManyFiles { max });
        }

        let mut image = DiskImage::create(kind, spt)?;
        let time_format = self.disk_type.time_format();
        let (mut track, mut sector) = (self.dir_tracks, 1);

        for (index, file) in self.files.iter().enumerate() {
            let entry = file.to_dir(track, sector, spt, time_format)?;
            if !file.kind.is_free() {
                (track, sector) =
                    write_payload(&mut image, file.kind.allocation(), track, sector, &file.data)?;
            }
            Self::write_dir(&mut image, index, &entry)?;
        }

        self.stamp_boot_sector(&mut image)?;
        Ok(image)
    }

    fn stamp_boot_sector(&self, image: &mut DiskImage) -> Result<()> {
        let mut boot = image.read_sector(0, 1)?.to_vec();
        let label = self.label.as_deref().filter(|label| !label.is_empty());

        match self.disk_type {
            DiskType::SamDos => {
                if &boot[BDOS_SIGNATURE_OFFSET..BDOS_SIGNATURE_OFFSET + 4] == BDOS_SIGNATURE {
                    boot[BDOS_SIGNATURE_OFFSET..BDOS_SIGNATURE_OFFSET + 4].fill(0);
                }
                // OPENTYPE files keep the top of their length here
                let opentype = matches!(
                    self.files.first().map(|file| &file.kind),
                    Some(FileKind::OpenType { .. })
                );
                if !opentype {
                    boot[LABEL_OFFSET] = 0;
                }
            }
            DiskType::MasterDos => {
                match label {
                    Some(label) => {
                        let label = padded_label(label, LABEL_LEN)?;
                        boot[LABEL_OFFSET..LABEL_OFFSET + LABEL_LEN].copy_from_slice(&label);
                    }
                    None => boot[LABEL_OFFSET] = NO_LABEL,
                }
                boot[SERIAL_OFFSET..SERIAL_OFFSET + 2]
                    .copy_from_slice(&self.serial.unwrap_or(0).to_le_bytes());
                boot[EXTRA_DIR_TRACKS_OFFSET] = self.dir_tracks - DEFAULT_DIR_TRACKS;
            }
            DiskType::Bdos => {
                boot[BDOS_SIGNATURE_OFFSET..BDOS_SIGNATURE_OFFSET + 4].copy_from_slice(BDOS_SIGNATURE);
                match label {
                    Some(label) => {
                        let label = padded_label(label, BDOS_LABEL_LEN)?;
                        boot[LABEL_OFFSET..LABEL_OFFSET + LABEL_LEN]
                            .copy_from_slice(&label[..LABEL_LEN]);
                        boot[BDOS_LABEL_EXT_OFFSET..BDOS_LABEL_EXT_OFFSET + 6]
                            .copy_from_slice(&label[LABEL_LEN..]);
                    }
                    None => boot[LABEL_OFFSET] = 0,
                }
            }
        }

        self.check_first_entry(&boot, self.disk_type == DiskType::Bdos && label.is_some())?;
        image.write_sector(0, 1, &boot)
    }

    /// Fail when the stamped boot sector would change what the first file
    /// decodes as
    ///
    /// Labels and MasterDOS details share bytes 210-255 with entry 0.
    fn check_first_entry(&self, boot: &[u8], bdos_label: bool) -> Result<()> {
        let Some(file) = self.files.first().filter(|file| !file.kind.is_free()) else {
            return Ok(());
        };

        let stamped = FileKind::decode_as(file.kind.code(), &boot[..DIR_ENTRY_SIZE]);
        let dir_clash = bdos_label && file.kind.is_sam_type() && file.dir.is_some();
        if stamped != file.kind || dir_clash {
            return Err(MgtError::invalid_value(format!(
                "{} boot sector details overlap the metadata of '{}'",
                self.disk_type, file.name
            )));
        }
        Ok(())
    }

    /// Save the disk as an MGT image file, optionally gzip-compressed
    pub fn save<P: AsRef<Path>>(&self, path: P, compressed: bool, spt: u8) -> Result<()> {
        let image = self.to_image(spt)?;
        write_image(&image, path, compressed)
    }

    /// Add a CODE file from raw bytes
    ///
    /// Any file with the same name is replaced. The new file goes into
    /// slot `at_index`, or after the existing files.
    pub fn add_code_bytes(
        &mut self,
        data: &[u8],
        name: &str,
        start: u32,
        execute: Option<u32>,
        at_index: Option<usize>,
    ) -> Result<()> {
        let file = File::from_code_bytes(data, name, start, execute)?;
        self.files.retain(|existing| !existing.name.eq_ignore_ascii_case(&file.name));

        let index = at_index.unwrap_or(self.files.len()).min(self.files.len());
        self.files.insert(index, file);
        Ok(())
    }

    /// Add a CODE file from a path, loading at the default address
    ///
    /// Without an explicit filename the file stem is used, cut to 10
    /// characters.
    pub fn add_code_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        filename: Option<&str>,
        at_index: Option<usize>,
    ) -> Result<()> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let name = match filename {
            Some(name) => name.to_string(),
            None => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().chars().take(MAX_NAME_LEN).collect())
                .unwrap_or_default(),
        };
        self.add_code_bytes(&data, &name, DEFAULT_CODE_START, None, at_index)
    }

    /// Delete files with names matching a glob pattern, ignoring case
    ///
    /// Returns the number of files removed.
    pub fn delete(&mut self, pattern: &str) -> Result<usize> {
        let matcher = GlobBuilder::new(&pattern.to_lowercase())
            .backslash_escape(false)
            .build()?
            .compile_matcher();

        let before = self.files.len();
        self.files.retain(|file| !matcher.is_match(file.name.to_lowercase()));
        Ok(before - self.files.len())
    }

    /// Combined sector map of all files
    pub fn bam(&self) -> Result<SectorMap> {
        let (first, rest) = self.files.split_first().ok_or(MgtError::NoFiles)?;
        Ok(rest.iter().fold(first.sector_map.clone(), |mut bam, file| {
            bam |= &file.sector_map;
            bam
        }))
    }

    /// Number of directory slots for the given sectors per track
    pub fn max_files(&self, spt: u8) -> usize {
        self.dir_tracks as usize * spt as usize * DIR_ENTRIES_PER_SECTOR
    }

    /// Generate a directory listing
    pub fn dir(&self, spt: u8) -> String {
        let mut listing = format!("* {}:\n", self.label.as_deref().unwrap_or(self.disk_type.name()));

        for (i, file) in self.files.iter().enumerate() {
            listing += &format!("{:3}  {}\n", i + 1, file);
        }

        let total_sectors = TRACKS_PER_SIDE as i64 * SIDES as i64 * spt as i64;
        let dir_sectors = self.dir_tracks as i64 * spt as i64;
        let used_sectors: i64 = self.files.iter().map(|file| file.sectors as i64).sum();
        let free_sectors = total_sectors - dir_sectors - used_sectors;
        let free_slots = self.max_files(spt) as i64 - self.files.len() as i64;

        listing += &format!(
            "\n{:2} files, {:2} free slots, {:.1}K used, {:.1}K free\n",
            self.files.len(),
            free_slots,
            used_sectors as f64 / 2.0,
            free_sectors as f64 / 2.0
        );
        listing
    }

    /// Location of a zero-based directory entry: track, sector and byte offset
    ///
    /// `spt` must be non-zero.
    pub fn dir_position(index: usize, spt: u8) -> (u8, u8, usize) {
        let per_track = spt as usize * DIR_ENTRIES_PER_SECTOR;
        let track = u8::try_from(index / per_track).unwrap_or(u8::MAX);
        let sector = 1 + (index % per_track) / DIR_ENTRIES_PER_SECTOR;
        let offset = (index % DIR_ENTRIES_PER_SECTOR) * DIR_ENTRY_SIZE;
        (track, sector as u8, offset)
    }

    /// Read a zero-based directory entry
    pub fn read_dir(image: &DiskImage, index: usize) -> Result<[u8; DIR_ENTRY_SIZE]> {
        let (track, sector, offset) = Self::dir_position(index, image.sectors_per_track());
        let data = image.read_sector(track, sector)?;

        let mut entry = [0u8; DIR_ENTRY_SIZE];
        entry.copy_from_slice(&data[offset..offset + DIR_ENTRY_SIZE]);
        Ok(entry)
    }

    /// Write a zero-based directory entry
    pub fn write_dir(image: &mut DiskImage, index: usize, entry: &[u8]) -> Result<()> {
        if entry.len() != DIR_ENTRY_SIZE {
            return Err(MgtError::invalid_value(format!(
                "directory entry should be {} bytes, got {}",
                DIR_ENTRY_SIZE,
                entry.len()
            )));
        }

        let (track, sector, offset) = Self::dir_position(index, image.sectors_per_track());
        let mut data = image.read_sector(track, sector)?.to_vec();
        data[offset..offset + DIR_ENTRY_SIZE].copy_from_slice(entry);
        image.write_sector(track, sector, &data)
    }
}

impl Default for Disk {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Disk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir(DEFAULT_SECTORS_PER_TRACK))
    }
}

fn padded_label(label: &str, len: usize) -> Result<Vec<u8>> {
    if !label.is_ascii() || label.len() > len {
        return Err(MgtError::invalid_value(format!("invalid disk label '{}'", label)));
    }
    Ok(format!("{:1$}", label, len).into_bytes())
}
