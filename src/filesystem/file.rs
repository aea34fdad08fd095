//! Directory entry records

use chrono::NaiveDateTime;
use std::fmt;

use crate::error::{MgtError, Result};
use crate::format::constants::{DIR_ENTRY_SIZE, SECTOR_MAP_BITS, SECTOR_MAP_BYTES};
use crate::filesystem::file_type::offsets::{PARENT_DIR, TIME};
use crate::filesystem::file_type::FileKind;
use crate::filesystem::sector_map::{slot_index, SectorMap};
use crate::filesystem::time::{pack_time, unpack_time, TimeFormat};
use crate::filesystem::triple;

/// Maximum filename length
pub const MAX_NAME_LEN: usize = 10;

/// Default load address of injected CODE files
pub const DEFAULT_CODE_START: u32 = 0x8000;

const HIDDEN_FLAG: u8 = 0x80;
const PROTECTED_FLAG: u8 = 0x40;
const NAME_OFFSET: usize = 1;
const SECTORS_OFFSET: usize = 11;
const START_TRACK_OFFSET: usize = 13;
const START_SECTOR_OFFSET: usize = 14;
const SECTOR_MAP_OFFSET: usize = 15;

/// A file: one directory entry plus its data
#[derive(Debug, Clone)]
pub struct File {
    /// File type and its type-specific metadata
    pub kind: FileKind,
    /// Hidden flag
    pub hidden: bool,
    /// Write-protected flag
    pub protected: bool,
    /// Filename, up to 10 characters
    pub name: String,
    /// Track of the first data sector
    pub start_track: u8,
    /// Sector of the first data sector
    pub start_sector: u8,
    /// Data sectors owned by the file
    pub sector_map: SectorMap,
    /// Number of data sectors, as counted from the sector map
    pub sectors: usize,
    /// Date/time stamp (SAM types only)
    pub time: Option<NaiveDateTime>,
    /// Sub-directory holding the file (SAM types only)
    pub dir: Option<u8>,
    /// File data as stored in its sectors
    pub data: Vec<u8>,
    /// Directory entry the file was decoded from
    entry: [u8; DIR_ENTRY_SIZE],
}

impl File {
    /// Decode a 256-byte directory entry
    ///
    /// The data is left empty; it is read separately from the sector chain.
    pub fn from_dir(entry: &[u8]) -> Result<Self> {
        let entry: [u8; DIR_ENTRY_SIZE] = entry.try_into().map_err(|_| {
            MgtError::invalid_value(format!(
                "directory entry should be {} bytes, got {}",
                DIR_ENTRY_SIZE,
                entry.len()
            ))
        })?;

        let kind = FileKind::decode(&entry);
        let sector_map =
            SectorMap::from_bytes(&entry[SECTOR_MAP_OFFSET..SECTOR_MAP_OFFSET + SECTOR_MAP_BYTES]);

        // The stored sector count can disagree with the map; the map wins
        let sectors = sector_map.count();

        let (time, dir) = if kind.is_sam_type() {
            (Self::entry_time(&entry), Self::entry_dir(&kind, &entry))
        } else {
            (None, None)
        };

        Ok(Self {
            hidden: entry[0] & HIDDEN_FLAG != 0,
            protected: entry[0] & PROTECTED_FLAG != 0,
            name: Self::entry_name(&entry),
            start_track: entry[START_TRACK_OFFSET],
            start_sector: entry[START_SECTOR_OFFSET],
            sector_map,
            sectors,
            time,
            dir,
            data: Vec::new(),
            entry,
            kind,
        })
    }

    /// Build a SAM CODE file from raw bytes
    ///
    /// The data gains the 9-byte header SAM DOS expects at the start of a
    /// CODE file and is padded to whole sectors.
    pub fn from_code_bytes(
        data: &[u8],
        name: &str,
        start: u32,
        execute: Option<u32>,
    ) -> Result<Self> {
        let length = u32::try_from(data.len())
            .map_err(|_| MgtError::invalid_value(format!("length {} too large", data.len())))?;
        let kind = FileKind::Code {
            start,
            length,
            execute,
        };

        let mut file = Self::from_dir(&[0u8; DIR_ENTRY_SIZE])?;
        file.entry[0] = kind.code();
        kind.encode(&mut file.entry)?;
        file.kind = kind;
        file.name = name.to_string();
        file.write_name()?;

        let chunk = file.kind.allocation().bytes_per_sector();
        let mut payload = file.code_data_header().to_vec();
        payload.extend_from_slice(data);
        payload.resize(payload.len().div_ceil(chunk) * chunk, 0);

        file.sectors = payload.len() / chunk;
        file.data = payload;
        Ok(file)
    }

    /// Encode the directory entry for the file stored at the given location
    ///
    /// The header fields and sector map always describe the new location.
    /// Other fields are only written when they no longer match the entry
    /// the file was decoded from.
    pub fn to_dir(
        &self,
        start_track: u8,
        start_sector: u8,
        spt: u8,
        time_format: TimeFormat,
    ) -> Result<[u8; DIR_ENTRY_SIZE]> {
        let mut file = self.clone();
        if file.kind.is_free() {
            return Ok(file.entry);
        }

        let sectors = file.kind.allocation().sectors_for(file.data.len());
        let sector_count = u16::try_from(sectors).map_err(|_| MgtError::DiskFull)?;
        // The sector map has no slots past the end of a 10-sector geometry
        if sectors > 0 && slot_index(start_track, start_sector, spt) + sectors > SECTOR_MAP_BITS {
            return Err(MgtError::DiskFull);
        }
        let sector_map = SectorMap::contiguous(sectors, start_track, start_sector, spt);

        let mut flags = file.kind.code();
        if file.hidden {
            flags |= HIDDEN_FLAG;
        }
        if file.protected {
            flags |= PROTECTED_FLAG;
        }

        file.entry[0] = flags;
        file.write_name()?;
        file.entry[SECTORS_OFFSET..SECTORS_OFFSET + 2].copy_from_slice(&sector_count.to_be_bytes());
        file.entry[START_TRACK_OFFSET] = start_track;
        file.entry[START_SECTOR_OFFSET] = start_sector;
        file.entry[SECTOR_MAP_OFFSET..SECTOR_MAP_OFFSET + SECTOR_MAP_BYTES]
            .copy_from_slice(&sector_map.to_bytes());

        file.kind.encode(&mut file.entry)?;

        if file.kind.is_sam_type() {
            if file.dir != Self::entry_dir(&file.kind, &file.entry) {
                file.entry[PARENT_DIR] = file.dir.unwrap_or(0);
            }
            if file.time != Self::entry_time(&file.entry) {
                let packed = pack_time(file.time, time_format)?;
                file.entry[TIME..TIME + packed.len()].copy_from_slice(&packed);
            }
        }

        Ok(file.entry)
    }

    /// Get the directory entry the file was decoded from
    pub fn entry(&self) -> &[u8] {
        &self.entry
    }

    /// File length in bytes
    ///
    /// SPECIAL files report their whole sector run.
    pub fn length(&self) -> Option<u32> {
        match self.kind {
            FileKind::Special => Some(self.sectors as u32 * 512),
            _ => self.kind.length(),
        }
    }

    /// Sub-directory id of a directory, or the sub-directory holding a file
    pub fn sub_dir(&self) -> Option<u8> {
        match self.kind {
            FileKind::Dir { id } => Some(id),
            _ => self.dir,
        }
    }

    /// Check whether the file would boot from the first directory slot
    pub fn is_bootable(&self) -> bool {
        self.data
            .get(0x100..0x104)
            .map_or(false, |sig| sig.iter().map(|b| b & 0x5f).eq(*b"BOOT"))
    }

    /// Generate the 9-byte data header of a CODE file
    pub fn code_data_header(&self) -> [u8; 9] {
        let length = triple::from_len(self.kind.length().unwrap_or(0));
        let start = self.kind.start().map(triple::from_addr).unwrap_or([0; 3]);

        [
            self.kind.code(),
            length[1],
            length[2],
            start[1],
            start[2],
            0xff,
            0xff,
            length[0],
            start[0],
        ]
    }

    fn entry_name(entry: &[u8]) -> String {
        entry[NAME_OFFSET..NAME_OFFSET + MAX_NAME_LEN]
            .iter()
            .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
            .collect::<String>()
            .trim_end_matches([' ', '\0'])
            .to_string()
    }

    fn entry_time(entry: &[u8]) -> Option<NaiveDateTime> {
        unpack_time(&entry[TIME..TIME + 5])
    }

    fn entry_dir(kind: &FileKind, entry: &[u8]) -> Option<u8> {
        match kind {
            FileKind::Dir { .. } => None,
            _ => Some(entry[PARENT_DIR]).filter(|&dir| dir != 0x00 && dir != 0xff),
        }
    }

    fn write_name(&mut self) -> Result<()> {
        if self.name == Self::entry_name(&self.entry) {
            return Ok(());
        }
        if !self.name.is_ascii() || self.name.len() > MAX_NAME_LEN {
            return Err(MgtError::invalid_value(format!("invalid filename '{}'", self.name)));
        }

        let padded = format!("{:1$}", self.name, MAX_NAME_LEN);
        self.entry[NAME_OFFSET..NAME_OFFSET + MAX_NAME_LEN].copy_from_slice(padded.as_bytes());
        Ok(())
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut line = format!("{:10} {:4}  {}", self.name, self.sectors, self.kind.name());

        match &self.kind {
            FileKind::Basic { autorun: Some(line_no), .. }
            | FileKind::ZxBasic { autorun: Some(line_no), .. } => {
                line += &format!("{:6}", line_no);
            }
            FileKind::Code { .. } | FileKind::ZxCode { .. } => {
                let start = self.kind.start().unwrap_or(0);
                let length = self.kind.length().unwrap_or(0);
                line += &format!(" {:6},{}", start, length);
                if let Some(exec) = self.kind.execute() {
                    line += &format!(",{}", exec);
                }
            }
            FileKind::Screen { mode, .. } => line += &format!(" [mode {}]", mode),
            _ => {
                if let Some(var) = self.kind.data_var() {
                    line += &format!(" [{}]", var);
                }
            }
        }

        if let Some(time) = self.time {
            line = format!("{:43}{}", line, time.format("%d/%m/%Y %H:%M"));
        }
        write!(f, "{}", line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn code_entry() -> [u8; 256] {
        let mut entry = [0u8; 256];
        entry[0] = 0x13 | 0x40;
        entry[1..11].copy_from_slice(b"demo      ");
        entry[11..13].copy_from_slice(&[0, 99]);
        entry[13] = 4;
        entry[14] = 1;
        entry[15] = 0x07;
        entry[236..239].copy_from_slice(&triple::from_addr(0x8000));
        entry[239..242].copy_from_slice(&triple::from_len(1000));
        entry[242..245].copy_from_slice(&triple::from_exec(Some(0x8000)));
        entry[245..250].copy_from_slice(&[25, 12, 99, 8, 30]);
        entry
    }

    #[test]
    fn test_from_dir() {
        let file = File::from_dir(&code_entry()).unwrap();
        assert_eq!(file.name, "demo");
        assert!(file.protected);
        assert!(!file.hidden);
        assert_eq!(file.sectors, 3);
        assert_eq!(file.start_track, 4);
        assert_eq!(file.kind.start(), Some(0x8000));
        assert_eq!(file.length(), Some(1000));
        assert_eq!(file.kind.execute(), Some(0x8000));
        assert_eq!(
            file.time,
            NaiveDate::from_ymd_opt(1999, 12, 25).unwrap().and_hms_opt(8, 30, 0)
        );
        assert_eq!(file.dir, None);
    }

    #[test]
    fn test_from_dir_wrong_size() {
        assert!(matches!(File::from_dir(&[0u8; 255]), Err(MgtError::InvalidValue(_))));
        assert!(matches!(File::from_dir(&[0u8; 512]), Err(MgtError::InvalidValue(_))));
    }

    #[test]
    fn test_zx_types_have_no_time() {
        let mut entry = code_entry();
        entry[0] = 4;
        let file = File::from_dir(&entry).unwrap();
        assert_eq!(file.time, None);
        assert_eq!(file.dir, None);
    }

    #[test]
    fn test_parent_and_sub_dir() {
        let mut entry = code_entry();
        entry[254] = 3;
        assert_eq!(File::from_dir(&entry).unwrap().dir, Some(3));
        entry[254] = 0xff;
        assert_eq!(File::from_dir(&entry).unwrap().dir, None);

        let mut entry = [0u8; 256];
        entry[0] = 21;
        entry[250] = 9;
        let file = File::from_dir(&entry).unwrap();
        assert_eq!(file.sub_dir(), Some(9));
        assert_eq!(file.dir, None);
    }

    #[test]
    fn test_special_length_from_sectors() {
        let mut entry = [0u8; 256];
        entry[0] = 8;
        entry[15] = 0x0f;
        assert_eq!(File::from_dir(&entry).unwrap().length(), Some(2048));
    }

    #[test]
    fn test_to_dir_unchanged_entry() {
        let mut file = File::from_dir(&code_entry()).unwrap();
        file.data = vec![0; 3 * 510];

        let entry = file.to_dir(4, 1, 10, TimeFormat::Bdos).unwrap();
        let mut expected = code_entry();
        expected[11..13].copy_from_slice(&[0, 3]);
        assert_eq!(entry, expected);
    }

    #[test]
    fn test_to_dir_new_location() {
        let mut file = File::from_dir(&code_entry()).unwrap();
        file.data = vec![0; 1000];

        let entry = file.to_dir(10, 5, 10, TimeFormat::Bdos).unwrap();
        let decoded = File::from_dir(&entry).unwrap();
        assert_eq!(decoded.start_track, 10);
        assert_eq!(decoded.start_sector, 5);
        assert_eq!(decoded.sectors, 2);
        assert!(decoded.sector_map.is_set(64));
        assert!(decoded.sector_map.is_set(65));
    }

    #[test]
    fn test_to_dir_past_end_of_map() {
        let mut file = File::from_dir(&code_entry()).unwrap();
        file.data = vec![0; 3 * 510];

        let entry = file.to_dir(207, 8, 10, TimeFormat::Bdos).unwrap();
        assert_eq!(File::from_dir(&entry).unwrap().sectors, 3);
        assert!(matches!(
            file.to_dir(207, 9, 10, TimeFormat::Bdos),
            Err(MgtError::DiskFull)
        ));
    }

    #[test]
    fn test_to_dir_changed_fields() {
        let mut file = File::from_dir(&code_entry()).unwrap();
        file.name = "renamed".into();
        file.hidden = true;
        file.kind = FileKind::Code { start: 0x10000, length: 5, execute: None };
        file.time = None;
        file.dir = Some(2);

        let entry = file.to_dir(4, 1, 10, TimeFormat::Bdos).unwrap();
        assert_eq!(&entry[1..11], b"renamed   ");
        assert_eq!(&entry[245..250], &[0; 5]);

        let decoded = File::from_dir(&entry).unwrap();
        assert!(decoded.hidden);
        assert!(decoded.protected);
        assert_eq!(decoded.kind, file.kind);
        assert_eq!(decoded.time, None);
        assert_eq!(decoded.dir, Some(2));
    }

    #[test]
    fn test_to_dir_time_formats() {
        let time = NaiveDate::from_ymd_opt(2001, 2, 3).unwrap().and_hms_opt(4, 5, 0);
        let mut file = File::from_dir(&code_entry()).unwrap();
        file.time = time;

        let entry = file.to_dir(4, 1, 10, TimeFormat::MasterDos).unwrap();
        assert_eq!(&entry[245..250], &[3, 2, 1, 4, 5]);
        let entry = file.to_dir(4, 1, 10, TimeFormat::Bdos).unwrap();
        assert_eq!(&entry[245..250], &[3, 2, 101, 4, 5]);
        assert_eq!(File::from_dir(&entry).unwrap().time, time);
    }

    #[test]
    fn test_to_dir_rejects_bad_name() {
        let mut file = File::from_dir(&code_entry()).unwrap();
        file.name = "much too long".into();
        assert!(matches!(
            file.to_dir(4, 1, 10, TimeFormat::Bdos),
            Err(MgtError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_to_dir_free_entry_is_raw() {
        let mut entry = [0u8; 256];
        entry[1..5].copy_from_slice(b"gone");
        let file = File::from_dir(&entry).unwrap();
        assert_eq!(file.to_dir(20, 1, 10, TimeFormat::Bdos).unwrap(), entry);
    }

    #[test]
    fn test_from_code_bytes() {
        let file = File::from_code_bytes(&[0xAA; 600], "code", 0x8000, None).unwrap();
        assert_eq!(file.kind, FileKind::Code { start: 0x8000, length: 600, execute: None });
        assert_eq!(file.name, "code");
        assert_eq!(file.data.len(), 1020);
        assert_eq!(file.sectors, 2);
        assert_eq!(&file.data[..9], &[0x13, 0x58, 0x02, 0x00, 0x80, 0xff, 0xff, 0x00, 0x01]);
        assert_eq!(&file.data[9..609], &[0xAA; 600][..]);
        assert!(file.data[609..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_from_code_bytes_validation() {
        assert!(File::from_code_bytes(&[0; 10], "eleven chrs", 0x8000, None).is_err());
        assert!(File::from_code_bytes(&[0; 10], "low", 0x1000, None).is_err());
        assert!(File::from_code_bytes(&[0; 10], "exec", 0x8000, Some(0x80000)).is_err());
    }

    #[test]
    fn test_is_bootable() {
        let mut data = vec![0u8; 0x200];
        assert!(!File::from_code_bytes(&data, "x", 0x8000, None).unwrap().is_bootable());

        data[0x100 - 9..0x104 - 9].copy_from_slice(b"boot");
        let file = File::from_code_bytes(&data, "x", 0x8000, None).unwrap();
        assert!(file.is_bootable());

        let short = File::from_code_bytes(&[0; 4], "x", 0x8000, None).unwrap();
        assert!(!File { data: short.data[..0x20].to_vec(), ..short }.is_bootable());
    }

    #[test]
    fn test_display() {
        let file = File::from_dir(&code_entry()).unwrap();
        assert_eq!(
            file.to_string(),
            "demo          3  CODE  32768,1000,32768    25/12/1999 08:30"
        );

        let mut entry = [0u8; 256];
        entry[0] = 1;
        entry[1..11].copy_from_slice(b"prog      ");
        entry[218..220].copy_from_slice(&10u16.to_le_bytes());
        let file = File::from_dir(&entry).unwrap();
        assert_eq!(file.to_string(), "prog          0  ZX BASIC    10");

        let mut entry = [0u8; 256];
        entry[0] = 20;
        entry[1..11].copy_from_slice(b"screen    ");
        entry[221] = 3;
        entry[245] = 0xff;
        let file = File::from_dir(&entry).unwrap();
        assert_eq!(file.to_string(), "screen        0  SCREEN$ [mode 4]");
    }
}
