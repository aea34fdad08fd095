//! File types and their directory entry metadata
//!
//! The low 5 bits of an entry's first byte select the file type. Codes
//! 1-13 are ZX Spectrum (+D/DISCiPLE) types with 16-bit little-endian
//! fields; codes 16 and up are SAM types using page/offset triples.

use crate::error::{MgtError, Result};
use crate::filesystem::chain::Allocation;
use crate::filesystem::triple;

/// Byte offsets of the type-specific fields in a directory entry
pub mod offsets {
    /// OPENTYPE length bits 16-23
    pub const OPENTYPE_PAGES: usize = 210;
    /// ZX length
    pub const ZX_LENGTH: usize = 212;
    /// ZX start address
    pub const ZX_START: usize = 214;
    /// ZX array variable slot
    pub const ZX_VAR: usize = 216;
    /// ZX execute address or auto-run line
    pub const ZX_EXEC: usize = 218;
    /// SAM screen mode / array name length
    pub const SAM_TYPE_INFO: usize = 221;
    /// SAM array name
    pub const SAM_VAR_NAME: usize = 222;
    /// Maximum length of a SAM array name
    pub const SAM_VAR_NAME_LEN: usize = 10;
    /// SAM start address triple
    pub const SAM_START: usize = 236;
    /// SAM length triple
    pub const SAM_LENGTH: usize = 239;
    /// SAM execute address or auto-run line triple
    pub const SAM_EXEC: usize = 242;
    /// Packed date/time
    pub const TIME: usize = 245;
    /// Sub-directory id of a directory entry
    pub const DIR_ID: usize = 250;
    /// Sub-directory a SAM file lives in
    pub const PARENT_DIR: usize = 254;
}

use offsets::*;

/// Highest SAM address representable by a start triple
const SAM_ADDR_LIMIT: u32 = 0x4000 + 32 * 16384;

/// Largest SAM length or execute address representable by a triple
const SAM_LEN_LIMIT: u32 = 32 * 16384;

/// Auto-start lines from here up are reserved
const LINE_LIMIT: u16 = 0xff00;

/// A file type together with exactly the metadata that type carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    /// Free or erased directory slot (0)
    Free,
    /// ZX BASIC program (1)
    ZxBasic {
        /// Program start address
        start: u16,
        /// Program length
        length: u16,
        /// Auto-run line
        autorun: Option<u16>,
    },
    /// ZX numeric array (2)
    ZxNumberArray {
        /// Array start address
        start: u16,
        /// Array length
        length: u16,
        /// Variable letter
        var: char,
    },
    /// ZX string array (3)
    ZxStringArray {
        /// Array start address
        start: u16,
        /// Array length
        length: u16,
        /// Variable letter
        var: char,
    },
    /// ZX CODE (4)
    ZxCode {
        /// Load address
        start: u16,
        /// Code length
        length: u16,
        /// Execute address
        execute: Option<u16>,
    },
    /// ZX 48K snapshot (5)
    ZxSnapshot48k,
    /// ZX microdrive file (6)
    ZxMicrodrive,
    /// ZX SCREEN$ (7)
    ZxScreen {
        /// Load address
        start: u16,
        /// Screen length
        length: u16,
    },
    /// Special contiguous file (8)
    Special,
    /// ZX 128K snapshot (9)
    ZxSnapshot128k,
    /// OPENTYPE file (10)
    OpenType {
        /// 24-bit file length
        length: u32,
    },
    /// ZX EXECUTE (11)
    ZxExecute,
    /// UNIDOS directory (12)
    UnidosDir,
    /// UNIDOS create (13)
    UnidosCreate,
    /// SAM BASIC program (16)
    Basic {
        /// Program start address
        start: u32,
        /// Program length
        length: u32,
        /// Auto-run line
        autorun: Option<u16>,
    },
    /// SAM numeric array (17)
    NumberArray {
        /// Array start address
        start: u32,
        /// Array length
        length: u32,
        /// Variable name
        var: String,
    },
    /// SAM string array (18)
    StringArray {
        /// Array start address
        start: u32,
        /// Array length
        length: u32,
        /// Variable name, without the `$`
        var: String,
    },
    /// SAM CODE (19)
    Code {
        /// Load address
        start: u32,
        /// Code length
        length: u32,
        /// Execute address
        execute: Option<u32>,
    },
    /// SAM SCREEN$ (20)
    Screen {
        /// Load address
        start: u32,
        /// Screen length
        length: u32,
        /// Screen mode, 1-4
        mode: u8,
    },
    /// Sub-directory (21)
    Dir {
        /// Directory id
        id: u8,
    },
    /// Driver application (22)
    DriverApp {
        /// Load address
        start: u32,
        /// Driver length
        length: u32,
    },
    /// Driver boot file (23)
    DriverBoot {
        /// Load address
        start: u32,
        /// Driver length
        length: u32,
    },
    /// EDOS NOMEN (24)
    EdosNomen,
    /// EDOS system (25)
    EdosSystem,
    /// EDOS overlay (26)
    EdosOverlay,
    /// HDOS DOS (28)
    HdosDos,
    /// HDOS directory (29)
    HdosDir,
    /// HDOS disk (30)
    HdosDisk,
    /// HDOS temporary (31)
    HdosTemp,
    /// Unassigned type code (14, 15, 27)
    Unknown(u8),
}

impl FileKind {
    /// Decode the type and metadata of a 256-byte directory entry
    pub fn decode(entry: &[u8]) -> Self {
        Self::decode_as(entry[0] & 0x1f, entry)
    }

    /// Decode an entry's metadata as if it had the given type code
    pub fn decode_as(code: u8, entry: &[u8]) -> Self {
        let le = |offset: usize| u16::from_le_bytes([entry[offset], entry[offset + 1]]);
        let zx_start = le(ZX_START);
        let zx_length = le(ZX_LENGTH);
        let zx_var = char::from(0x60 + (entry[ZX_VAR] & 0x3f));

        let sam_start = triple::to_addr(&entry[SAM_START..]);
        let sam_length = triple::to_len(&entry[SAM_LENGTH..]);
        let sam_var = || {
            let len = (entry[SAM_TYPE_INFO] & 0x0f) as usize;
            String::from_utf8_lossy(&entry[SAM_VAR_NAME..SAM_VAR_NAME + len]).into_owned()
        };

        match code & 0x1f {
            0 => FileKind::Free,
            1 => FileKind::ZxBasic {
                start: zx_start,
                length: zx_length,
                autorun: (entry[ZX_EXEC + 1] != 0xff).then(|| le(ZX_EXEC)),
            },
            2 => FileKind::ZxNumberArray {
                start: zx_start,
                length: zx_length,
                var: zx_var,
            },
            3 => FileKind::ZxStringArray {
                start: zx_start,
                length: zx_length,
                var: zx_var,
            },
            4 => FileKind::ZxCode {
                start: zx_start,
                length: zx_length,
                execute: (entry[ZX_EXEC + 1] != 0x00).then(|| le(ZX_EXEC)),
            },
            5 => FileKind::ZxSnapshot48k,
            6 => FileKind::ZxMicrodrive,
            7 => FileKind::ZxScreen {
                start: zx_start,
                length: zx_length,
            },
            8 => FileKind::Special,
            9 => FileKind::ZxSnapshot128k,
            10 => FileKind::OpenType {
                length: (entry[OPENTYPE_PAGES] as u32) << 16 | zx_length as u32,
            },
            11 => FileKind::ZxExecute,
            12 => FileKind::UnidosDir,
            13 => FileKind::UnidosCreate,
            16 => FileKind::Basic {
                start: sam_start,
                length: sam_length,
                autorun: triple::to_line(&entry[SAM_EXEC..]),
            },
            17 => FileKind::NumberArray {
                start: sam_start,
                length: sam_length,
                var: sam_var(),
            },
            18 => FileKind::StringArray {
                start: sam_start,
                length: sam_length,
                var: sam_var(),
            },
            19 => FileKind::Code {
                start: sam_start,
                length: sam_length,
                execute: triple::to_exec(&entry[SAM_EXEC..]),
            },
            20 => FileKind::Screen {
                start: sam_start,
                length: sam_length,
                mode: 1 + (entry[SAM_TYPE_INFO] & 0x03),
            },
            21 => FileKind::Dir { id: entry[DIR_ID] },
            22 => FileKind::DriverApp {
                start: sam_start,
                length: sam_length,
            },
            23 => FileKind::DriverBoot {
                start: sam_start,
                length: sam_length,
            },
            24 => FileKind::EdosNomen,
            25 => FileKind::EdosSystem,
            26 => FileKind::EdosOverlay,
            28 => FileKind::HdosDos,
            29 => FileKind::HdosDir,
            30 => FileKind::HdosDisk,
            31 => FileKind::HdosTemp,
            other => FileKind::Unknown(other),
        }
    }

    /// Write this type's metadata into a directory entry
    ///
    /// Fields are only rewritten when they differ from what the entry
    /// already decodes to, so an untouched entry stays bit-identical.
    pub fn encode(&self, entry: &mut [u8]) -> Result<()> {
        if *self == Self::decode_as(self.code(), entry) {
            return Ok(());
        }

        match self {
            FileKind::ZxBasic { start, length, autorun } => {
                put_zx(entry, *start, *length);
                let exec = match autorun {
                    Some(line) => check_line(*line)?,
                    None => 0xffff,
                };
                put_le(entry, ZX_EXEC, exec);
            }
            FileKind::ZxNumberArray { start, length, var }
            | FileKind::ZxStringArray { start, length, var } => {
                put_zx(entry, *start, *length);
                let slot = (*var as u32)
                    .checked_sub(0x60)
                    .filter(|&slot| slot <= 0x3f)
                    .ok_or_else(|| MgtError::invalid_value(format!("invalid array variable '{}'", var)))?;
                entry[ZX_VAR] = (entry[ZX_VAR] & 0xc0) | slot as u8;
            }
            FileKind::ZxCode { start, length, execute } => {
                put_zx(entry, *start, *length);
                let exec = match execute {
                    Some(exec) if *exec < 0x100 => {
                        return Err(MgtError::invalid_value(format!(
                            "execute address {} is below 256",
                            exec
                        )))
                    }
                    Some(exec) => *exec,
                    None => 0,
                };
                put_le(entry, ZX_EXEC, exec);
            }
            FileKind::ZxScreen { start, length } => put_zx(entry, *start, *length),
            FileKind::OpenType { length } => {
                if *length > 0xff_ffff {
                    return Err(MgtError::invalid_value(format!("length {} too large", length)));
                }
                entry[OPENTYPE_PAGES] = (*length >> 16) as u8;
                put_le(entry, ZX_LENGTH, *length as u16);
            }
            FileKind::Basic { start, length, autorun } => {
                put_sam(entry, *start, *length)?;
                if let Some(line) = autorun {
                    check_line(*line)?;
                }
                entry[SAM_EXEC..SAM_EXEC + 3].copy_from_slice(&triple::from_line(*autorun));
            }
            FileKind::NumberArray { start, length, var }
            | FileKind::StringArray { start, length, var } => {
                put_sam(entry, *start, *length)?;
                if !var.is_ascii() || var.len() > SAM_VAR_NAME_LEN {
                    return Err(MgtError::invalid_value(format!("invalid array name '{}'", var)));
                }
                entry[SAM_TYPE_INFO] = (entry[SAM_TYPE_INFO] & 0xf0) | var.len() as u8;
                entry[SAM_VAR_NAME..SAM_VAR_NAME + var.len()].copy_from_slice(var.as_bytes());
            }
            FileKind::Code { start, length, execute } => {
                put_sam(entry, *start, *length)?;
                if let Some(exec) = execute.filter(|&exec| exec >= SAM_LEN_LIMIT) {
                    return Err(MgtError::invalid_value(format!(
                        "execute address {} out of range",
                        exec
                    )));
                }
                entry[SAM_EXEC..SAM_EXEC + 3].copy_from_slice(&triple::from_exec(*execute));
            }
            FileKind::Screen { start, length, mode } => {
                put_sam(entry, *start, *length)?;
                if !(1..=4).contains(mode) {
                    return Err(MgtError::invalid_value(format!("invalid screen mode {}", mode)));
                }
                entry[SAM_TYPE_INFO] = (entry[SAM_TYPE_INFO] & !0x03) | (mode - 1);
            }
            FileKind::Dir { id } => entry[DIR_ID] = *id,
            FileKind::DriverApp { start, length } | FileKind::DriverBoot { start, length } => {
                put_sam(entry, *start, *length)?
            }
            _ => {}
        }

        Ok(())
    }

    /// Get the 5-bit type code
    pub fn code(&self) -> u8 {
        match self {
            FileKind::Free => 0,
            FileKind::ZxBasic { .. } => 1,
            FileKind::ZxNumberArray { .. } => 2,
            FileKind::ZxStringArray { .. } => 3,
            FileKind::ZxCode { .. } => 4,
            FileKind::ZxSnapshot48k => 5,
            FileKind::ZxMicrodrive => 6,
            FileKind::ZxScreen { .. } => 7,
            FileKind::Special => 8,
            FileKind::ZxSnapshot128k => 9,
            FileKind::OpenType { .. } => 10,
            FileKind::ZxExecute => 11,
            FileKind::UnidosDir => 12,
            FileKind::UnidosCreate => 13,
            FileKind::Basic { .. } => 16,
            FileKind::NumberArray { .. } => 17,
            FileKind::StringArray { .. } => 18,
            FileKind::Code { .. } => 19,
            FileKind::Screen { .. } => 20,
            FileKind::Dir { .. } => 21,
            FileKind::DriverApp { .. } => 22,
            FileKind::DriverBoot { .. } => 23,
            FileKind::EdosNomen => 24,
            FileKind::EdosSystem => 25,
            FileKind::EdosOverlay => 26,
            FileKind::HdosDos => 28,
            FileKind::HdosDir => 29,
            FileKind::HdosDisk => 30,
            FileKind::HdosTemp => 31,
            FileKind::Unknown(code) => *code & 0x1f,
        }
    }

    /// Get the directory listing name of this type
    pub fn name(&self) -> &'static str {
        match self.code() {
            1 => "ZX BASIC",
            2 => "ZX DATA ()",
            3 => "ZX DATA $()",
            4 => "ZX CODE",
            5 => "ZX SNP 48K",
            6 => "ZX MDRV",
            7 => "ZX SCREEN$",
            8 => "SPECIAL",
            9 => "ZX SNP 128K",
            10 => "OPENTYPE",
            11 => "ZX EXECUTE",
            12 => "UNIDOS DIR",
            13 => "UNIDOS CREATE",
            16 => "BASIC",
            17 => "DATA ()",
            18 => "DATA $",
            19 => "CODE",
            20 => "SCREEN$",
            21 => "<DIR>",
            22 => "DRIVER APP",
            23 => "DRIVER BOOT",
            24 => "EDOS NOMEN",
            25 => "EDOS SYSTEM",
            26 => "EDOS OVERLAY",
            28 => "HDOS DOS",
            29 => "HDOS DIR",
            30 => "HDOS DISK",
            31 => "HDOS TEMP",
            _ => "WHAT?",
        }
    }

    /// Check for a free directory slot
    pub fn is_free(&self) -> bool {
        matches!(self, FileKind::Free)
    }

    /// Check if this is a SAM type (with timestamps and page/offset triples)
    pub fn is_sam_type(&self) -> bool {
        self.code() >= 16
    }

    /// How the file's data sectors are laid out
    pub fn allocation(&self) -> Allocation {
        match self {
            FileKind::Special | FileKind::UnidosDir => Allocation::Contiguous,
            _ => Allocation::Chained,
        }
    }

    /// Start address, for types that load to memory
    pub fn start(&self) -> Option<u32> {
        match self {
            FileKind::ZxBasic { start, .. }
            | FileKind::ZxNumberArray { start, .. }
            | FileKind::ZxStringArray { start, .. }
            | FileKind::ZxCode { start, .. }
            | FileKind::ZxScreen { start, .. } => Some(*start as u32),
            FileKind::Basic { start, .. }
            | FileKind::NumberArray { start, .. }
            | FileKind::StringArray { start, .. }
            | FileKind::Code { start, .. }
            | FileKind::Screen { start, .. }
            | FileKind::DriverApp { start, .. }
            | FileKind::DriverBoot { start, .. } => Some(*start),
            _ => None,
        }
    }

    /// Length stored in the entry or implied by the type
    ///
    /// SPECIAL files take their length from the sector count, which only
    /// the owning `File` knows.
    pub fn length(&self) -> Option<u32> {
        match self {
            FileKind::ZxBasic { length, .. }
            | FileKind::ZxNumberArray { length, .. }
            | FileKind::ZxStringArray { length, .. }
            | FileKind::ZxCode { length, .. }
            | FileKind::ZxScreen { length, .. } => Some(*length as u32),
            FileKind::ZxSnapshot48k => Some(0xc000),
            FileKind::ZxSnapshot128k => Some(0x20001),
            FileKind::ZxExecute => Some(510),
            FileKind::OpenType { length } => Some(*length),
            FileKind::Basic { length, .. }
            | FileKind::NumberArray { length, .. }
            | FileKind::StringArray { length, .. }
            | FileKind::Code { length, .. }
            | FileKind::Screen { length, .. }
            | FileKind::DriverApp { length, .. }
            | FileKind::DriverBoot { length, .. } => Some(*length),
            _ => None,
        }
    }

    /// Execute address of CODE files, or auto-run line of BASIC programs
    pub fn execute(&self) -> Option<u32> {
        match self {
            FileKind::ZxBasic { autorun, .. } | FileKind::Basic { autorun, .. } => {
                autorun.map(u32::from)
            }
            FileKind::ZxCode { execute, .. } => execute.map(u32::from),
            FileKind::Code { execute, .. } => *execute,
            _ => None,
        }
    }

    /// Array variable name, with a `$` suffix for string arrays
    pub fn data_var(&self) -> Option<String> {
        match self {
            FileKind::ZxNumberArray { var, .. } => Some(var.to_string()),
            FileKind::ZxStringArray { var, .. } => Some(format!("{}$", var)),
            FileKind::NumberArray { var, .. } => Some(var.clone()),
            FileKind::StringArray { var, .. } => Some(format!("{}$", var)),
            _ => None,
        }
    }

    /// Screen mode of SAM screens
    pub fn screen_mode(&self) -> Option<u8> {
        match self {
            FileKind::Screen { mode, .. } => Some(*mode),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn put_le(entry: &mut [u8], offset: usize, value: u16) {
    entry[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_zx(entry: &mut [u8], start: u16, length: u16) {
    put_le(entry, ZX_START, start);
    put_le(entry, ZX_LENGTH, length);
}

fn put_sam(entry: &mut [u8], start: u32, length: u32) -> Result<()> {
    if !(0x4000..SAM_ADDR_LIMIT).contains(&start) {
        return Err(MgtError::invalid_value(format!("start address {} out of range", start)));
    }
    if length >= SAM_LEN_LIMIT {
        return Err(MgtError::invalid_value(format!("length {} too large", length)));
    }
    entry[SAM_START..SAM_START + 3].copy_from_slice(&triple::from_addr(start));
    entry[SAM_LENGTH..SAM_LENGTH + 3].copy_from_slice(&triple::from_len(length));
    Ok(())
}

fn check_line(line: u16) -> Result<u16> {
    if line >= LINE_LIMIT {
        return Err(MgtError::invalid_value("line should be >=0 and < 65280"));
    }
    Ok(line)
}
