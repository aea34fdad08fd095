//! MGT filesystem: directory entries, file data chains and disk dialects
//!
//! The first `dir_tracks` tracks of side 0 hold the directory, two 256-byte
//! entries per sector. Everything after them is the data area, tracked by
//! a per-file sector map.

pub mod chain;
pub mod disk;
pub mod file;
pub mod file_type;
pub mod sector_map;
pub mod time;
pub mod triple;

pub use chain::{next_sector, read_payload, write_payload, Allocation};
pub use disk::{Disk, DiskType};
pub use file::{File, DEFAULT_CODE_START};
pub use file_type::FileKind;
pub use sector_map::{slot_index, SectorMap};
pub use time::{pack_time, unpack_time, TimeFormat};
