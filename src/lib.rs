/*!
# mgtdisk

A Rust library for reading and writing MGT format floppy disk images, as used
by the SAM Coupé and the +D/DISCiPLE interfaces for the ZX Spectrum.

## Features

- Raw MGT, SAD and Extended DSK containers, optionally gzip-compressed
- SAM DOS, MasterDOS and BDOS directory dialects
- All SAM and +D file types, with typed metadata per type
- Lossless directory entry round-trips
- CODE file injection

## Quick Start

```rust,no_run
use mgtdisk::{ContainerKind, Disk};

// Open an existing disk image
let mut disk = Disk::open("disk.mgt.gz")?;
println!("{}", disk);

// Replace a file with new CODE
disk.delete("game*")?;
disk.add_code_file("game.bin", None, None)?;

// Save as raw MGT, or pick another container
disk.save("new.mgt", false, 10)?;
let image = disk.to_image_as(ContainerKind::Edsk, 10)?;
# Ok::<(), mgtdisk::MgtError>(())
```

## Disk Layout

80 tracks on each of 2 sides, 9 or 10 sectors of 512 bytes per track.
Track numbers 128-207 address side 1. The first 4 tracks (up to 39 on
MasterDOS) hold the directory; files live in the data area after it.

## Modules

- `format`: container kinds, geometry constants and sector addressing
- `image`: the in-memory disk image (DiskImage) and its builder
- `filesystem`: directory entries, sector chains and the logical Disk
- `io`: reading and writing image files
- `error`: Error types and Result alias
*/

#![warn(missing_docs)]

/// Error types and Result alias
pub mod error;
/// Filesystem: files, directory entries and disks
pub mod filesystem;
/// Container formats and constants
pub mod format;
/// Disk image container
pub mod image;
/// I/O operations for reading and writing image files
pub mod io;

// Re-export common types
pub use error::{MgtError, Result};
pub use filesystem::{
    Allocation, Disk, DiskType, File, FileKind, SectorMap, TimeFormat, DEFAULT_CODE_START,
};
pub use format::{detect_format, ContainerKind};
pub use image::{DiskImage, DiskImageBuilder};
pub use io::{export_file, import_file, read_image, write_image};
