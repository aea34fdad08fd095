//! Path-based transport of images and exported files

/// Reader implementation for image and exported files
pub mod reader;
/// Writer implementation for image and exported files
pub mod writer;

pub use reader::{import_file, read_image};
pub use writer::{export_file, write_image};

/// Magic bytes at the start of a gzip stream
pub const GZIP_SIGNATURE: &[u8; 2] = b"\x1f\x8b";
