//! Error types and Result alias

use thiserror::Error;

/// Result type alias for MGT disk operations
pub type Result<T> = std::result::Result<T, MgtError>;

/// Errors that can occur when working with MGT disks and images
#[derive(Debug, Error)]
pub enum MgtError {
    /// I/O error occurred while reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Track or sector outside the physical geometry, or a broken chain pointer
    #[error("Invalid sector location: track {track} sector {sector}")]
    InvalidSector {
        /// Track number (bit 7 selects side 1)
        track: u8,
        /// Sector number (1-based)
        sector: u8,
    },

    /// Byte length matches no known container layout
    #[error("Unsupported disk image: {size} bytes")]
    UnsupportedFormat {
        /// Size of the rejected image data
        size: usize,
    },

    /// More files than directory slots
    #[error("Too many files for directory (max {max})")]
    TooManyFiles {
        /// Number of directory slots available
        max: usize,
    },

    /// Data area is out of space
    #[error("Disk full: data area is out of space")]
    DiskFull,

    /// A value passed across the API boundary is out of range
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Filename pattern could not be compiled
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] globset::Error),

    /// Operation needs at least one file
    #[error("No files on disk")]
    NoFiles,
}

impl MgtError {
    /// Create an invalid sector error
    pub fn sector(track: u8, sector: u8) -> Self {
        MgtError::InvalidSector { track, sector }
    }

    /// Create an invalid value error
    pub fn invalid_value<S: Into<String>>(message: S) -> Self {
        MgtError::InvalidValue(message.into())
    }

    /// True for errors raised before writing because the disk has no room
    pub fn is_capacity(&self) -> bool {
        matches!(self, MgtError::TooManyFiles { .. } | MgtError::DiskFull)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MgtError::sector(208, 1);
        assert_eq!(err.to_string(), "Invalid sector location: track 208 sector 1");

        let err = MgtError::UnsupportedFormat { size: 1234 };
        assert_eq!(err.to_string(), "Unsupported disk image: 1234 bytes");
    }

    #[test]
    fn test_invalid_value() {
        let err = MgtError::invalid_value("line should be >=0 and < 65280");
        assert_eq!(err.to_string(), "Invalid value: line should be >=0 and < 65280");
    }

    #[test]
    fn test_is_capacity() {
        assert!(MgtError::DiskFull.is_capacity());
        assert!(MgtError::TooManyFiles { max: 80 }.is_capacity());
        assert!(!MgtError::NoFiles.is_capacity());
    }
}
