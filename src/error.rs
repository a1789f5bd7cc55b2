//! A custom load configuration error

use core::result;

use thiserror::Error;

/// A custom load configuration error
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    /// The declared directory size is smaller than the smallest known structure
    #[error("Truncated load config: directory size {size:#x} is smaller than the minimum {minimum:#x}")]
    TruncatedStructure {
        /// The declared size of the directory
        size: u32,
        /// The size of the smallest known version for this container
        minimum: u32,
    },
    /// A field lies (partly) past the end of the supplied bytes
    #[error("Out of bounds read: {field} at {offset:#x} ({size} bytes) exceeds buffer of {len:#x} bytes")]
    OutOfBoundsRead {
        /// The name of the field being read
        field: &'static str,
        /// Offset of the field from the start of the directory
        offset: usize,
        /// Width of the field in bytes
        size: usize,
        /// Length of the supplied bytes
        len: usize,
    },
    /// The buffer is too short to hold the requested data
    #[error("Buffer is too short for {0} {1}")]
    BufferTooShort(usize, &'static str),
    /// The bitness is neither 32 nor 64
    #[error("Invalid bitness: {0}")]
    InvalidBitness(u32),
    /// An error emanating from reading and interpreting bytes
    #[error(transparent)]
    Scroll(#[from] scroll::Error),
}

/// An impish result
pub type Result<T> = result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use core::error::Error as _;
    use scroll::Pread;

    #[test]
    fn messages() {
        let err = Error::TruncatedStructure {
            size: 0x40,
            minimum: 0x48,
        };
        assert_eq!(
            err.to_string(),
            "Truncated load config: directory size 0x40 is smaller than the minimum 0x48"
        );
        let err = Error::OutOfBoundsRead {
            field: "security_cookie",
            offset: 0x58,
            size: 8,
            len: 0x40,
        };
        assert_eq!(
            err.to_string(),
            "Out of bounds read: security_cookie at 0x58 (8 bytes) exceeds buffer of 0x40 bytes"
        );
        assert_eq!(
            Error::BufferTooShort(0x60, "bytes for load config field").to_string(),
            "Buffer is too short for 96 bytes for load config field"
        );
        assert_eq!(Error::InvalidBitness(16).to_string(), "Invalid bitness: 16");
        assert!(err.source().is_none());
    }

    #[test]
    fn scroll_errors_convert() {
        let bytes = [0u8; 2];
        let scroll = bytes.pread_with::<u32>(0, scroll::LE).unwrap_err();
        let message = scroll.to_string();
        let err = Error::from(scroll);
        assert!(matches!(err, Error::Scroll(_)));
        assert_eq!(err.to_string(), message);
    }
}
