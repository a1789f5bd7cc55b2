//! Binary container size information: whether the image is PE32 or PE32+

use core::fmt;

use crate::error;

/// The size of a binary container
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Container {
    /// A 32-bit (PE32) image
    Little,
    /// A 64-bit (PE32+) image
    Big,
}

impl Container {
    /// The byte width of a pointer sized field (`ULONG_PTR`, `SIZE_T`) in this container
    pub fn pointer_size(self) -> usize {
        match self {
            Container::Little => 4,
            Container::Big => 8,
        }
    }

    /// The bitness of the container, `32` or `64`
    pub fn bitness(self) -> u32 {
        self.pointer_size() as u32 * 8
    }

    /// Maps a numeric bitness onto a container; anything but `32` or `64` is an error
    pub fn from_bitness(bitness: u32) -> error::Result<Self> {
        match bitness {
            32 => Ok(Container::Little),
            64 => Ok(Container::Big),
            other => Err(error::Error::InvalidBitness(other)),
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Container::Little => f.write_str("PE32"),
            Container::Big => f.write_str("PE32+"),
        }
    }
}
