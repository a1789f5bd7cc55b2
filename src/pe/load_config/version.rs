//! Load config directory versions and the size based version selector.
//!
//! The directory has no version field. Every toolchain release that grew the structure
//! appended fields to the end of it, so the declared size is the only signal of which
//! layout is present.

use core::fmt;

use log::debug;

use crate::container::Container;
use crate::error;

/// A known layout of the load config directory, ordered from oldest to newest.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoadConfigVersion {
    /// Base fields plus the SafeSEH handler table.
    V0,
    /// Control Flow Guard check/dispatch pointers, function table and guard flags.
    V1,
    /// Code integrity.
    V2,
    /// Address-taken IAT and long jump target tables.
    V3,
    /// Dynamic value relocation table and hybrid metadata pointer.
    V4,
    /// Return flow guard failure routines and the dynamic value relocation table location.
    V5,
    /// Return flow guard stack pointer verification and the hot patch table.
    V6,
    /// Enclave configuration.
    V7,
}

/// `(32-bit size, 64-bit size)` of each version, in version order
const STRUCTURE_SIZES: [(u32, u32); 8] = [
    (72, 112),
    (92, 148),
    (104, 160),
    (120, 192),
    (128, 208),
    (144, 232),
    (152, 244),
    (160, 256),
];

impl LoadConfigVersion {
    /// Every known version, oldest first.
    pub const ALL: [LoadConfigVersion; 8] = [
        LoadConfigVersion::V0,
        LoadConfigVersion::V1,
        LoadConfigVersion::V2,
        LoadConfigVersion::V3,
        LoadConfigVersion::V4,
        LoadConfigVersion::V5,
        LoadConfigVersion::V6,
        LoadConfigVersion::V7,
    ];

    /// The newest version this crate knows the layout of.
    pub const LATEST: LoadConfigVersion = LoadConfigVersion::V7;

    /// The version number, `0` for [`LoadConfigVersion::V0`] and so on.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Returns the version with the given number, if it is known.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// The Windows build that introduced this layout.
    pub fn build(self) -> &'static str {
        match self {
            LoadConfigVersion::V0 => "SEH",
            LoadConfigVersion::V1 => "Windows 8.1",
            LoadConfigVersion::V2 => "Windows 10.0.9879",
            LoadConfigVersion::V3 => "Windows 10.0.14286",
            LoadConfigVersion::V4 => "Windows 10.0.14383",
            LoadConfigVersion::V5 => "Windows 10.0.14901",
            LoadConfigVersion::V6 => "Windows 10.0.15002",
            LoadConfigVersion::V7 => "Windows 10.0.16237",
        }
    }

    /// Size in bytes of this version's structure in the given container.
    pub fn structure_size(self, container: Container) -> u32 {
        let (size32, size64) = STRUCTURE_SIZES[self as usize];
        match container {
            Container::Little => size32,
            Container::Big => size64,
        }
    }

    /// Selects the newest version whose structure fits in `directory_size` bytes.
    ///
    /// Sizes in between two known versions select the older one, and sizes beyond the
    /// newest known version select [`LoadConfigVersion::LATEST`]; the surplus bytes are
    /// simply not consumed. Only a size below the smallest version is an error.
    pub fn select(directory_size: u32, container: Container) -> error::Result<Self> {
        let version = Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|version| version.structure_size(container) <= directory_size)
            .ok_or(error::Error::TruncatedStructure {
                size: directory_size,
                minimum: LoadConfigVersion::V0.structure_size(container),
            })?;
        debug!(
            "{} load config of {:#x} bytes selects {} ({} bytes)",
            container,
            directory_size,
            version,
            version.structure_size(container)
        );
        Ok(version)
    }
}

impl fmt::Display for LoadConfigVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "V{}", self.index())
    }
}
