//! The PE load configuration directory.
//!
//! The directory carries toolchain and OS specific security metadata: the `/GS` security
//! cookie, the SafeSEH handler table, Control Flow Guard tables, dynamic relocation info.
//! Its layout has grown with almost every Windows release, each release appending fields to
//! the end of the structure, and the only indication of which layout is present is the
//! declared size.
//!
//! [`LoadConfigData::parse`] picks the newest [`LoadConfigVersion`] whose structure fits the
//! declared size and decodes a [`LoadConfig`] holding exactly that version's fields.
//!
//! ```rust
//! use pe_loadconfig::container::Container;
//! use pe_loadconfig::pe::load_config::{LoadConfigData, LoadConfigField, LoadConfigVersion};
//!
//! let c = Container::Big;
//! let mut bytes = [0u8; 232];
//! LoadConfigField::SecurityCookie.write(&mut bytes, c, 0x1_4000_3000).unwrap();
//!
//! let data = LoadConfigData::parse(&bytes, bytes.len() as u32, c).unwrap();
//! assert_eq!(data.version(), LoadConfigVersion::V5);
//! assert_eq!(data.config.base().security_cookie, 0x1_4000_3000);
//! assert!(data.config.v5().is_some());
//! assert!(data.config.v6().is_none());
//! ```

use core::fmt;
use core::hash::{Hash, Hasher};

use log::{debug, warn};
use scroll::Pread;

use crate::container::Container;
use crate::error;

pub mod field;
pub mod record;
pub mod version;

pub use self::field::{FieldKind, LoadConfigField, fields_of};
pub use self::record::*;
pub use self::version::LoadConfigVersion;

// GuardFlags: bitflags for LoadConfigV1::guard_flags.

/// Indicate that the module performs control flow integrity checks using system-supplied support.
pub const IMAGE_GUARD_CF_INSTRUMENTED: u32 = 0x0000_0100;
/// Indicate that the module performs control flow and write integrity checks.
pub const IMAGE_GUARD_CFW_INSTRUMENTED: u32 = 0x0000_0200;
/// Indicate that the module contains valid control flow target metadata.
pub const IMAGE_GUARD_CF_FUNCTION_TABLE_PRESENT: u32 = 0x0000_0400;
/// Indicate that the module does not make use of the /GS security cookie.
pub const IMAGE_GUARD_SECURITY_COOKIE_UNUSED: u32 = 0x0000_0800;
/// Indicate that the module supports read-only delay load IAT.
pub const IMAGE_GUARD_PROTECT_DELAYLOAD_IAT: u32 = 0x0000_1000;
/// Indicate that the delay-load import table is in its own .didat section that can be freely reprotected.
pub const IMAGE_GUARD_DELAYLOAD_IAT_IN_ITS_OWN_SECTION: u32 = 0x0000_2000;
/// Indicate that the module contains suppressed export information and the address-taken IAT table is present.
pub const IMAGE_GUARD_CF_EXPORT_SUPPRESSION_INFO_PRESENT: u32 = 0x0000_4000;
/// Indicate that the module enables suppression of exports.
pub const IMAGE_GUARD_CF_ENABLE_EXPORT_SUPPRESSION: u32 = 0x0000_8000;
/// Indicate that the module contains longjmp target information.
pub const IMAGE_GUARD_CF_LONGJUMP_TABLE_PRESENT: u32 = 0x0001_0000;
/// Indicate that the module contains return flow instrumentation and metadata.
pub const IMAGE_GUARD_RF_INSTRUMENTED: u32 = 0x0002_0000;
/// Indicate that the module requests the OS to enable return flow protection.
pub const IMAGE_GUARD_RF_ENABLE: u32 = 0x0004_0000;
/// Indicate that the module requests the OS to enable return flow protection in strict mode.
pub const IMAGE_GUARD_RF_STRICT: u32 = 0x0008_0000;
/// Indicate that the module was built with retpoline support.
pub const IMAGE_GUARD_RETPOLINE_PRESENT: u32 = 0x0010_0000;
/// Indicate that the module contains EH continuation target information.
pub const IMAGE_GUARD_EH_CONTINUATION_TABLE_PRESENT: u32 = 0x0040_0000;
/// Indicate that the module was built with XFG (Cross Function Guard), now deprecated.
pub const IMAGE_GUARD_XFG_ENABLED: u32 = 0x0080_0000;
/// Indicate that the module has CastGuard instrumentation present.
pub const IMAGE_GUARD_CASTGUARD_PRESENT: u32 = 0x0100_0000;
/// Indicate that the module has Guarded Memcpy instrumentation present.
pub const IMAGE_GUARD_MEMCPY_PRESENT: u32 = 0x0200_0000;

/// A decoded load config directory of a particular version.
///
/// The version is fixed when the value is built and is part of its identity: two configs
/// of different versions never compare equal, even if every field they share matches.
/// Fields a version does not define are absent rather than zero; [`LoadConfig::get`]
/// returns `None` for them and the typed accessors for later versions return `None`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoadConfig {
    V0(LoadConfigV0),
    V1(LoadConfigV1),
    V2(LoadConfigV2),
    V3(LoadConfigV3),
    V4(LoadConfigV4),
    V5(LoadConfigV5),
    V6(LoadConfigV6),
    V7(LoadConfigV7),
}

impl LoadConfig {
    /// Creates a zeroed config of the given version.
    pub fn new(version: LoadConfigVersion) -> Self {
        match version {
            LoadConfigVersion::V0 => LoadConfig::V0(Default::default()),
            LoadConfigVersion::V1 => LoadConfig::V1(Default::default()),
            LoadConfigVersion::V2 => LoadConfig::V2(Default::default()),
            LoadConfigVersion::V3 => LoadConfig::V3(Default::default()),
            LoadConfigVersion::V4 => LoadConfig::V4(Default::default()),
            LoadConfigVersion::V5 => LoadConfig::V5(Default::default()),
            LoadConfigVersion::V6 => LoadConfig::V6(Default::default()),
            LoadConfigVersion::V7 => LoadConfig::V7(Default::default()),
        }
    }

    /// The version of this config.
    pub fn version(&self) -> LoadConfigVersion {
        match self {
            LoadConfig::V0(_) => LoadConfigVersion::V0,
            LoadConfig::V1(_) => LoadConfigVersion::V1,
            LoadConfig::V2(_) => LoadConfigVersion::V2,
            LoadConfig::V3(_) => LoadConfigVersion::V3,
            LoadConfig::V4(_) => LoadConfigVersion::V4,
            LoadConfig::V5(_) => LoadConfigVersion::V5,
            LoadConfig::V6(_) => LoadConfigVersion::V6,
            LoadConfig::V7(_) => LoadConfigVersion::V7,
        }
    }

    /// The fields shared by every version.
    pub fn base(&self) -> &LoadConfigBase {
        self.v0()
    }

    /// The fields shared by every version, mutably.
    pub fn base_mut(&mut self) -> &mut LoadConfigBase {
        self.v0_mut()
    }

    /// The version 0 view; every config has one.
    pub fn v0(&self) -> &LoadConfigV0 {
        match self {
            LoadConfig::V0(c) => c,
            LoadConfig::V1(c) => c,
            LoadConfig::V2(c) => c,
            LoadConfig::V3(c) => c,
            LoadConfig::V4(c) => c,
            LoadConfig::V5(c) => c,
            LoadConfig::V6(c) => c,
            LoadConfig::V7(c) => c,
        }
    }

    /// The version 0 view, mutably.
    pub fn v0_mut(&mut self) -> &mut LoadConfigV0 {
        match self {
            LoadConfig::V0(c) => c,
            LoadConfig::V1(c) => c,
            LoadConfig::V2(c) => c,
            LoadConfig::V3(c) => c,
            LoadConfig::V4(c) => c,
            LoadConfig::V5(c) => c,
            LoadConfig::V6(c) => c,
            LoadConfig::V7(c) => c,
        }
    }

    /// The version 1 view, if this config is version 1 or later.
    pub fn v1(&self) -> Option<&LoadConfigV1> {
        match self {
            LoadConfig::V1(c) => Some(c),
            _ => self.v2().map(|c| &c.base),
        }
    }

    /// The version 2 view, if this config is version 2 or later.
    pub fn v2(&self) -> Option<&LoadConfigV2> {
        match self {
            LoadConfig::V2(c) => Some(c),
            _ => self.v3().map(|c| &c.base),
        }
    }

    /// The version 3 view, if this config is version 3 or later.
    pub fn v3(&self) -> Option<&LoadConfigV3> {
        match self {
            LoadConfig::V3(c) => Some(c),
            _ => self.v4().map(|c| &c.base),
        }
    }

    /// The version 4 view, if this config is version 4 or later.
    pub fn v4(&self) -> Option<&LoadConfigV4> {
        match self {
            LoadConfig::V4(c) => Some(c),
            _ => self.v5().map(|c| &c.base),
        }
    }

    /// The version 5 view, if this config is version 5 or later.
    pub fn v5(&self) -> Option<&LoadConfigV5> {
        match self {
            LoadConfig::V5(c) => Some(c),
            _ => self.v6().map(|c| &c.base),
        }
    }

    /// The version 6 view, if this config is version 6 or later.
    pub fn v6(&self) -> Option<&LoadConfigV6> {
        match self {
            LoadConfig::V6(c) => Some(c),
            _ => self.v7().map(|c| &c.base),
        }
    }

    /// The version 7 view, if this config is version 7.
    pub fn v7(&self) -> Option<&LoadConfigV7> {
        match self {
            LoadConfig::V7(c) => Some(c),
            _ => None,
        }
    }

    /// The version 1 view, mutably.
    pub fn v1_mut(&mut self) -> Option<&mut LoadConfigV1> {
        match self {
            LoadConfig::V1(c) => Some(c),
            other => other.v2_mut().map(|c| &mut c.base),
        }
    }

    /// The version 2 view, mutably.
    pub fn v2_mut(&mut self) -> Option<&mut LoadConfigV2> {
        match self {
            LoadConfig::V2(c) => Some(c),
            other => other.v3_mut().map(|c| &mut c.base),
        }
    }

    /// The version 3 view, mutably.
    pub fn v3_mut(&mut self) -> Option<&mut LoadConfigV3> {
        match self {
            LoadConfig::V3(c) => Some(c),
            other => other.v4_mut().map(|c| &mut c.base),
        }
    }

    /// The version 4 view, mutably.
    pub fn v4_mut(&mut self) -> Option<&mut LoadConfigV4> {
        match self {
            LoadConfig::V4(c) => Some(c),
            other => other.v5_mut().map(|c| &mut c.base),
        }
    }

    /// The version 5 view, mutably.
    pub fn v5_mut(&mut self) -> Option<&mut LoadConfigV5> {
        match self {
            LoadConfig::V5(c) => Some(c),
            other => other.v6_mut().map(|c| &mut c.base),
        }
    }

    /// The version 6 view, mutably.
    pub fn v6_mut(&mut self) -> Option<&mut LoadConfigV6> {
        match self {
            LoadConfig::V6(c) => Some(c),
            other => other.v7_mut().map(|c| &mut c.base),
        }
    }

    /// The version 7 view, mutably.
    pub fn v7_mut(&mut self) -> Option<&mut LoadConfigV7> {
        match self {
            LoadConfig::V7(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the raw value of `field`, or `None` if this config's version does not define it.
    pub fn get(&self, field: LoadConfigField) -> Option<u64> {
        match self {
            LoadConfig::V0(c) => c.get(field),
            LoadConfig::V1(c) => c.get(field),
            LoadConfig::V2(c) => c.get(field),
            LoadConfig::V3(c) => c.get(field),
            LoadConfig::V4(c) => c.get(field),
            LoadConfig::V5(c) => c.get(field),
            LoadConfig::V6(c) => c.get(field),
            LoadConfig::V7(c) => c.get(field),
        }
    }

    /// Stores `value` into `field`, keeping the low-order bytes that fit the field.
    ///
    /// Returns `false` and leaves the config untouched if its version does not define the
    /// field.
    pub fn set(&mut self, field: LoadConfigField, value: u64) -> bool {
        match self {
            LoadConfig::V0(c) => c.set(field, value),
            LoadConfig::V1(c) => c.set(field, value),
            LoadConfig::V2(c) => c.set(field, value),
            LoadConfig::V3(c) => c.set(field, value),
            LoadConfig::V4(c) => c.set(field, value),
            LoadConfig::V5(c) => c.set(field, value),
            LoadConfig::V6(c) => c.set(field, value),
            LoadConfig::V7(c) => c.set(field, value),
        }
    }

    /// Iterates `(field, value)` over exactly the fields of this config's version, base
    /// fields first and then each version's additions in order.
    pub fn fields(&self) -> impl Iterator<Item = (LoadConfigField, u64)> + '_ {
        fields_of(self.version()).filter_map(move |field| Some((field, self.get(field)?)))
    }
}

impl Hash for LoadConfig {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.version().hash(state);
        for (_, value) in self.fields() {
            value.hash(state);
        }
    }
}

impl fmt::Display for LoadConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (field, value) in self.fields() {
            writeln!(f, "{:<46} = {:#x}", field.name(), value)?;
        }
        Ok(())
    }
}

/// A load config directory decoded from raw bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LoadConfigData {
    /// The decoded config.
    pub config: LoadConfig,
    /// The bitness the directory was decoded with.
    pub container: Container,
    /// The size the directory declared, which selected the version.
    pub directory_size: u32,
    /// The field with the lowest offset that lay past the end of the supplied bytes, if any.
    ///
    /// This field and every field at a higher offset were left zeroed.
    pub missing: Option<LoadConfigField>,
}

impl LoadConfigData {
    /// Decodes the load config directory in `bytes`, whose data directory entry declares
    /// `directory_size` bytes.
    ///
    /// A declared size below the smallest known structure is an error. A declared size that
    /// reaches past `bytes` is not: fields within `bytes` are decoded, the rest are left
    /// zeroed and recorded in [`LoadConfigData::missing`].
    pub fn parse(bytes: &[u8], directory_size: u32, container: Container) -> error::Result<Self> {
        let version = LoadConfigVersion::select(directory_size, container)?;
        let structure_size = version.structure_size(container);
        if directory_size > structure_size {
            debug!(
                "{:#x} trailing load config bytes beyond {} are not consumed",
                directory_size - structure_size,
                version
            );
        }

        // 32-bit heap flags precede the affinity mask: canonical order is not offset order
        let mut config = LoadConfig::new(version);
        let mut missing: Option<LoadConfigField> = None;
        for field in fields_of(version) {
            match field.read(bytes, container) {
                Ok(value) => {
                    config.set(field, value);
                }
                Err(error::Error::OutOfBoundsRead { .. }) => {
                    if missing.is_none_or(|m| field.offset(container) < m.offset(container)) {
                        missing = Some(field);
                    }
                }
                Err(err) => return Err(err),
            }
        }
        if let Some(field) = missing {
            warn!(
                "load config is partially decoded: {} bytes supplied, {} at {:#x} and later fields are missing",
                bytes.len(),
                field.name(),
                field.offset(container)
            );
        }

        Ok(LoadConfigData {
            config,
            container,
            directory_size,
            missing,
        })
    }

    /// Decodes the load config directory in `bytes`, taking the declared size from the
    /// structure's own leading `Size` member, as the Windows loader does.
    pub fn parse_size_field(bytes: &[u8], container: Container) -> error::Result<Self> {
        let size = bytes
            .pread_with::<u32>(0, scroll::LE)
            .map_err(|_| error::Error::OutOfBoundsRead {
                field: LoadConfigField::Characteristics.name(),
                offset: 0,
                size: 4,
                len: bytes.len(),
            })?;
        Self::parse(bytes, size, container)
    }

    /// The version selected by the declared size.
    pub fn version(&self) -> LoadConfigVersion {
        self.config.version()
    }

    /// The size of the selected version's structure.
    pub fn structure_size(&self) -> u32 {
        self.version().structure_size(self.container)
    }

    /// Declared bytes beyond the selected version's structure, which were not decoded.
    pub fn unconsumed_size(&self) -> u32 {
        self.directory_size.saturating_sub(self.structure_size())
    }

    /// Whether the supplied bytes ended before the declared structure did.
    pub fn is_partial(&self) -> bool {
        self.missing.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    use rand::Rng;
    use rstest::rstest;

    const LOADCONFIG64_DATA0: &[u8; 320] = &[
        0x40, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x98, 0x45,
        0x1E, 0x80, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x12, 0x1E, 0x80, 0x01, 0x00, 0x00, 0x00,
        0x00, 0x50, 0x1E, 0x80, 0x01, 0x00, 0x00, 0x00, 0xA0, 0x02, 0x17, 0x80, 0x01, 0x00, 0x00,
        0x00, 0x87, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x75, 0x41, 0x10, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xA0,
        0x06, 0x00, 0x00, 0x0F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x38, 0xFF, 0x16, 0x80, 0x01, 0x00,
        0x00, 0x00, 0xAE, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x08, 0x50, 0x1E, 0x80, 0x01,
        0x00, 0x00, 0x00, 0x10, 0x50, 0x1E, 0x80, 0x01, 0x00, 0x00, 0x00, 0x18, 0x50, 0x1E, 0x80,
        0x01, 0x00, 0x00, 0x00, 0x20, 0x50, 0x1E, 0x80, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    const LOADCONFIG32_DATA0: &[u8; 192] = &[
        0xBC, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x08, 0xD0, 0x41, 0x00, 0xD4, 0xB6, 0x41, 0x00, 0x10, 0x00, 0x00, 0x00, 0x70, 0x51, 0x41,
        0x00, 0x00, 0x00, 0x00, 0x00, 0xBC, 0x51, 0x41, 0x00, 0x3F, 0x00, 0x00, 0x00, 0x00, 0x75,
        0x01, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0xD4, 0xDC, 0x41, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    fn hash_of(config: &LoadConfig) -> u64 {
        let mut hasher = DefaultHasher::new();
        config.hash(&mut hasher);
        hasher.finish()
    }

    fn randomize(config: &mut LoadConfig, rng: &mut impl Rng) {
        for field in fields_of(config.version()) {
            assert!(config.set(field, rng.random()));
        }
    }

    #[test]
    fn parse_loadconfig64_data0() {
        let data = LoadConfigData::parse_size_field(LOADCONFIG64_DATA0, Container::Big).unwrap();
        assert_eq!(data.directory_size, 320);
        assert_eq!(data.version(), LoadConfigVersion::V7);
        assert_eq!(data.structure_size(), 256);
        assert_eq!(data.unconsumed_size(), 64);
        assert!(!data.is_partial());

        let config = data.config;
        let base = config.base();
        assert_eq!(base.characteristics, 320);
        assert_eq!(base.timedatestamp, 0);
        assert_eq!(base.major_version, 0);
        assert_eq!(base.process_heap_flags, 0);
        // LOAD_LIBRARY_SEARCH_SYSTEM32
        assert_eq!(base.reserved1, 0x800);
        assert_eq!(base.security_cookie, 0x1801e4598);

        let v0 = config.v0();
        assert_eq!(v0.se_handler_table, 0);
        assert_eq!(v0.se_handler_count, 0);

        let v1 = config.v1().unwrap();
        assert_eq!(v1.guard_cf_check_function_pointer, 0x1801e1218);
        assert_eq!(v1.guard_cf_dispatch_function_pointer, 0x1801e5000);
        assert_eq!(v1.guard_cf_function_table, 0x1801702a0);
        assert_eq!(v1.guard_cf_function_count, 2183);
        // Instrumented, Function table, Delay-load IAT protected, Delay-load private section,
        // Export information suppression, Longjump table, EH continuation table
        assert_eq!(v1.guard_flags, 0x10417500);
        const FLAGS: u32 = IMAGE_GUARD_CF_INSTRUMENTED
            | IMAGE_GUARD_CF_FUNCTION_TABLE_PRESENT
            | IMAGE_GUARD_PROTECT_DELAYLOAD_IAT
            | IMAGE_GUARD_DELAYLOAD_IAT_IN_ITS_OWN_SECTION
            | IMAGE_GUARD_CF_EXPORT_SUPPRESSION_INFO_PRESENT
            | IMAGE_GUARD_CF_LONGJUMP_TABLE_PRESENT
            | IMAGE_GUARD_EH_CONTINUATION_TABLE_PRESENT;
        assert_eq!(v1.guard_flags & FLAGS, FLAGS);

        assert_eq!(
            config.v2().unwrap().code_integrity,
            LoadConfigCodeIntegrity::default()
        );
        let v3 = config.v3().unwrap();
        assert_eq!(v3.guard_address_taken_iat_entry_table, 0);
        assert_eq!(v3.guard_long_jump_target_count, 0);

        let v5 = config.v5().unwrap();
        assert_eq!(v5.dynamic_value_reloc_table, 0);
        assert_eq!(v5.hybrid_metadata_pointer, 0);
        assert_eq!(v5.guard_rf_failure_routine, 0);
        assert_eq!(v5.dynamic_value_reloctable_offset, 0x6a0);
        assert_eq!(v5.dynamic_value_reloctable_section, 15);
        assert_eq!(v5.reserved2, 0);

        let v7 = config.v7().unwrap();
        assert_eq!(v7.guard_rf_verify_stack_pointer_function_pointer, 0);
        assert_eq!(v7.hot_patch_table_offset, 0);
        assert_eq!(v7.enclave_configuration_pointer, 0);
    }

    #[test]
    fn parse_loadconfig32_data0() {
        let data =
            LoadConfigData::parse_size_field(LOADCONFIG32_DATA0, Container::Little).unwrap();
        assert_eq!(data.directory_size, 188);
        assert_eq!(data.version(), LoadConfigVersion::V7);
        assert_eq!(data.unconsumed_size(), 28);

        let config = data.config;
        assert_eq!(config.base().characteristics, 188);
        assert_eq!(config.base().reserved1, 0);
        assert_eq!(config.base().security_cookie, 0x41d008);
        assert_eq!(config.v0().se_handler_table, 0x41b6d4);
        assert_eq!(config.v0().se_handler_count, 16);

        let v1 = config.v1().unwrap();
        assert_eq!(v1.guard_cf_check_function_pointer, 0x415170);
        assert_eq!(v1.guard_cf_dispatch_function_pointer, 0);
        assert_eq!(v1.guard_cf_function_table, 0x4151bc);
        assert_eq!(v1.guard_cf_function_count, 63);
        assert_eq!(v1.guard_flags, 0x10017500);
        assert_eq!(
            v1.guard_flags & IMAGE_GUARD_EH_CONTINUATION_TABLE_PRESENT,
            0
        );

        let v5 = config.v5().unwrap();
        assert_eq!(v5.dynamic_value_reloctable_offset, 0);
        assert_eq!(v5.dynamic_value_reloctable_section, 0);
    }

    #[test]
    fn directory_size_overrides_size_field() {
        let data =
            LoadConfigData::parse(LOADCONFIG64_DATA0, 160, Container::Big).unwrap();
        assert_eq!(data.version(), LoadConfigVersion::V2);
        // the leading member still reads as stored
        assert_eq!(data.config.base().characteristics, 320);
        assert_eq!(data.config.get(LoadConfigField::GuardFlags), Some(0x10417500));
        assert_eq!(data.config.get(LoadConfigField::GuardAddressTakenIatEntryTable), None);
        assert!(data.config.v3().is_none());
    }

    #[test]
    fn synthetic_v5_end_to_end() {
        let c = Container::Big;
        let size = LoadConfigVersion::V5.structure_size(c);
        let mut bytes = std::vec![0u8; size as usize];
        LoadConfigField::Characteristics.write(&mut bytes, c, 0x0000_0001).unwrap();
        LoadConfigField::SecurityCookie.write(&mut bytes, c, 0xAABB_CCDD).unwrap();
        LoadConfigField::GuardRfFailureRoutine.write(&mut bytes, c, 0x1_4000_10C0).unwrap();

        let data = LoadConfigData::parse(&bytes, size, c).unwrap();
        assert_eq!(data.version().index(), 5);
        assert_eq!(data.unconsumed_size(), 0);
        let config = data.config;
        assert_eq!(config.base().characteristics, 1);
        assert_eq!(config.base().security_cookie, 0xAABB_CCDD);
        assert_eq!(config.v5().unwrap().guard_rf_failure_routine, 0x1_4000_10C0);
        assert!(config.v6().is_none());
        assert!(config.v7().is_none());
        assert_eq!(config.get(LoadConfigField::GuardRfVerifyStackPointerFunctionPointer), None);
        assert_eq!(config.get(LoadConfigField::HotPatchTableOffset), None);
        assert_eq!(config.fields().count(), 40);
    }

    #[test]
    fn truncated_directory_is_an_error() {
        let bytes = [0u8; 256];
        assert!(matches!(
            LoadConfigData::parse(&bytes, 64, Container::Little),
            Err(error::Error::TruncatedStructure { size: 64, minimum: 72 })
        ));
        assert!(matches!(
            LoadConfigData::parse(&bytes, 111, Container::Big),
            Err(error::Error::TruncatedStructure { size: 111, minimum: 112 })
        ));
        assert!(matches!(
            LoadConfigData::parse_size_field(&bytes[..3], Container::Big),
            Err(error::Error::OutOfBoundsRead { offset: 0, len: 3, .. })
        ));
    }

    #[test]
    fn short_buffer_decodes_partially() {
        let c = Container::Big;
        // declares V1 but only carries the V0 fields
        let bytes = &LOADCONFIG64_DATA0[..0x74];
        let data = LoadConfigData::parse(bytes, 148, c).unwrap();
        assert_eq!(data.version(), LoadConfigVersion::V1);
        assert!(data.is_partial());
        assert_eq!(data.missing, Some(LoadConfigField::GuardCfCheckFunctionPointer));
        assert_eq!(data.config.base().security_cookie, 0x1801e4598);
        let v1 = data.config.v1().unwrap();
        assert_eq!(v1.guard_cf_check_function_pointer, 0);
        assert_eq!(v1.guard_cf_function_table, 0);
        assert_eq!(v1.guard_flags, 0);
    }

    #[test]
    fn heap_flags_before_affinity_mask_survive_truncation() {
        let c = Container::Little;
        let mut bytes = [0u8; 0x30];
        LoadConfigField::ProcessHeapFlags.write(&mut bytes, c, 0x1234).unwrap();
        LoadConfigField::VirtualMemoryThreshold.write(&mut bytes, c, 0x8000).unwrap();

        let data = LoadConfigData::parse(&bytes, 72, c).unwrap();
        assert_eq!(data.version(), LoadConfigVersion::V0);
        assert_eq!(data.missing, Some(LoadConfigField::ProcessAffinityMask));
        let base = data.config.base();
        assert_eq!(base.process_heap_flags, 0x1234);
        assert_eq!(base.virtual_memory_threshold, 0x8000);
        assert_eq!(base.process_affinity_mask, 0);
        assert_eq!(base.security_cookie, 0);

        // a cut inside the affinity mask still keeps the heap flags
        let mut longer = [0u8; 0x32];
        longer[..0x30].copy_from_slice(&bytes);
        let data = LoadConfigData::parse(&longer, 72, c).unwrap();
        assert_eq!(data.missing, Some(LoadConfigField::ProcessAffinityMask));
        assert_eq!(data.config.base().process_heap_flags, 0x1234);
    }

    #[rstest]
    fn in_bounds_fields_decode_at_any_cut(#[values(Container::Little, Container::Big)] c: Container) {
        let version = LoadConfigVersion::V7;
        let size = version.structure_size(c);
        let mut bytes = std::vec![0u8; size as usize];
        for field in fields_of(version) {
            field.write(&mut bytes, c, 0x100 + field.offset(c) as u64).unwrap();
        }
        for len in 0..size as usize {
            let data = LoadConfigData::parse(&bytes[..len], size, c).unwrap();
            for field in fields_of(version) {
                let expected = if field.end(c) <= len {
                    0x100 + field.offset(c) as u64
                } else {
                    0
                };
                assert_eq!(
                    data.config.get(field),
                    Some(expected),
                    "{} at cut {:#x}",
                    field.name(),
                    len
                );
            }
            let missing = data.missing.unwrap();
            assert!(missing.offset(c) <= len && missing.end(c) > len);
            assert!(
                fields_of(version).all(|f| f.end(c) <= len || f.offset(c) >= missing.offset(c))
            );
        }
    }

    #[test]
    fn accessors_follow_version() {
        for version in LoadConfigVersion::ALL {
            let config = LoadConfig::new(version);
            assert_eq!(config.version(), version);
            let i = version.index();
            assert_eq!(config.v1().is_some(), i >= 1);
            assert_eq!(config.v2().is_some(), i >= 2);
            assert_eq!(config.v3().is_some(), i >= 3);
            assert_eq!(config.v4().is_some(), i >= 4);
            assert_eq!(config.v5().is_some(), i >= 5);
            assert_eq!(config.v6().is_some(), i >= 6);
            assert_eq!(config.v7().is_some(), i >= 7);
            for &field in LoadConfigField::ALL {
                assert_eq!(config.get(field).is_some(), field.introduced_in() <= version);
            }
        }
    }

    #[test]
    fn mutable_views_write_through() {
        let mut config = LoadConfig::new(LoadConfigVersion::V6);
        config.base_mut().security_cookie = 0x4000;
        config.v3_mut().unwrap().guard_long_jump_target_count = 7;
        config.v6_mut().unwrap().hot_patch_table_offset = 0x100;
        assert!(config.v7_mut().is_none());
        assert_eq!(config.get(LoadConfigField::SecurityCookie), Some(0x4000));
        assert_eq!(config.get(LoadConfigField::GuardLongJumpTargetCount), Some(7));
        assert_eq!(config.get(LoadConfigField::HotPatchTableOffset), Some(0x100));
        assert!(!config.set(LoadConfigField::Reserved3, 1));
    }

    #[rstest]
    fn defaults_are_equal_until_mutated(
        #[values(
            LoadConfigVersion::V0,
            LoadConfigVersion::V1,
            LoadConfigVersion::V2,
            LoadConfigVersion::V3,
            LoadConfigVersion::V4,
            LoadConfigVersion::V5,
            LoadConfigVersion::V6,
            LoadConfigVersion::V7
        )]
        version: LoadConfigVersion,
    ) {
        let a = LoadConfig::new(version);
        assert_eq!(a, LoadConfig::new(version));
        assert_eq!(hash_of(&a), hash_of(&LoadConfig::new(version)));
        for field in fields_of(version) {
            let mut b = a;
            assert!(b.set(field, 1));
            assert_ne!(a, b, "{} did not affect equality", field.name());
        }
    }

    #[test]
    fn versions_are_never_equal() {
        let mut rng = rand::rng();
        for pair in LoadConfigVersion::ALL.windows(2) {
            let mut older = LoadConfig::new(pair[0]);
            let mut newer = LoadConfig::new(pair[1]);
            assert_ne!(older, newer);
            randomize(&mut older, &mut rng);
            for field in fields_of(pair[0]) {
                newer.set(field, older.get(field).unwrap());
            }
            assert_ne!(older, newer);
        }
    }

    #[rstest]
    fn equal_configs_hash_equal(
        #[values(
            LoadConfigVersion::V0,
            LoadConfigVersion::V1,
            LoadConfigVersion::V2,
            LoadConfigVersion::V3,
            LoadConfigVersion::V4,
            LoadConfigVersion::V5,
            LoadConfigVersion::V6,
            LoadConfigVersion::V7
        )]
        version: LoadConfigVersion,
    ) {
        let mut rng = rand::rng();
        for _ in 0..128 {
            let mut a = LoadConfig::new(version);
            randomize(&mut a, &mut rng);
            let mut b = LoadConfig::new(version);
            for (field, value) in a.fields() {
                b.set(field, value);
            }
            assert_eq!(a, b);
            assert_eq!(hash_of(&a), hash_of(&b));

            let field = fields_of(version).last().unwrap();
            b.set(field, a.get(field).unwrap().wrapping_add(1));
            assert_ne!(a, b);
        }
    }

    #[test]
    fn display_lists_fields_in_order() {
        let mut config = LoadConfig::new(LoadConfigVersion::V0);
        config.base_mut().security_cookie = 0xaabbccdd;
        config.v0_mut().se_handler_count = 16;
        let out = config.to_string();
        let lines: std::vec::Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 20);
        assert!(lines[0].starts_with("characteristics "));
        assert!(lines[0].ends_with("= 0x0"));
        assert!(lines[17].starts_with("security_cookie "));
        assert!(lines[17].ends_with("= 0xaabbccdd"));
        assert!(lines[19].starts_with("se_handler_count "));
        assert!(lines[19].ends_with("= 0x10"));
        assert!(!out.contains("guard_flags"));
        // names are padded to a common column
        let column = lines[0].find('=').unwrap();
        assert!(lines.iter().all(|line| line.find('=') == Some(column)));
        assert_eq!(out, config.to_string());
    }
}
