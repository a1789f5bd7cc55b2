//! Decoded load config records, one struct per version.
//!
//! Each version's record holds the previous version's record in `base` and adds its own
//! fields after it, mirroring how the on-disk structure grew. Records dereference to their
//! `base`, so `v5.security_cookie` reads the base field through the whole chain.
//!
//! Pointer sized fields are stored as `u64` regardless of the image's bitness.

use core::fmt;
use core::ops::{Deref, DerefMut};

use crate::pe::load_config::field::LoadConfigField;
use crate::pe::load_config::version::LoadConfigVersion;

/// Generates a record struct from its field list, along with dynamic field access by
/// [`LoadConfigField`]. Fields the struct does not own are delegated to `base`.
macro_rules! load_config_record {
    (@get $self:ident, $field:ident) => { None };
    (@get $self:ident, $field:ident, $base:ty) => { $self.base.get($field) };
    (@set $self:ident, $field:ident, $value:ident) => { false };
    (@set $self:ident, $field:ident, $value:ident, $base:ty) => { $self.base.set($field, $value) };
    (
        $(#[$attr:meta])*
        pub struct $name:ident: $version:ident $(extends $base:ty)? {
            $(
                $(#[$fattr:meta])*
                $field:ident: $ty:ty => $variant:ident,
            )*
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
        pub struct $name {
            $(
                /// Fields of the previous version.
                pub base: $base,
            )?
            $(
                $(#[$fattr])*
                pub $field: $ty,
            )*
        }

        impl $name {
            /// The version this record describes.
            pub const VERSION: LoadConfigVersion = LoadConfigVersion::$version;

            /// Returns the raw value of `field`, or `None` if this version does not define it.
            pub fn get(&self, field: LoadConfigField) -> Option<u64> {
                match field {
                    $(LoadConfigField::$variant => Some(self.$field as u64),)*
                    _ => load_config_record!(@get self, field $(, $base)?),
                }
            }

            /// Stores `value` into `field`, keeping the low-order bytes that fit its type.
            ///
            /// Returns `false` and stores nothing if this version does not define the field.
            pub fn set(&mut self, field: LoadConfigField, value: u64) -> bool {
                match field {
                    $(LoadConfigField::$variant => {
                        self.$field = value as $ty;
                        true
                    })*
                    _ => load_config_record!(@set self, field, value $(, $base)?),
                }
            }
        }

        $(
            impl Deref for $name {
                type Target = $base;
                fn deref(&self) -> &Self::Target {
                    &self.base
                }
            }

            impl DerefMut for $name {
                fn deref_mut(&mut self) -> &mut Self::Target {
                    &mut self.base
                }
            }
        )?
    };
}

load_config_record! {
    /// The fields every version of the load config directory starts with.
    pub struct LoadConfigBase: V0 {
        /// The `Size` member: the structure size recorded by the linker.
        characteristics: u32 => Characteristics,
        /// Seconds since the epoch, usually zero.
        timedatestamp: u32 => TimeDateStamp,
        major_version: u16 => MajorVersion,
        minor_version: u16 => MinorVersion,
        /// Global flags the loader clears for the process.
        global_flags_clear: u32 => GlobalFlagsClear,
        /// Global flags the loader sets for the process.
        global_flags_set: u32 => GlobalFlagsSet,
        critical_section_default_timeout: u32 => CriticalSectionDefaultTimeout,
        decommit_free_block_threshold: u64 => DecommitFreeBlockThreshold,
        decommit_total_free_threshold: u64 => DecommitTotalFreeThreshold,
        /// VA of the list of `LOCK` prefixed instructions (x86 only).
        lock_prefix_table: u64 => LockPrefixTable,
        maximum_allocation_size: u64 => MaximumAllocationSize,
        virtual_memory_threshold: u64 => VirtualMemoryThreshold,
        process_affinity_mask: u64 => ProcessAffinityMask,
        process_heap_flags: u32 => ProcessHeapFlags,
        /// Service pack version identifier.
        csd_version: u16 => CsdVersion,
        /// `DependentLoadFlags` in recent SDKs.
        reserved1: u16 => Reserved1,
        /// Reserved for use by the system.
        editlist: u64 => EditList,
        /// VA of the `/GS` security cookie.
        security_cookie: u64 => SecurityCookie,
    }
}

load_config_record! {
    /// Load config with the SafeSEH handler table.
    pub struct LoadConfigV0: V0 extends LoadConfigBase {
        /// VA of the sorted table of valid exception handler RVAs.
        se_handler_table: u64 => SeHandlerTable,
        /// Number of entries in the handler table.
        se_handler_count: u64 => SeHandlerCount,
    }
}

load_config_record! {
    /// Load config with the Control Flow Guard function table.
    pub struct LoadConfigV1: V1 extends LoadConfigV0 {
        guard_cf_check_function_pointer: u64 => GuardCfCheckFunctionPointer,
        guard_cf_dispatch_function_pointer: u64 => GuardCfDispatchFunctionPointer,
        guard_cf_function_table: u64 => GuardCfFunctionTable,
        guard_cf_function_count: u64 => GuardCfFunctionCount,
        /// Raw `IMAGE_GUARD_*` bits.
        guard_flags: u32 => GuardFlags,
    }
}

/// `IMAGE_LOAD_CONFIG_CODE_INTEGRITY`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct LoadConfigCodeIntegrity {
    /// Flags indicating code integrity options.
    pub flags: u16,
    /// Catalog index, `0xffff` for none.
    pub catalog: u16,
    /// Offset to the catalog.
    pub catalog_offset: u32,
    /// Reserved, zero.
    pub reserved: u32,
}

impl fmt::Display for LoadConfigCodeIntegrity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{:<14} = {:#x}", "flags", self.flags)?;
        writeln!(f, "{:<14} = {:#x}", "catalog", self.catalog)?;
        writeln!(f, "{:<14} = {:#x}", "catalog_offset", self.catalog_offset)?;
        writeln!(f, "{:<14} = {:#x}", "reserved", self.reserved)
    }
}

/// Load config with code integrity.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct LoadConfigV2 {
    /// Fields of the previous version.
    pub base: LoadConfigV1,
    pub code_integrity: LoadConfigCodeIntegrity,
}

impl LoadConfigV2 {
    /// The version this record describes.
    pub const VERSION: LoadConfigVersion = LoadConfigVersion::V2;

    /// Returns the raw value of `field`, or `None` if this version does not define it.
    pub fn get(&self, field: LoadConfigField) -> Option<u64> {
        let ci = &self.code_integrity;
        match field {
            LoadConfigField::CodeIntegrityFlags => Some(ci.flags as u64),
            LoadConfigField::CodeIntegrityCatalog => Some(ci.catalog as u64),
            LoadConfigField::CodeIntegrityCatalogOffset => Some(ci.catalog_offset as u64),
            LoadConfigField::CodeIntegrityReserved => Some(ci.reserved as u64),
            _ => self.base.get(field),
        }
    }

    /// Stores `value` into `field`, keeping the low-order bytes that fit its type.
    ///
    /// Returns `false` and stores nothing if this version does not define the field.
    pub fn set(&mut self, field: LoadConfigField, value: u64) -> bool {
        let ci = &mut self.code_integrity;
        match field {
            LoadConfigField::CodeIntegrityFlags => ci.flags = value as u16,
            LoadConfigField::CodeIntegrityCatalog => ci.catalog = value as u16,
            LoadConfigField::CodeIntegrityCatalogOffset => ci.catalog_offset = value as u32,
            LoadConfigField::CodeIntegrityReserved => ci.reserved = value as u32,
            _ => return self.base.set(field, value),
        }
        true
    }
}

impl Deref for LoadConfigV2 {
    type Target = LoadConfigV1;
    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl DerefMut for LoadConfigV2 {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.base
    }
}

load_config_record! {
    /// Load config with the address-taken IAT and long jump target tables.
    pub struct LoadConfigV3: V3 extends LoadConfigV2 {
        guard_address_taken_iat_entry_table: u64 => GuardAddressTakenIatEntryTable,
        guard_address_taken_iat_entry_count: u64 => GuardAddressTakenIatEntryCount,
        guard_long_jump_target_table: u64 => GuardLongJumpTargetTable,
        guard_long_jump_target_count: u64 => GuardLongJumpTargetCount,
    }
}

load_config_record! {
    /// Load config with the dynamic value relocation table.
    pub struct LoadConfigV4: V4 extends LoadConfigV3 {
        /// VA of the dynamic value relocation table.
        dynamic_value_reloc_table: u64 => DynamicValueRelocTable,
        /// VA of the CHPE (hybrid x86 on ARM64) metadata.
        hybrid_metadata_pointer: u64 => HybridMetadataPointer,
    }
}

load_config_record! {
    /// Load config with return flow guard routines.
    pub struct LoadConfigV5: V5 extends LoadConfigV4 {
        guard_rf_failure_routine: u64 => GuardRfFailureRoutine,
        guard_rf_failure_routine_function_pointer: u64 => GuardRfFailureRoutineFunctionPointer,
        /// Offset of the dynamic value relocation table within its section.
        dynamic_value_reloctable_offset: u32 => DynamicValueRelocTableOffset,
        /// One-based index of the section holding the dynamic value relocation table.
        dynamic_value_reloctable_section: u16 => DynamicValueRelocTableSection,
        reserved2: u16 => Reserved2,
    }
}

load_config_record! {
    /// Load config with return flow guard stack pointer verification.
    pub struct LoadConfigV6: V6 extends LoadConfigV5 {
        guard_rf_verify_stack_pointer_function_pointer: u64 => GuardRfVerifyStackPointerFunctionPointer,
        hot_patch_table_offset: u32 => HotPatchTableOffset,
    }
}

load_config_record! {
    /// Load config with the enclave configuration.
    pub struct LoadConfigV7: V7 extends LoadConfigV6 {
        reserved3: u32 => Reserved3,
        enclave_configuration_pointer: u64 => EnclaveConfigurationPointer,
    }
}
