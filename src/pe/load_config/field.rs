//! Per-field layout of the load config directory and a codec over raw directory bytes.
//!
//! Offsets mirror `IMAGE_LOAD_CONFIG_DIRECTORY32` and `IMAGE_LOAD_CONFIG_DIRECTORY64`
//! from `winnt.h`. The two layouts differ in more than pointer width: the 32-bit structure
//! stores `ProcessHeapFlags` before `ProcessAffinityMask`, the 64-bit one after it.

use scroll::{Pread, Pwrite};

use crate::container::Container;
use crate::error;
use crate::pe::load_config::version::LoadConfigVersion;

/// Storage class of a load config field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A 16-bit field.
    Word,
    /// A 32-bit field.
    Dword,
    /// A `ULONG_PTR`/`SIZE_T` field, as wide as a pointer of the image.
    Pointer,
}

impl FieldKind {
    /// Width in bytes of a field of this kind in the given container.
    pub fn size(self, container: Container) -> usize {
        match self {
            FieldKind::Word => 2,
            FieldKind::Dword => 4,
            FieldKind::Pointer => container.pointer_size(),
        }
    }
}

macro_rules! load_config_fields {
    ($(
        $(#[$attr:meta])*
        $variant:ident => $name:literal, $version:ident, $kind:ident, $off32:literal, $off64:literal;
    )*) => {
        /// A field of the load config directory.
        ///
        /// Variants are declared in canonical order: base fields first, then the additions of
        /// each version in turn.
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum LoadConfigField {
            $(
                $(#[$attr])*
                $variant,
            )*
        }

        impl LoadConfigField {
            /// Every known field, in canonical order.
            pub const ALL: &'static [LoadConfigField] = &[$(LoadConfigField::$variant,)*];

            /// The name of the field, as printed by the formatter.
            pub fn name(self) -> &'static str {
                match self {
                    $(LoadConfigField::$variant => $name,)*
                }
            }

            /// The first version whose structure contains this field.
            pub fn introduced_in(self) -> LoadConfigVersion {
                match self {
                    $(LoadConfigField::$variant => LoadConfigVersion::$version,)*
                }
            }

            /// The storage class of this field.
            pub fn kind(self) -> FieldKind {
                match self {
                    $(LoadConfigField::$variant => FieldKind::$kind,)*
                }
            }

            /// Offset of this field from the start of the directory.
            pub fn offset(self, container: Container) -> usize {
                let (off32, off64) = match self {
                    $(LoadConfigField::$variant => ($off32, $off64),)*
                };
                match container {
                    Container::Little => off32,
                    Container::Big => off64,
                }
            }
        }
    };
}

load_config_fields! {
    /// `Size`: the structure size as recorded by the linker.
    Characteristics => "characteristics", V0, Dword, 0x00, 0x00;
    TimeDateStamp => "timedatestamp", V0, Dword, 0x04, 0x04;
    MajorVersion => "major_version", V0, Word, 0x08, 0x08;
    MinorVersion => "minor_version", V0, Word, 0x0a, 0x0a;
    GlobalFlagsClear => "global_flags_clear", V0, Dword, 0x0c, 0x0c;
    GlobalFlagsSet => "global_flags_set", V0, Dword, 0x10, 0x10;
    CriticalSectionDefaultTimeout => "critical_section_default_timeout", V0, Dword, 0x14, 0x14;
    DecommitFreeBlockThreshold => "decommit_free_block_threshold", V0, Pointer, 0x18, 0x18;
    DecommitTotalFreeThreshold => "decommit_total_free_threshold", V0, Pointer, 0x1c, 0x20;
    LockPrefixTable => "lock_prefix_table", V0, Pointer, 0x20, 0x28;
    MaximumAllocationSize => "maximum_allocation_size", V0, Pointer, 0x24, 0x30;
    VirtualMemoryThreshold => "virtual_memory_threshold", V0, Pointer, 0x28, 0x38;
    ProcessAffinityMask => "process_affinity_mask", V0, Pointer, 0x30, 0x40;
    ProcessHeapFlags => "process_heap_flags", V0, Dword, 0x2c, 0x48;
    CsdVersion => "csd_version", V0, Word, 0x34, 0x4c;
    /// `DependentLoadFlags` in recent SDKs.
    Reserved1 => "reserved1", V0, Word, 0x36, 0x4e;
    EditList => "editlist", V0, Pointer, 0x38, 0x50;
    SecurityCookie => "security_cookie", V0, Pointer, 0x3c, 0x58;
    SeHandlerTable => "se_handler_table", V0, Pointer, 0x40, 0x60;
    SeHandlerCount => "se_handler_count", V0, Pointer, 0x44, 0x68;
    GuardCfCheckFunctionPointer => "guard_cf_check_function_pointer", V1, Pointer, 0x48, 0x70;
    GuardCfDispatchFunctionPointer => "guard_cf_dispatch_function_pointer", V1, Pointer, 0x4c, 0x78;
    GuardCfFunctionTable => "guard_cf_function_table", V1, Pointer, 0x50, 0x80;
    GuardCfFunctionCount => "guard_cf_function_count", V1, Pointer, 0x54, 0x88;
    GuardFlags => "guard_flags", V1, Dword, 0x58, 0x90;
    CodeIntegrityFlags => "code_integrity.flags", V2, Word, 0x5c, 0x94;
    CodeIntegrityCatalog => "code_integrity.catalog", V2, Word, 0x5e, 0x96;
    CodeIntegrityCatalogOffset => "code_integrity.catalog_offset", V2, Dword, 0x60, 0x98;
    CodeIntegrityReserved => "code_integrity.reserved", V2, Dword, 0x64, 0x9c;
    GuardAddressTakenIatEntryTable => "guard_address_taken_iat_entry_table", V3, Pointer, 0x68, 0xa0;
    GuardAddressTakenIatEntryCount => "guard_address_taken_iat_entry_count", V3, Pointer, 0x6c, 0xa8;
    GuardLongJumpTargetTable => "guard_long_jump_target_table", V3, Pointer, 0x70, 0xb0;
    GuardLongJumpTargetCount => "guard_long_jump_target_count", V3, Pointer, 0x74, 0xb8;
    DynamicValueRelocTable => "dynamic_value_reloc_table", V4, Pointer, 0x78, 0xc0;
    /// `CHPEMetadataPointer` in recent SDKs.
    HybridMetadataPointer => "hybrid_metadata_pointer", V4, Pointer, 0x7c, 0xc8;
    GuardRfFailureRoutine => "guard_rf_failure_routine", V5, Pointer, 0x80, 0xd0;
    GuardRfFailureRoutineFunctionPointer => "guard_rf_failure_routine_function_pointer", V5, Pointer, 0x84, 0xd8;
    DynamicValueRelocTableOffset => "dynamic_value_reloctable_offset", V5, Dword, 0x88, 0xe0;
    DynamicValueRelocTableSection => "dynamic_value_reloctable_section", V5, Word, 0x8c, 0xe4;
    Reserved2 => "reserved2", V5, Word, 0x8e, 0xe6;
    GuardRfVerifyStackPointerFunctionPointer => "guard_rf_verify_stack_pointer_function_pointer", V6, Pointer, 0x90, 0xe8;
    HotPatchTableOffset => "hot_patch_table_offset", V6, Dword, 0x94, 0xf0;
    Reserved3 => "reserved3", V7, Dword, 0x98, 0xf4;
    EnclaveConfigurationPointer => "enclave_configuration_pointer", V7, Pointer, 0x9c, 0xf8;
}

/// Iterates the fields defined by `version`, in canonical order.
pub fn fields_of(version: LoadConfigVersion) -> impl Iterator<Item = LoadConfigField> {
    LoadConfigField::ALL
        .iter()
        .copied()
        .filter(move |field| field.introduced_in() <= version)
}

impl LoadConfigField {
    /// Width of this field in bytes in the given container.
    pub fn size(self, container: Container) -> usize {
        self.kind().size(container)
    }

    /// Offset one past the last byte of this field.
    pub fn end(self, container: Container) -> usize {
        self.offset(container) + self.size(container)
    }

    /// Reads the raw value of this field from the directory `bytes`.
    pub fn read(self, bytes: &[u8], container: Container) -> error::Result<u64> {
        let offset = self.offset(container);
        let size = self.size(container);
        if offset + size > bytes.len() {
            return Err(error::Error::OutOfBoundsRead {
                field: self.name(),
                offset,
                size,
                len: bytes.len(),
            });
        }
        let value = match size {
            2 => bytes.pread_with::<u16>(offset, scroll::LE)? as u64,
            4 => bytes.pread_with::<u32>(offset, scroll::LE)? as u64,
            _ => bytes.pread_with::<u64>(offset, scroll::LE)?,
        };
        Ok(value)
    }

    /// Writes `value` into this field of the directory `bytes`, in place.
    ///
    /// Only the low-order bytes that fit the field's width are written, like an integer
    /// narrowing cast. The buffer is never resized.
    pub fn write(self, bytes: &mut [u8], container: Container, value: u64) -> error::Result<()> {
        let offset = self.offset(container);
        let size = self.size(container);
        if offset + size > bytes.len() {
            return Err(error::Error::BufferTooShort(
                offset + size,
                "bytes for load config field",
            ));
        }
        match size {
            2 => bytes.pwrite_with(value as u16, offset, scroll::LE)?,
            4 => bytes.pwrite_with(value as u32, offset, scroll::LE)?,
            _ => bytes.pwrite_with(value, offset, scroll::LE)?,
        };
        Ok(())
    }
}
