//! # pe-loadconfig, a PE load configuration directory decoder
//!
//! The load configuration directory (`IMAGE_LOAD_CONFIG_DIRECTORY`) of a PE image has no
//! version field. Its layout is inferred from its declared size, and every newer layout
//! appends fields to the previous one.
//!
//! This crate selects the layout from the declared size, decodes the fields of that layout
//! from the raw directory bytes for 32-bit ([`Container::Little`]) or 64-bit
//! ([`Container::Big`]) images, and exposes them as one record type per version.
//!
//! # Example
//!
//! ```rust
//! use pe_loadconfig::container::Container;
//! use pe_loadconfig::pe::load_config::{LoadConfigData, LoadConfigField};
//!
//! fn dump(bytes: &[u8]) -> pe_loadconfig::error::Result<()> {
//!     let data = LoadConfigData::parse_size_field(bytes, Container::Big)?;
//!     println!("{} load config {}", data.container, data.version());
//!     if let Some(v1) = data.config.v1() {
//!         println!("guard flags: {:#x}", v1.guard_flags);
//!     }
//!     print!("{}", data.config);
//!     Ok(())
//! }
//!
//! let mut bytes = [0u8; 256];
//! LoadConfigField::Characteristics.write(&mut bytes, Container::Big, 256).unwrap();
//! dump(&bytes).unwrap();
//! ```
//!
//! # Feature Usage
//!
//! The crate is `no_std` compatible and never allocates. The `std` feature (on by default)
//! turns on `std` support in `scroll` and `thiserror`.
//!
//! [`Container::Little`]: container::Container::Little
//! [`Container::Big`]: container::Container::Big

#![cfg_attr(not(feature = "std"), no_std)]

pub mod container;
pub mod error;
pub mod pe;
