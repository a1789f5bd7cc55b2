//! PE32 and PE32+ structures.
//!
//! Only the load configuration directory is decoded here; locating it within an image
//! (resolving the data directory RVA to a file offset) is left to the caller.

pub mod load_config;
