#![doc(html_no_source)]

//! Core selection, ranking, and state-transition engine for a redundant
//! A/B boot configuration store.
//!
//! Everything this crate cannot do itself — enumerate volumes, read/write
//! the config file on one of them, checksum a buffer, or identify the boot
//! volume — is reached through [`pal::Platform`], which the caller
//! supplies. See [`bootloader::select_boot_config`] for the entry point.

pub mod bootloader;

pub use bootloader::{select_boot_config, EnvironmentRecord, LoaderParams, UState, Verdict};
