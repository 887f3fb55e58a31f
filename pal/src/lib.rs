//! Platform abstraction layer for the boot-configuration selector.
//!
//! Everything the core selection engine cannot do itself — enumerate
//! volumes, open/read/write/close the config file on one of them, checksum
//! a buffer, or tell a boot volume apart from a backup one — is reached
//! through the [`Platform`] trait. Keeping every such operation behind one
//! seam is what lets a test harness fail the k-th call, of any kind,
//! without touching the selection logic itself.

use std::fmt;

/// An opaque handle to an open config file. The core never interprets its
/// value; it only ever hands it back to the [`Platform`] that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHandle(pub u64);

/// A platform-seam failure. The reason is carried only for logging; callers
/// branch on *which operation* failed, not on this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformError(pub &'static str);

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PlatformError {}

/// Every externally-callable operation the selector needs, as a single
/// object the core is handed. A production implementation backs this with
/// real volume enumeration, a file protocol, and `CalculateCrc32`; a test
/// double backs it with an in-memory volume set and can fail any one call.
pub trait Platform {
    /// Number of volumes known to the firmware for this boot. Stable for
    /// the duration of one selection.
    fn volume_count(&self) -> usize;

    /// Reserve an index buffer sized to hold up to `capacity` volume
    /// indices. A named seam so an out-of-memory condition can be
    /// exercised independently of every other failure mode.
    fn allocate_index_buffer(&mut self, capacity: usize) -> Result<Vec<usize>, PlatformError>;

    /// Fill `indices` with the indices of volumes that contain a config
    /// file.
    fn enumerate_cfg_parts(&mut self, indices: &mut Vec<usize>) -> Result<(), PlatformError>;

    /// Remove disallowed entries from `indices` in place (for example,
    /// partitions on a non-boot disk).
    fn filter_cfg_parts(&mut self, indices: &mut Vec<usize>) -> Result<(), PlatformError>;

    /// Identity predicate: is this volume the one the firmware booted from?
    fn is_on_boot_volume(&self, volume_index: usize) -> bool;

    /// Open the well-known config file on the given volume.
    fn open_cfg_file(&mut self, volume_index: usize) -> Result<FileHandle, PlatformError>;

    /// Read as much of the config file into `buf` as is available, up to
    /// `buf.len()`, returning the number of bytes actually read.
    fn read_cfg_file(&mut self, handle: FileHandle, buf: &mut [u8]) -> Result<usize, PlatformError>;

    /// Write `buf` to the config file, returning the number of bytes
    /// actually written. A short write is the caller's responsibility to
    /// detect.
    fn write_cfg_file(&mut self, handle: FileHandle, buf: &[u8]) -> Result<usize, PlatformError>;

    /// Close a previously opened config file.
    fn close_cfg_file(&mut self, handle: FileHandle) -> Result<(), PlatformError>;

    /// Compute the CRC-32 (IEEE polynomial) of `buf`. Kept as a seam rather
    /// than a pure function so CRC failures are independently injectable.
    fn calculate_crc32(&self, buf: &[u8]) -> Result<u32, PlatformError>;
}
