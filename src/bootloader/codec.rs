//! On-disk byte layout for one environment record.
//!
//! Little-endian throughout. The trailing 4 bytes are a CRC-32 (IEEE
//! polynomial / CRC-32/ISO-HDLC) over every byte that precedes them. CRC
//! computation itself is an external collaborator, so this
//! module only ever hands the platform seam the exact region to checksum
//! and compares against the stored value — it never links a CRC
//! implementation directly.

use std::convert::TryInto;

use crate::bootloader::error::CodecError;
use crate::bootloader::record::{
    force_nul_terminate, EnvironmentRecord, UState, KERNELFILE_LEN, KERNELPARAMS_LEN,
};

const REVISION_SIZE: usize = 4;
const IN_PROGRESS_SIZE: usize = 4;
const USTATE_SIZE: usize = 2;
const WATCHDOG_SIZE: usize = 2;
const CRC_SIZE: usize = 4;

const KERNELFILE_BYTES: usize = KERNELFILE_LEN * 2;
const KERNELPARAMS_BYTES: usize = KERNELPARAMS_LEN * 2;

/// Total on-disk size of one record, including the trailing CRC.
pub const RECORD_SIZE: usize = REVISION_SIZE
    + IN_PROGRESS_SIZE
    + USTATE_SIZE
    + WATCHDOG_SIZE
    + KERNELFILE_BYTES
    + KERNELPARAMS_BYTES
    + CRC_SIZE;

/// The region of a full-size record buffer that the CRC is computed over:
/// every byte except the trailing 4-byte checksum.
pub fn crc_region(buf: &[u8]) -> &[u8] {
    &buf[..RECORD_SIZE - CRC_SIZE]
}

/// The stored CRC-32 trailing a full-size record buffer.
pub fn stored_crc(buf: &[u8]) -> u32 {
    u32::from_le_bytes(buf[RECORD_SIZE - CRC_SIZE..RECORD_SIZE].try_into().unwrap())
}

/// Parse the fields of a record out of a full-size, already CRC-validated
/// buffer. Does not itself check length or CRC — callers (the loader) are
/// expected to have done that already, since those checks require the
/// platform seam.
pub fn parse_fields(buf: &[u8]) -> EnvironmentRecord {
    let mut offset = 0;

    let revision = read_u32(buf, &mut offset);
    let in_progress = read_u32(buf, &mut offset) != 0;
    let ustate = UState::from_raw(read_u16(buf, &mut offset));
    let watchdog_timeout_sec = read_u16(buf, &mut offset);
    let mut kernelfile = read_ucs2(buf, &mut offset, KERNELFILE_LEN);
    let mut kernelparams = read_ucs2(buf, &mut offset, KERNELPARAMS_LEN);

    force_nul_terminate(&mut kernelfile);
    force_nul_terminate(&mut kernelparams);

    EnvironmentRecord {
        revision,
        in_progress,
        ustate,
        watchdog_timeout_sec,
        kernelfile,
        kernelparams,
    }
}

/// Validate that `buf` is exactly `RECORD_SIZE` long. The first check the
/// loader performs, before it even looks at the CRC.
pub fn check_length(buf: &[u8]) -> Result<(), CodecError> {
    if buf.len() != RECORD_SIZE {
        Err(CodecError::BadLength {
            expected: RECORD_SIZE,
            actual: buf.len(),
        })
    } else {
        Ok(())
    }
}

/// Encode every field but the CRC, in on-disk order. The caller computes
/// the CRC over the result (via the platform seam) and appends it with
/// [`assemble`].
pub fn encode_fields(record: &EnvironmentRecord) -> Vec<u8> {
    let mut buf = Vec::with_capacity(RECORD_SIZE - CRC_SIZE);

    buf.extend_from_slice(&record.revision.to_le_bytes());
    buf.extend_from_slice(&(record.in_progress as u32).to_le_bytes());
    buf.extend_from_slice(&record.ustate.to_raw().to_le_bytes());
    buf.extend_from_slice(&record.watchdog_timeout_sec.to_le_bytes());
    write_ucs2(&mut buf, &record.kernelfile, KERNELFILE_LEN);
    write_ucs2(&mut buf, &record.kernelparams, KERNELPARAMS_LEN);

    debug_assert_eq!(buf.len(), RECORD_SIZE - CRC_SIZE);
    buf
}

/// Append a previously computed CRC to the fields produced by
/// [`encode_fields`], yielding a full `RECORD_SIZE`-byte buffer ready to
/// hand to the file layer in one write.
pub fn assemble(fields: &[u8], crc: u32) -> Vec<u8> {
    let mut full = Vec::with_capacity(RECORD_SIZE);
    full.extend_from_slice(fields);
    full.extend_from_slice(&crc.to_le_bytes());
    full
}

fn read_u32(buf: &[u8], offset: &mut usize) -> u32 {
    let v = u32::from_le_bytes(buf[*offset..*offset + 4].try_into().unwrap());
    *offset += 4;
    v
}

fn read_u16(buf: &[u8], offset: &mut usize) -> u16 {
    let v = u16::from_le_bytes(buf[*offset..*offset + 2].try_into().unwrap());
    *offset += 2;
    v
}

fn read_ucs2(buf: &[u8], offset: &mut usize, len: usize) -> Vec<u16> {
    let units = buf[*offset..*offset + len * 2]
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    *offset += len * 2;
    units
}

fn write_ucs2(buf: &mut Vec<u8>, units: &[u16], len: usize) {
    for i in 0..len {
        let unit = units.get(i).copied().unwrap_or(0);
        buf.extend_from_slice(&unit.to_le_bytes());
    }
}
