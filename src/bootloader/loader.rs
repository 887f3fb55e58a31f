//! Per-volume record load and write-back.

use pal::Platform;

use crate::bootloader::codec;
use crate::bootloader::error::LoadError;
use crate::bootloader::record::EnvironmentRecord;

/// Result of a successful load: the decoded record plus whether a soft
/// anomaly occurred (currently only "close failed after a successful
/// read" — the record is still valid and still returned).
pub struct LoadOutcome {
    pub record: EnvironmentRecord,
    pub read_errored: bool,
}

/// Load and validate the config record on one volume.
///
/// Any of open failure, read failure, length mismatch, CRC computation
/// failure, or CRC mismatch is a hard error for this volume: the caller
/// must skip it entirely, it is never considered for ranking. A close
/// failure *after* a successful read does not invalidate the record — it
/// only sets the returned `read_errored` flag.
pub fn load(platform: &mut dyn Platform, volume_index: usize) -> Result<LoadOutcome, LoadError> {
    let handle = platform.open_cfg_file(volume_index).map_err(|e| {
        log::error!("volume {}: failed to open config file: {}", volume_index, e);
        LoadError::Open
    })?;

    let mut buf = vec![0u8; codec::RECORD_SIZE];
    let read_len = match platform.read_cfg_file(handle, &mut buf) {
        Ok(n) => n,
        Err(e) => {
            log::error!("volume {}: read failed: {}", volume_index, e);
            let _ = platform.close_cfg_file(handle);
            return Err(LoadError::Read);
        }
    };
    buf.truncate(read_len);

    if let Err(e) = codec::check_length(&buf) {
        log::warn!("volume {}: {}", volume_index, e);
        let _ = platform.close_cfg_file(handle);
        return Err(e.into());
    }

    let crc_region = codec::crc_region(&buf);
    let stored_crc = codec::stored_crc(&buf);

    let computed_crc = match platform.calculate_crc32(crc_region) {
        Ok(c) => c,
        Err(e) => {
            log::error!("volume {}: crc computation failed: {}", volume_index, e);
            let _ = platform.close_cfg_file(handle);
            return Err(LoadError::CrcComputation);
        }
    };

    if computed_crc != stored_crc {
        log::error!(
            "volume {}: crc mismatch (stored {:#010x}, computed {:#010x})",
            volume_index,
            stored_crc,
            computed_crc
        );
        let _ = platform.close_cfg_file(handle);
        return Err(LoadError::CrcMismatch {
            expected: stored_crc,
            computed: computed_crc,
        });
    }

    // Close only after the record has already been accepted. A failure
    // here is a warning, not grounds to invalidate what was just a
    // successful read.
    let mut read_errored = false;
    if let Err(e) = platform.close_cfg_file(handle) {
        log::warn!(
            "volume {}: close failed after a successful read: {}",
            volume_index,
            e
        );
        read_errored = true;
    }

    let record = codec::parse_fields(&buf);
    Ok(LoadOutcome { record, read_errored })
}

/// Write a mutated record back to the volume it came from.
///
/// Opens with read+write access, writes the full fixed-size record in one
/// call, and closes. A short write is treated as failure; write-back
/// failures here are always logged and reported to the caller, which folds
/// them into the `errored` flag rather than aborting selection.
pub fn write_back(
    platform: &mut dyn Platform,
    volume_index: usize,
    record: &EnvironmentRecord,
) -> Result<(), LoadError> {
    let handle = platform.open_cfg_file(volume_index).map_err(|e| {
        log::error!("volume {}: write-back open failed: {}", volume_index, e);
        LoadError::Open
    })?;

    let fields = codec::encode_fields(record);
    let crc = match platform.calculate_crc32(&fields) {
        Ok(c) => c,
        Err(e) => {
            log::error!("volume {}: write-back crc failed: {}", volume_index, e);
            let _ = platform.close_cfg_file(handle);
            return Err(LoadError::CrcComputation);
        }
    };
    let full = codec::assemble(&fields, crc);

    let write_result = platform.write_cfg_file(handle, &full);
    let close_result = platform.close_cfg_file(handle);

    let written = write_result.map_err(|e| {
        log::error!("volume {}: write-back write failed: {}", volume_index, e);
        LoadError::Write
    })?;

    if written != codec::RECORD_SIZE {
        log::error!(
            "volume {}: write-back short write ({} of {} bytes)",
            volume_index,
            written,
            codec::RECORD_SIZE
        );
        return Err(LoadError::ShortWrite {
            expected: codec::RECORD_SIZE,
            actual: written,
        });
    }

    close_result.map_err(|e| {
        log::warn!("volume {}: write-back close failed: {}", volume_index, e);
        LoadError::Close
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bootloader::record::{ucs2_of, UState, KERNELFILE_LEN, KERNELPARAMS_LEN};
    use crate::bootloader::selector::test_support::MockPlatform;

    fn sample_record() -> EnvironmentRecord {
        EnvironmentRecord {
            revision: 3,
            in_progress: false,
            ustate: UState::Ok,
            watchdog_timeout_sec: 90,
            kernelfile: ucs2_of("\\kernel", KERNELFILE_LEN),
            kernelparams: ucs2_of("quiet", KERNELPARAMS_LEN),
        }
    }

    #[test]
    fn load_succeeds_on_a_well_formed_record() {
        let mut platform = MockPlatform::with_volumes(1);
        platform.write_valid_record(0, &sample_record());

        let outcome = load(&mut platform, 0).expect("load should succeed");
        assert_eq!(outcome.record, sample_record());
        assert!(!outcome.read_errored);
    }

    #[test]
    fn load_fails_on_crc_mismatch() {
        let mut platform = MockPlatform::with_volumes(1);
        platform.write_valid_record(0, &sample_record());
        platform.corrupt_byte(0, 0);

        let err = load(&mut platform, 0).unwrap_err();
        assert!(matches!(err, LoadError::CrcMismatch { .. }));
    }

    #[test]
    fn load_fails_on_short_read() {
        let mut platform = MockPlatform::with_volumes(1);
        platform.truncate_file(0, codec::RECORD_SIZE - 1);

        let err = load(&mut platform, 0).unwrap_err();
        assert!(matches!(err, LoadError::BadLength { .. }));
    }

    #[test]
    fn close_failure_after_successful_read_is_soft() {
        let mut platform = MockPlatform::with_volumes(1);
        platform.write_valid_record(0, &sample_record());
        platform.fail_close_once();

        let outcome = load(&mut platform, 0).expect("record is still accepted");
        assert_eq!(outcome.record, sample_record());
        assert!(outcome.read_errored);
    }

    #[test]
    fn write_back_round_trips_through_load() {
        let mut platform = MockPlatform::with_volumes(1);
        platform.write_valid_record(0, &sample_record());

        let mut mutated = sample_record();
        mutated.ustate = UState::Testing;
        write_back(&mut platform, 0, &mutated).expect("write-back should succeed");

        let reloaded = load(&mut platform, 0).expect("reload should succeed");
        assert_eq!(reloaded.record, mutated);
    }
}
