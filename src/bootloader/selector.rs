//! The selector orchestrator: drives enumeration, filtering,
//! per-volume loads, ranking, the state transition, and the hand-off to
//! loader parameters.

use pal::Platform;

use crate::bootloader::ranker::{self, Candidate, POOL_SIZE};
use crate::bootloader::record::ENV_NUM_CONFIG_PARTS;
use crate::bootloader::{loader, transition};

/// The summary outcome of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    ConfigPartiallyCorrupted,
    ConfigError,
}

/// Parameters handed to the loader on success. Owned, NUL-terminated wide
/// strings — copies of the chosen record's fields, independent of the
/// record's own lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderParams {
    pub payload_path: Vec<u16>,
    pub payload_options: Vec<u16>,
    pub timeout: u32,
}

/// Run one boot-time selection. Returns a verdict and, on anything but
/// `CONFIG_ERROR`, the parameters to hand to the loader.
pub fn select_boot_config(platform: &mut dyn Platform) -> (Verdict, Option<LoaderParams>) {
    let volume_count = platform.volume_count();
    if volume_count == 0 {
        log::error!("no volumes presented to the selector");
        return (Verdict::ConfigError, None);
    }

    let mut indices = match platform.allocate_index_buffer(volume_count) {
        Ok(v) => v,
        Err(e) => {
            log::error!("failed to allocate index buffer: {}", e);
            return (Verdict::ConfigError, None);
        }
    };

    if let Err(e) = platform.enumerate_cfg_parts(&mut indices) {
        log::error!("config partition enumeration failed: {}", e);
        return (Verdict::ConfigError, None);
    }

    if let Err(e) = platform.filter_cfg_parts(&mut indices) {
        log::error!("config partition filtering failed: {}", e);
        return (Verdict::ConfigError, None);
    }

    let mut errored = false;

    if indices.len() != ENV_NUM_CONFIG_PARTS {
        log::warn!(
            "expected {} config partitions, found {}",
            ENV_NUM_CONFIG_PARTS,
            indices.len()
        );
        errored = true;
    }

    let mut pool: [Option<Candidate>; POOL_SIZE] = Default::default();

    for &volume_index in indices.iter() {
        match loader::load(platform, volume_index) {
            Ok(outcome) => {
                if outcome.read_errored {
                    errored = true;
                }
                ranker::sift(
                    &mut pool,
                    Candidate {
                        volume_index,
                        record: outcome.record,
                    },
                    platform,
                );
            }
            Err(e) => {
                log::warn!("skipping volume {}: {}", volume_index, e);
                errored = true;
            }
        }
    }
    // `indices` is dropped here on every path above and below; nothing
    // further to release.

    let leader = pool[0].take();
    let runner_up = pool[1].take();

    let transition = transition::apply(leader, runner_up);

    if let Some(wb) = &transition.writeback {
        if loader::write_back(platform, wb.volume_index, &wb.record).is_err() {
            errored = true;
        }
    }

    let effective = match transition.effective {
        None => return (Verdict::ConfigError, None),
        Some(c) => c,
    };

    let params = LoaderParams {
        payload_path: effective.record.kernelfile,
        payload_options: effective.record.kernelparams,
        timeout: effective.record.watchdog_timeout_sec as u32,
    };

    let verdict = if errored {
        Verdict::ConfigPartiallyCorrupted
    } else {
        Verdict::Success
    };
    (verdict, Some(params))
}
