//! The environment record: the logical, owned form of one config
//! partition's contents. `codec` converts between this and the on-disk
//! byte layout.

/// Length, in UCS-2 code units including the forced terminator, of the
/// kernel image path field.
pub const KERNELFILE_LEN: usize = 80;

/// Length, in UCS-2 code units including the forced terminator, of the
/// kernel command line field.
pub const KERNELPARAMS_LEN: usize = 256;

/// Sentinel revision used to mark a record as known-bad. Compares lower
/// than every real revision (real revisions start at 1).
pub const REVISION_FAILED: u32 = 0;

/// Expected number of redundant config partitions. A filtered candidate
/// count that differs from this is a soft anomaly, not a hard failure.
pub const ENV_NUM_CONFIG_PARTS: usize = 2;

/// The A/B update state of one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UState {
    Ok,
    Installed,
    Testing,
    Failed,
    /// Any on-disk value outside the four known states. Ranks alongside
    /// `Failed` (see [`UState::rank`]) rather than being rejected outright
    /// — an unrecognized but otherwise CRC-valid record still degrades
    /// gracefully instead of vanishing from consideration.
    Unknown(u16),
}

impl UState {
    /// Ranking used by the ranker's tie-break 4: lower is more preferred.
    /// `INSTALLED=0, TESTING=1, OK=2, anything else=3`.
    pub fn rank(self) -> u8 {
        match self {
            UState::Installed => 0,
            UState::Testing => 1,
            UState::Ok => 2,
            UState::Failed | UState::Unknown(_) => 3,
        }
    }

    pub(crate) fn to_raw(self) -> u16 {
        match self {
            UState::Ok => 0,
            UState::Installed => 1,
            UState::Testing => 2,
            UState::Failed => 3,
            UState::Unknown(v) => v,
        }
    }

    pub(crate) fn from_raw(v: u16) -> Self {
        match v {
            0 => UState::Ok,
            1 => UState::Installed,
            2 => UState::Testing,
            3 => UState::Failed,
            other => UState::Unknown(other),
        }
    }
}

/// One config partition's decoded contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentRecord {
    pub revision: u32,
    pub in_progress: bool,
    pub ustate: UState,
    pub watchdog_timeout_sec: u16,
    /// UCS-2, NUL-terminated at the last slot after decode (defensive,
    /// regardless of what the partition actually contained).
    pub kernelfile: Vec<u16>,
    pub kernelparams: Vec<u16>,
}

/// Force the last code unit to the string terminator. Applied after every
/// decode so a corrupted-but-CRC-valid record (can't happen if the CRC
/// truly covers the whole record, but the defense is cheap and mirrors the
/// on-disk format's own intent) can never produce an unterminated string.
pub(crate) fn force_nul_terminate(units: &mut [u16]) {
    if let Some(last) = units.last_mut() {
        *last = 0;
    }
}

/// Encode a UTF-8 string as a fixed-length, NUL-terminated UCS-2 buffer of
/// exactly `len` code units, truncating as needed. Code points outside the
/// Basic Multilingual Plane are not representable in UCS-2 and are
/// replaced with `?`. Test/fixture helper; production records are decoded
/// from the partition, not constructed from `&str`.
#[cfg(test)]
pub(crate) fn ucs2_of(s: &str, len: usize) -> Vec<u16> {
    let mut units: Vec<u16> = s
        .chars()
        .map(|c| if (c as u32) <= 0xFFFF { c as u16 } else { b'?' as u16 })
        .take(len.saturating_sub(1))
        .collect();
    units.resize(len, 0);
    force_nul_terminate(&mut units);
    units
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rank_orders_installed_testing_ok_then_everything_else() {
        assert!(UState::Installed.rank() < UState::Testing.rank());
        assert!(UState::Testing.rank() < UState::Ok.rank());
        assert!(UState::Ok.rank() < UState::Failed.rank());
        assert_eq!(UState::Failed.rank(), UState::Unknown(200).rank());
    }

    #[test]
    fn raw_round_trip_for_known_states() {
        for s in [UState::Ok, UState::Installed, UState::Testing, UState::Failed] {
            assert_eq!(UState::from_raw(s.to_raw()), s);
        }
    }

    #[test]
    fn unknown_raw_value_preserved() {
        assert_eq!(UState::from_raw(42), UState::Unknown(42));
        assert_eq!(UState::Unknown(42).to_raw(), 42);
    }

    #[test]
    fn ucs2_of_truncates_and_terminates() {
        let units = ucs2_of("hello", 4);
        assert_eq!(units, vec!['h' as u16, 'e' as u16, 'l' as u16, 0]);
    }
}
