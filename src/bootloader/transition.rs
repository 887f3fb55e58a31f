//! The A/B state-transition engine.

use crate::bootloader::ranker::Candidate;
use crate::bootloader::record::{EnvironmentRecord, UState, REVISION_FAILED};

/// A record that needs to be written back to the volume it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBack {
    pub volume_index: usize,
    pub record: EnvironmentRecord,
}

/// The outcome of applying the transition rules to the ranked top two.
///
/// `effective` is `None` exactly when selection must produce
/// `CONFIG_ERROR`: no leader, the leader is mid-write, or the leader was
/// demoted and there is no runner-up to fall back to. `writeback` is
/// independent of that: a TESTING leader gets marked FAILED (and an
/// INSTALLED leader gets marked TESTING) whether or not a runner-up exists
/// to fall back to, because the demotion itself must still be persisted.
pub struct Transition {
    pub effective: Option<Candidate>,
    pub writeback: Option<WriteBack>,
}

/// Apply the four state-transition rules, in order, to the ranked top two.
pub fn apply(leader: Option<Candidate>, runner_up: Option<Candidate>) -> Transition {
    let mut leader = match leader {
        None => {
            return Transition {
                effective: None,
                writeback: None,
            }
        }
        Some(l) => l,
    };

    // rule 1: no leader, or the leader is mid-write -> CONFIG_ERROR.
    if leader.record.in_progress {
        return Transition {
            effective: None,
            writeback: None,
        };
    }

    match leader.record.ustate {
        // rule 2: the previous boot attempted to verify this update and
        // rebooted without success. Demote it permanently and fall back.
        UState::Testing => {
            leader.record.ustate = UState::Failed;
            leader.record.revision = REVISION_FAILED;
            let writeback = Some(WriteBack {
                volume_index: leader.volume_index,
                record: leader.record.clone(),
            });
            Transition {
                effective: runner_up,
                writeback,
            }
        }
        // rule 3: first boot of a freshly installed configuration. Put it
        // on probation; it remains the effective choice.
        UState::Installed => {
            leader.record.ustate = UState::Testing;
            let writeback = Some(WriteBack {
                volume_index: leader.volume_index,
                record: leader.record.clone(),
            });
            Transition {
                effective: Some(leader),
                writeback,
            }
        }
        // rule 4: otherwise the leader is the effective choice, unchanged.
        _ => Transition {
            effective: Some(leader),
            writeback: None,
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bootloader::record::{ucs2_of, EnvironmentRecord, KERNELFILE_LEN, KERNELPARAMS_LEN};

    fn candidate(volume_index: usize, revision: u32, ustate: UState, in_progress: bool) -> Candidate {
        Candidate {
            volume_index,
            record: EnvironmentRecord {
                revision,
                in_progress,
                ustate,
                watchdog_timeout_sec: 30,
                kernelfile: ucs2_of("\\kernel", KERNELFILE_LEN),
                kernelparams: ucs2_of("", KERNELPARAMS_LEN),
            },
        }
    }

    #[test]
    fn no_leader_is_config_error() {
        let t = apply(None, None);
        assert!(t.effective.is_none());
        assert!(t.writeback.is_none());
    }

    #[test]
    fn in_progress_leader_is_config_error_with_no_writeback() {
        let leader = candidate(0, 5, UState::Ok, true);
        let t = apply(Some(leader), None);
        assert!(t.effective.is_none());
        assert!(t.writeback.is_none());
    }

    #[test]
    fn ok_leader_is_effective_unchanged() {
        let leader = candidate(0, 5, UState::Ok, false);
        let t = apply(Some(leader.clone()), None);
        assert_eq!(t.effective, Some(leader));
        assert!(t.writeback.is_none());
    }

    #[test]
    fn installed_leader_is_promoted_to_testing_and_stays_effective() {
        let leader = candidate(0, 5, UState::Installed, false);
        let t = apply(Some(leader), None);

        let effective = t.effective.expect("installed leader stays effective");
        assert_eq!(effective.record.ustate, UState::Testing);
        assert_eq!(effective.record.revision, 5);

        let wb = t.writeback.expect("promotion must be written back");
        assert_eq!(wb.volume_index, 0);
        assert_eq!(wb.record.ustate, UState::Testing);
        assert_eq!(wb.record.revision, 5);
    }

    #[test]
    fn testing_leader_with_runner_up_falls_back_and_demotes_leader() {
        let leader = candidate(0, 5, UState::Testing, false);
        let runner_up = candidate(1, 3, UState::Ok, false);
        let t = apply(Some(leader), Some(runner_up.clone()));

        assert_eq!(t.effective, Some(runner_up));
        let wb = t.writeback.expect("demotion must be written back");
        assert_eq!(wb.volume_index, 0);
        assert_eq!(wb.record.ustate, UState::Failed);
        assert_eq!(wb.record.revision, REVISION_FAILED);
    }

    #[test]
    fn testing_leader_with_no_runner_up_is_config_error_but_still_demotes() {
        let leader = candidate(0, 5, UState::Testing, false);
        let t = apply(Some(leader), None);

        assert!(t.effective.is_none());
        let wb = t.writeback.expect("demotion must still be written back");
        assert_eq!(wb.record.ustate, UState::Failed);
        assert_eq!(wb.record.revision, REVISION_FAILED);
    }
}
