//! Total order over candidates and the top-2 ranker.

use pal::Platform;

use crate::bootloader::record::EnvironmentRecord;

/// How many candidates the state-transition engine needs: the leader and
/// the runner-up.
pub const TOP_K: usize = 2;

/// The candidate pool holds the top-2 *plus one scratch slot* for the
/// candidate currently being sifted in. Two slots alone are not enough:
/// inserting a candidate that loses to the current runner-up but beats
/// nothing would otherwise silently overwrite — and lose — a live
/// runner-up before it's ever compared against. See [`sift`].
pub const POOL_SIZE: usize = TOP_K + 1;

/// One volume's record, paired with the volume it came from (needed for
/// the boot-volume and volume-index tie-breaks, and so the
/// state-transition engine knows where to write a demotion back to).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub volume_index: usize,
    pub record: EnvironmentRecord,
}

/// Insert `new_candidate` into `pool`, maintaining the invariant that after
/// the call, `pool[0]` is the most-preferred candidate seen so far (across
/// every call) and `pool[1]` the second most-preferred. `pool[2]` (the
/// scratch slot) ends up holding whatever candidate is weakest among the
/// (up to) three considered by this call; it is simply overwritten by the
/// next call.
///
/// Implemented as a K-bubble: place the newcomer in the scratch slot, then
/// do one bubble pass from the scratch slot leftward, swapping a pair
/// whenever the right-hand side is preferred over the left.
pub fn sift(pool: &mut [Option<Candidate>; POOL_SIZE], new_candidate: Candidate, platform: &dyn Platform) {
    pool[POOL_SIZE - 1] = Some(new_candidate);

    for i in (1..POOL_SIZE).rev() {
        let (left, right) = pool.split_at_mut(i);
        if right_should_move_left(&left[i - 1], &right[0], platform) {
            std::mem::swap(&mut left[i - 1], &mut right[0]);
        }
    }
}

fn right_should_move_left(left: &Option<Candidate>, right: &Option<Candidate>, platform: &dyn Platform) -> bool {
    match (left, right) {
        // rule 1: a present candidate beats an absent slot.
        (None, Some(_)) => true,
        (Some(l), Some(r)) => precedes(r, l, platform),
        _ => false,
    }
}

/// True if `a` strictly precedes (is preferred over) `b` under rules 2-6
/// of the total order. Rule 1 (present vs. absent) is handled by the
/// caller, since it doesn't need a `Candidate` on both sides.
fn precedes(a: &Candidate, b: &Candidate, platform: &dyn Platform) -> bool {
    // rule 2: not in_progress beats in_progress.
    if a.record.in_progress != b.record.in_progress {
        return !a.record.in_progress;
    }
    // rule 3: higher revision beats lower.
    if a.record.revision != b.record.revision {
        return a.record.revision > b.record.revision;
    }
    // rule 4: lower ustate rank beats higher.
    let (rank_a, rank_b) = (a.record.ustate.rank(), b.record.ustate.rank());
    if rank_a != rank_b {
        return rank_a < rank_b;
    }
    // rule 5: on the boot volume beats not.
    let (boot_a, boot_b) = (
        platform.is_on_boot_volume(a.volume_index),
        platform.is_on_boot_volume(b.volume_index),
    );
    if boot_a != boot_b {
        return boot_a;
    }
    // rule 6: lower volume index beats higher.
    if a.volume_index != b.volume_index {
        return a.volume_index < b.volume_index;
    }
    // rule 7: equal, no swap.
    false
}
