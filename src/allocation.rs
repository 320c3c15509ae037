//! Seat allocation for a single district.
//!
//! Converts raw per-party tallies into a seat breakdown: parties clearing the
//! qualification threshold split `seats - 1` seats proportionally, rounding
//! error is reconciled against the fixed seat budget, and the plurality party
//! receives one guaranteed bonus seat.

use crate::model::{District, Party};

/// Fraction of the total vote a party must strictly exceed to qualify.
const QUALIFICATION_FRACTION: f64 = 0.0625;

/// Recompute every derived field on the district from its raw tallies.
///
/// Pure and deterministic: the only inputs are `seats`, `total_votes`, and
/// each party's `votes`; everything else is overwritten. Tie-breaks follow
/// party insertion order (see the individual steps below). The engine never
/// touches `id`, `name`, or `seats`.
///
/// `seats < 1` is rejected at the boundary before this runs; if such a
/// district reaches the engine anyway, the proportional pool is clamped at
/// zero so the computation stays total, but seat conservation is not
/// guaranteed for it.
pub fn compute_results(district: &mut District) {
    let total_votes = district.total_votes;
    district.valid_votes = 0;
    district.disqualified_votes = total_votes;
    district.vote_threshold = (total_votes as f64 * QUALIFICATION_FRACTION).floor() as i64;

    if total_votes <= 0 {
        reset_all_seats(district);
        return;
    }

    // Strict comparison: votes exactly at the threshold do not qualify.
    let threshold = district.vote_threshold;
    let qualified: Vec<usize> = district
        .parties
        .iter()
        .enumerate()
        .filter(|(_, p)| p.votes > threshold)
        .map(|(i, _)| i)
        .collect();

    if qualified.is_empty() {
        reset_all_seats(district);
        return;
    }

    let valid_votes: i64 = qualified.iter().map(|&i| district.parties[i].votes).sum();
    district.valid_votes = valid_votes;
    district.disqualified_votes = total_votes - valid_votes;

    // One seat is held back for the bonus award.
    let seats_for_proportional = (district.seats - 1).max(0);

    let mut allocated = 0;
    for &i in &qualified {
        let party = &mut district.parties[i];
        let share = (party.votes as f64 / valid_votes as f64 * seats_for_proportional as f64)
            .round() as i64;
        party.qualified = true;
        party.first_round_seats = share;
        party.second_round_seats = 0;
        party.bonus_seat = 0;
        party.total_seats = share;
        allocated += share;
    }

    // Rounding can leave part of the pool unassigned; the plurality party
    // (first in insertion order on a tie) absorbs the whole remainder.
    let remaining = seats_for_proportional - allocated;
    if remaining > 0 {
        let leader = plurality_index(&district.parties, &qualified);
        district.parties[leader].first_round_seats += remaining;
        district.parties[leader].total_seats += remaining;
    }

    // Bonus seat, selected independently of the remainder award (and possibly
    // landing on the same party).
    let bonus = plurality_index(&district.parties, &qualified);
    district.parties[bonus].bonus_seat = 1;
    district.parties[bonus].total_seats += 1;

    // Rounding can also overshoot the budget; the lowest-vote qualifier other
    // than the bonus holder gives the entire excess back. Ties pick the last
    // such party in insertion order, and the subtraction is not clamped at
    // zero: a large excess drives that party's seat count negative.
    let total_allocated: i64 = qualified
        .iter()
        .map(|&i| district.parties[i].total_seats)
        .sum();
    if total_allocated > district.seats {
        let excess = total_allocated - district.seats;
        if let Some(weakest) = weakest_index(&district.parties, &qualified, bonus) {
            district.parties[weakest].first_round_seats -= excess;
            district.parties[weakest].total_seats -= excess;
        }
    }

    // Non-qualifiers are re-zeroed unconditionally, covering stale results
    // from a previous calculation.
    for (i, party) in district.parties.iter_mut().enumerate() {
        if !qualified.contains(&i) {
            zero_party(party);
        }
    }
}

/// Shared zeroing path for the no-votes and no-qualifiers guard clauses.
fn reset_all_seats(district: &mut District) {
    for party in &mut district.parties {
        zero_party(party);
    }
}

fn zero_party(party: &mut Party) {
    party.qualified = false;
    party.first_round_seats = 0;
    party.second_round_seats = 0;
    party.bonus_seat = 0;
    party.total_seats = 0;
}

/// Index of the qualifying party with the strictly highest vote count.
/// Ties keep the first party in insertion order.
fn plurality_index(parties: &[Party], qualified: &[usize]) -> usize {
    let mut best = qualified[0];
    for &i in &qualified[1..] {
        if parties[i].votes > parties[best].votes {
            best = i;
        }
    }
    best
}

/// Index of the qualifying party with the lowest vote count, excluding the
/// bonus holder. Ties keep the last party in insertion order.
fn weakest_index(parties: &[Party], qualified: &[usize], bonus: usize) -> Option<usize> {
    let mut weakest: Option<usize> = None;
    for &i in qualified {
        if i == bonus {
            continue;
        }
        match weakest {
            Some(w) if parties[i].votes > parties[w].votes => {}
            _ => weakest = Some(i),
        }
    }
    weakest
}
