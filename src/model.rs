use serde::{Deserialize, Serialize};

/// A multi-seat electoral district with its registered parties.
///
/// `id`, `name`, and `seats` are fixed at creation. The remaining fields are
/// derived tallies, overwritten by the allocation engine on every calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct District {
    pub id: i64,
    pub name: String,
    /// Total legislative seats apportioned to the district.
    pub seats: i64,
    /// Total ballots cast, including votes for disqualified or unlisted choices.
    pub total_votes: i64,
    /// Sum of votes belonging to qualifying parties.
    pub valid_votes: i64,
    /// `total_votes - valid_votes`.
    pub disqualified_votes: i64,
    /// Minimum vote count (exclusive) a party must exceed to qualify.
    pub vote_threshold: i64,
    /// Insertion order is load-bearing: it decides tie-breaks in the engine.
    pub parties: Vec<Party>,
}

/// A party's raw tally and seat breakdown within one district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub id: i64,
    pub name: String,
    pub votes: i64,
    pub qualified: bool,
    pub first_round_seats: i64,
    /// Reserved for a second allocation round; the current engine never awards one.
    pub second_round_seats: i64,
    /// 0 or 1; at most one party per district holds the bonus seat.
    pub bonus_seat: i64,
    pub total_seats: i64,
}

impl Party {
    /// A freshly registered party with zeroed tallies.
    pub fn new(id: i64, name: String) -> Self {
        Self {
            id,
            name,
            votes: 0,
            qualified: false,
            first_round_seats: 0,
            second_round_seats: 0,
            bonus_seat: 0,
            total_seats: 0,
        }
    }
}
