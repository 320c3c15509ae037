//! Command handlers: boundary validation, vote entry, and orchestration of
//! load -> calculate -> persist. All domain errors are raised here; the
//! allocation engine itself never fails on validated input.

use crate::allocation;
use crate::database::{DatabaseError, DistrictsDatabase};
use crate::model::{District, Party};
use itertools::Itertools;
use std::collections::HashSet;

#[derive(Debug, thiserror::Error)]
pub enum TallyError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("{0}")]
    Validation(String),
    #[error("District with ID {0} not found")]
    DistrictNotFound(i64),
    #[error("Party {0} not found in district")]
    PartyNotFound(String),
}

pub type Result<T> = std::result::Result<T, TallyError>;

/// Create a district with a fixed seat apportionment and zeroed tallies.
pub async fn create_district(
    db: &DistrictsDatabase,
    name: &str,
    seats: i64,
) -> Result<District> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TallyError::Validation(
            "District name cannot be empty".to_string(),
        ));
    }
    // seats = 0 would leave no seat for the bonus award and corrupt the
    // proportional pool, so it is rejected here rather than in the engine.
    if seats < 1 {
        return Err(TallyError::Validation(
            "Seats must be a positive integer".to_string(),
        ));
    }

    let id = db.insert_district(name, seats).await?;
    Ok(District {
        id,
        name: name.to_string(),
        seats,
        total_votes: 0,
        valid_votes: 0,
        disqualified_votes: 0,
        vote_threshold: 0,
        parties: Vec::new(),
    })
}

/// Register parties in a district, in ballot order, with zeroed tallies.
pub async fn add_parties(
    db: &DistrictsDatabase,
    district_id: i64,
    names: &[String],
) -> Result<Vec<Party>> {
    if names.is_empty() {
        return Err(TallyError::Validation(
            "At least one party name is required".to_string(),
        ));
    }

    let mut trimmed = Vec::with_capacity(names.len());
    let mut seen = HashSet::new();
    for name in names {
        let name = name.trim();
        if name.is_empty() {
            return Err(TallyError::Validation(
                "Party name cannot be empty".to_string(),
            ));
        }
        if !seen.insert(name.to_string()) {
            return Err(TallyError::Validation(format!(
                "Duplicate party name: {}",
                name
            )));
        }
        trimmed.push(name.to_string());
    }

    let district = db
        .get_district(district_id)
        .await?
        .ok_or(TallyError::DistrictNotFound(district_id))?;
    for party in &district.parties {
        if seen.contains(&party.name) {
            return Err(TallyError::Validation(format!(
                "Party {} already registered in district",
                party.name
            )));
        }
    }

    Ok(db.insert_parties(district_id, &trimmed).await?)
}

/// One `name=votes` pair from the command line.
pub fn parse_vote_entry(raw: &str) -> Result<(String, i64)> {
    let (name, count) = raw.split_once('=').ok_or_else(|| {
        TallyError::Validation(format!("Expected name=votes, got: {}", raw))
    })?;
    let name = name.trim();
    if name.is_empty() {
        return Err(TallyError::Validation(
            "Party name cannot be empty".to_string(),
        ));
    }
    let votes: i64 = count.trim().parse().map_err(|_| {
        TallyError::Validation(format!("Votes for {} must be a valid integer", name))
    })?;
    if votes < 0 {
        return Err(TallyError::Validation(format!(
            "Votes for {} cannot be negative",
            name
        )));
    }
    Ok((name.to_string(), votes))
}

/// Apply a district's vote tallies, recalculate the seat allocation, and
/// persist the result. Returns the recalculated district.
pub async fn record_votes(
    db: &DistrictsDatabase,
    district_id: i64,
    total_votes: i64,
    entries: &[(String, i64)],
) -> Result<District> {
    if total_votes < 0 {
        return Err(TallyError::Validation(
            "Total votes cannot be negative".to_string(),
        ));
    }

    let mut district = db
        .get_district(district_id)
        .await?
        .ok_or(TallyError::DistrictNotFound(district_id))?;

    district.total_votes = total_votes;
    for (name, votes) in entries {
        let party = district
            .parties
            .iter_mut()
            .find(|p| &p.name == name)
            .ok_or_else(|| TallyError::PartyNotFound(name.clone()))?;
        party.votes = *votes;
    }

    allocation::compute_results(&mut district);
    db.update_results(&district).await?;
    Ok(district)
}

/// Load a district with its parties, or fail with `DistrictNotFound`.
pub async fn show_district(db: &DistrictsDatabase, district_id: i64) -> Result<District> {
    db.get_district(district_id)
        .await?
        .ok_or(TallyError::DistrictNotFound(district_id))
}

/// Human-readable one-line summary of a district's qualifying parties.
pub fn summarize_parties(district: &District) -> String {
    district
        .parties
        .iter()
        .filter(|p| p.qualified)
        .map(|p| format!("{}: {}", p.name, p.total_seats))
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_db() -> (DistrictsDatabase, i64) {
        let db = DistrictsDatabase::create_in_memory().await.unwrap();
        let district = create_district(&db, "North", 10).await.unwrap();
        add_parties(
            &db,
            district.id,
            &["A".to_string(), "B".to_string(), "C".to_string()],
        )
        .await
        .unwrap();
        (db, district.id)
    }

    #[tokio::test]
    async fn create_district_rejects_bad_input() {
        let db = DistrictsDatabase::create_in_memory().await.unwrap();
        assert!(matches!(
            create_district(&db, "  ", 10).await,
            Err(TallyError::Validation(_))
        ));
        assert!(matches!(
            create_district(&db, "North", 0).await,
            Err(TallyError::Validation(_))
        ));
        assert!(matches!(
            create_district(&db, "North", -3).await,
            Err(TallyError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn add_parties_validates_names_and_district() {
        let db = DistrictsDatabase::create_in_memory().await.unwrap();
        let district = create_district(&db, "North", 10).await.unwrap();

        assert!(matches!(
            add_parties(&db, district.id, &[]).await,
            Err(TallyError::Validation(_))
        ));
        assert!(matches!(
            add_parties(&db, district.id, &["".to_string()]).await,
            Err(TallyError::Validation(_))
        ));
        assert!(matches!(
            add_parties(&db, district.id, &["A".to_string(), "A".to_string()]).await,
            Err(TallyError::Validation(_))
        ));
        assert!(matches!(
            add_parties(&db, 99, &["A".to_string()]).await,
            Err(TallyError::DistrictNotFound(99))
        ));

        add_parties(&db, district.id, &["A".to_string()]).await.unwrap();
        assert!(matches!(
            add_parties(&db, district.id, &["A".to_string()]).await,
            Err(TallyError::Validation(_))
        ));
    }

    #[test]
    fn vote_entry_parsing() {
        assert_eq!(parse_vote_entry("A=600").unwrap(), ("A".to_string(), 600));
        assert_eq!(
            parse_vote_entry(" B = 42 ").unwrap(),
            ("B".to_string(), 42)
        );
        assert!(matches!(
            parse_vote_entry("A"),
            Err(TallyError::Validation(_))
        ));
        assert!(matches!(
            parse_vote_entry("=600"),
            Err(TallyError::Validation(_))
        ));
        assert!(matches!(
            parse_vote_entry("A=sixty"),
            Err(TallyError::Validation(_))
        ));
        assert!(matches!(
            parse_vote_entry("A=-1"),
            Err(TallyError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn record_votes_calculates_and_persists() {
        let (db, district_id) = seeded_db().await;
        let entries = vec![
            ("A".to_string(), 600),
            ("B".to_string(), 300),
            ("C".to_string(), 100),
        ];
        let district = record_votes(&db, district_id, 1000, &entries)
            .await
            .unwrap();

        assert_eq!(district.vote_threshold, 62);
        assert_eq!(district.parties[0].total_seats, 6);
        assert_eq!(district.parties[1].total_seats, 3);
        assert_eq!(district.parties[2].total_seats, 1);

        // The derived fields must survive a reload.
        let reloaded = db.get_district(district_id).await.unwrap().unwrap();
        assert_eq!(reloaded, district);
    }

    #[tokio::test]
    async fn record_votes_rejects_unknown_party() {
        let (db, district_id) = seeded_db().await;
        let entries = vec![("Nonexistent".to_string(), 10)];
        assert!(matches!(
            record_votes(&db, district_id, 1000, &entries).await,
            Err(TallyError::PartyNotFound(_))
        ));
    }

    #[tokio::test]
    async fn record_votes_rejects_negative_total() {
        let (db, district_id) = seeded_db().await;
        assert!(matches!(
            record_votes(&db, district_id, -1, &[]).await,
            Err(TallyError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn record_votes_rejects_missing_district() {
        let db = DistrictsDatabase::create_in_memory().await.unwrap();
        assert!(matches!(
            record_votes(&db, 7, 1000, &[]).await,
            Err(TallyError::DistrictNotFound(7))
        ));
    }
}
