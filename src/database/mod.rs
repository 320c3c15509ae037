use crate::model::{District, Party};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(String),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Row-level persistence for districts and their parties.
#[derive(Clone)]
pub struct DistrictsDatabase {
    pool: SqlitePool,
}

impl DistrictsDatabase {
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// In-memory database for tests. Pinned to a single connection so every
    /// query sees the same memory-backed store.
    pub async fn create_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))
    }

    /// Insert a district with zeroed tallies, returning its assigned id.
    pub async fn insert_district(&self, name: &str, seats: i64) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO districts (name, seats) VALUES (?, ?) RETURNING id",
        )
        .bind(name)
        .bind(seats)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Register parties in a district with zeroed tallies, in the given order.
    /// Returns the parties with their assigned ids.
    pub async fn insert_parties(&self, district_id: i64, names: &[String]) -> Result<Vec<Party>> {
        let mut tx = self.pool.begin().await?;
        let mut parties = Vec::with_capacity(names.len());

        for name in names {
            let id: i64 = sqlx::query_scalar(
                "INSERT INTO parties (district_id, name) VALUES (?, ?) RETURNING id",
            )
            .bind(district_id)
            .bind(name)
            .fetch_one(&mut *tx)
            .await?;
            parties.push(Party::new(id, name.clone()));
        }

        tx.commit().await?;
        Ok(parties)
    }

    /// Load a district with its parties in insertion (id) order.
    pub async fn get_district(&self, district_id: i64) -> Result<Option<District>> {
        let row: Option<DistrictRow> = sqlx::query_as(
            r#"
            SELECT id, name, seats, total_votes, valid_votes, disqualified_votes, vote_threshold
            FROM districts
            WHERE id = ?
            "#,
        )
        .bind(district_id)
        .fetch_optional(&self.pool)
        .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let parties: Vec<Party> = sqlx::query_as(
            r#"
            SELECT id, name, votes, qualified, first_round_seats,
                   second_round_seats, bonus_seat, total_seats
            FROM parties
            WHERE district_id = ?
            ORDER BY id
            "#,
        )
        .bind(district_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(District {
            id: row.id,
            name: row.name,
            seats: row.seats,
            total_votes: row.total_votes,
            valid_votes: row.valid_votes,
            disqualified_votes: row.disqualified_votes,
            vote_threshold: row.vote_threshold,
            parties,
        }))
    }

    pub async fn get_all_districts(&self) -> Result<Vec<DistrictRow>> {
        let districts = sqlx::query_as(
            r#"
            SELECT id, name, seats, total_votes, valid_votes, disqualified_votes, vote_threshold
            FROM districts
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(districts)
    }

    /// Write back every field the allocation engine derives, atomically.
    pub async fn update_results(&self, district: &District) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE districts
            SET total_votes = ?, valid_votes = ?, disqualified_votes = ?, vote_threshold = ?
            WHERE id = ?
            "#,
        )
        .bind(district.total_votes)
        .bind(district.valid_votes)
        .bind(district.disqualified_votes)
        .bind(district.vote_threshold)
        .bind(district.id)
        .execute(&mut *tx)
        .await?;

        for party in &district.parties {
            sqlx::query(
                r#"
                UPDATE parties
                SET votes = ?, qualified = ?, first_round_seats = ?,
                    second_round_seats = ?, bonus_seat = ?, total_seats = ?
                WHERE district_id = ? AND id = ?
                "#,
            )
            .bind(party.votes)
            .bind(party.qualified)
            .bind(party.first_round_seats)
            .bind(party.second_round_seats)
            .bind(party.bonus_seat)
            .bind(party.total_seats)
            .bind(district.id)
            .bind(party.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct DistrictRow {
    pub id: i64,
    pub name: String,
    pub seats: i64,
    pub total_votes: i64,
    pub valid_votes: i64,
    pub disqualified_votes: i64,
    pub vote_threshold: i64,
}
