//! SQLite storage for save profiles.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use uuid::Uuid;

use super::profile::SaveProfile;
use crate::error::StoreError;

/// Summary of a stored slot, for listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSummary {
    pub slot: String,
    pub profile_id: Uuid,
    pub saved_at: Option<DateTime<Utc>>,
}

pub struct SaveStore {
    pool: SqlitePool,
}

impl SaveStore {
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        // Run migrations
        Self::migrate(&pool).await?;

        Ok(Self { pool })
    }

    async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS save_profiles (
                slot TEXT PRIMARY KEY NOT NULL,
                profile_id TEXT NOT NULL,
                flags_json TEXT NOT NULL DEFAULT '[]',
                defeated_bosses_json TEXT NOT NULL DEFAULT '[]',
                saved_at TEXT
            )
            "#,
        )
        .execute(pool)
        .await?;

        tracing::info!("Save store migrations complete");
        Ok(())
    }

    /// Insert or overwrite the profile's slot. Stamps `saved_at`.
    pub async fn save_profile(&self, profile: &mut SaveProfile) -> Result<(), StoreError> {
        let flags_json = serde_json::to_string(&profile.flags)?;
        let bosses_json = serde_json::to_string(&profile.defeated_bosses)?;
        let saved_at = Utc::now();

        sqlx::query(
            r#"INSERT INTO save_profiles (slot, profile_id, flags_json, defeated_bosses_json, saved_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(slot) DO UPDATE SET
                profile_id = excluded.profile_id,
                flags_json = excluded.flags_json,
                defeated_bosses_json = excluded.defeated_bosses_json,
                saved_at = excluded.saved_at"#,
        )
        .bind(&profile.slot)
        .bind(profile.profile_id.to_string())
        .bind(&flags_json)
        .bind(&bosses_json)
        .bind(saved_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        profile.saved_at = Some(saved_at);
        tracing::info!(
            "Saved profile '{}' ({} flags, {} bosses)",
            profile.slot,
            profile.flags.len(),
            profile.defeated_bosses.len()
        );
        Ok(())
    }

    pub async fn load_profile(&self, slot: &str) -> Result<Option<SaveProfile>, StoreError> {
        let row = sqlx::query(
            "SELECT slot, profile_id, flags_json, defeated_bosses_json, saved_at FROM save_profiles WHERE slot = ?",
        )
        .bind(slot)
        .fetch_optional(&self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        let profile_id: String = r.get("profile_id");
        let flags_json: String = r.get("flags_json");
        let bosses_json: String = r.get("defeated_bosses_json");
        let saved_at: Option<String> = r.get("saved_at");

        Ok(Some(SaveProfile {
            slot: r.get("slot"),
            profile_id: parse_profile_id(&profile_id)?,
            flags: serde_json::from_str(&flags_json)?,
            defeated_bosses: serde_json::from_str(&bosses_json)?,
            saved_at: saved_at.as_deref().and_then(parse_timestamp),
        }))
    }

    /// Returns false if the slot did not exist
    pub async fn delete_profile(&self, slot: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM save_profiles WHERE slot = ?")
            .bind(slot)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_slots(&self) -> Result<Vec<SlotSummary>, StoreError> {
        let rows = sqlx::query("SELECT slot, profile_id, saved_at FROM save_profiles ORDER BY slot")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| -> Result<SlotSummary, StoreError> {
                let profile_id: String = r.get("profile_id");
                let saved_at: Option<String> = r.get("saved_at");
                Ok(SlotSummary {
                    slot: r.get("slot"),
                    profile_id: parse_profile_id(&profile_id)?,
                    saved_at: saved_at.as_deref().and_then(parse_timestamp),
                })
            })
            .collect()
    }
}

fn parse_profile_id(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(|_| StoreError::InvalidProfileId(raw.to_string()))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            tracing::warn!("Ignoring unreadable saved_at '{}': {}", raw, e);
            None
        }
    }
}
