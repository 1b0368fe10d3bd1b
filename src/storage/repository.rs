use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{Couple, FinancialData, FinancialRecord, User, UserId, YearMonth};

use super::MIGRATION_001_INITIAL;

/// Repository for persisting and querying users, couples and monthly records.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given path.
    /// Creates the database file if the URL asks for it (`mode=rwc`).
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // User operations
    // ========================

    /// Save a new user.
    pub async fn save_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, avatar_url, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.avatar_url)
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save user")?;
        Ok(())
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, avatar_url, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    /// Get a user by name.
    pub async fn get_user_by_name(&self, name: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, avatar_url, created_at
            FROM users
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by name")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    /// List all users by name.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query("SELECT id, name, avatar_url, created_at FROM users ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")?;

        rows.iter().map(Self::row_to_user).collect()
    }

    /// Overwrite the profile fields of an existing user.
    pub async fn update_user(&self, user: &User) -> Result<()> {
        sqlx::query("UPDATE users SET name = ?, avatar_url = ? WHERE id = ?")
            .bind(&user.name)
            .bind(&user.avatar_url)
            .bind(user.id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update user")?;
        Ok(())
    }

    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(User {
            id: Uuid::parse_str(&id_str).context("Invalid user ID")?,
            name: row.get("name"),
            avatar_url: row.get("avatar_url"),
            created_at: parse_timestamp(&created_at_str).context("Invalid created_at timestamp")?,
        })
    }

    // ========================
    // Couple operations
    // ========================

    /// Save a new couple.
    pub async fn save_couple(&self, couple: &Couple) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO couples (id, user1_id, user2_id, connected_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(couple.id.to_string())
        .bind(couple.user1_id.to_string())
        .bind(couple.user2_id.to_string())
        .bind(couple.connected_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save couple")?;
        Ok(())
    }

    /// Find the couple a user belongs to, on either side.
    pub async fn get_couple_for_user(&self, user_id: UserId) -> Result<Option<Couple>> {
        let id = user_id.to_string();
        let row = sqlx::query(
            r#"
            SELECT id, user1_id, user2_id, connected_at
            FROM couples
            WHERE user1_id = ? OR user2_id = ?
            "#,
        )
        .bind(&id)
        .bind(&id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch couple for user")?;

        row.as_ref().map(Self::row_to_couple).transpose()
    }

    /// Delete a couple. Records of both members are kept.
    pub async fn delete_couple(&self, couple: &Couple) -> Result<()> {
        sqlx::query("DELETE FROM couples WHERE id = ?")
            .bind(couple.id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete couple")?;
        Ok(())
    }

    fn row_to_couple(row: &sqlx::sqlite::SqliteRow) -> Result<Couple> {
        let id_str: String = row.get("id");
        let user1_str: String = row.get("user1_id");
        let user2_str: String = row.get("user2_id");
        let connected_at_str: String = row.get("connected_at");

        Ok(Couple {
            id: Uuid::parse_str(&id_str).context("Invalid couple ID")?,
            user1_id: Uuid::parse_str(&user1_str).context("Invalid user1_id")?,
            user2_id: Uuid::parse_str(&user2_str).context("Invalid user2_id")?,
            connected_at: parse_timestamp(&connected_at_str)
                .context("Invalid connected_at timestamp")?,
        })
    }

    // ========================
    // Financial record operations
    // ========================

    /// Insert a record, or replace the ledger of the existing record for the
    /// same user and month. Returns the record as stored: on replace, the
    /// original `id` and `created_at` are kept.
    pub async fn upsert_record(&self, record: &FinancialRecord) -> Result<FinancialRecord> {
        let data_json =
            serde_json::to_string(&record.data).context("Failed to serialize ledger data")?;
        let image_urls_json =
            serde_json::to_string(&record.image_urls).context("Failed to serialize image URLs")?;

        sqlx::query(
            r#"
            INSERT INTO financial_records (id, user_id, year, month, data, image_urls, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id, year, month) DO UPDATE SET
                data = excluded.data,
                image_urls = excluded.image_urls,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.user_id.to_string())
        .bind(record.period.year)
        .bind(record.period.month)
        .bind(&data_json)
        .bind(&image_urls_json)
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save financial record")?;

        self.get_record(record.user_id, record.period)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Financial record vanished after save"))
    }

    /// Get one user's record for a month.
    pub async fn get_record(
        &self,
        user_id: UserId,
        period: YearMonth,
    ) -> Result<Option<FinancialRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, year, month, data, image_urls, created_at, updated_at
            FROM financial_records
            WHERE user_id = ? AND year = ? AND month = ?
            "#,
        )
        .bind(user_id.to_string())
        .bind(period.year)
        .bind(period.month)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch financial record")?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    /// List a user's records, most recent month first.
    pub async fn list_records_for_user(&self, user_id: UserId) -> Result<Vec<FinancialRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, year, month, data, image_urls, created_at, updated_at
            FROM financial_records
            WHERE user_id = ?
            ORDER BY year DESC, month DESC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list financial records")?;

        rows.iter().map(Self::row_to_record).collect()
    }

    /// Delete one user's record for a month. Returns false if none existed.
    pub async fn delete_record(&self, user_id: UserId, period: YearMonth) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM financial_records WHERE user_id = ? AND year = ? AND month = ?")
                .bind(user_id.to_string())
                .bind(period.year)
                .bind(period.month)
                .execute(&self.pool)
                .await
                .context("Failed to delete financial record")?;
        Ok(result.rows_affected() > 0)
    }

    /// Distinct months with a record from either user, most recent first.
    pub async fn list_periods_for_users(
        &self,
        first: UserId,
        second: UserId,
    ) -> Result<Vec<YearMonth>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT year, month
            FROM financial_records
            WHERE user_id = ? OR user_id = ?
            ORDER BY year DESC, month DESC
            "#,
        )
        .bind(first.to_string())
        .bind(second.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list record months")?;

        rows.iter().map(Self::row_to_period).collect()
    }

    fn row_to_period(row: &sqlx::sqlite::SqliteRow) -> Result<YearMonth> {
        let year: i64 = row.get("year");
        let month: i64 = row.get("month");

        let year = i32::try_from(year).context("Invalid record year")?;
        let month = u32::try_from(month).context("Invalid record month")?;
        YearMonth::new(year, month).context("Invalid record period")
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<FinancialRecord> {
        let id_str: String = row.get("id");
        let user_id_str: String = row.get("user_id");
        let data_json: String = row.get("data");
        let image_urls_json: String = row.get("image_urls");
        let created_at_str: String = row.get("created_at");
        let updated_at_str: String = row.get("updated_at");

        let data: FinancialData =
            serde_json::from_str(&data_json).context("Invalid ledger data JSON")?;

        Ok(FinancialRecord {
            id: Uuid::parse_str(&id_str).context("Invalid record ID")?,
            user_id: Uuid::parse_str(&user_id_str).context("Invalid record user_id")?,
            period: Self::row_to_period(row)?,
            data,
            image_urls: serde_json::from_str(&image_urls_json)
                .context("Invalid image_urls JSON")?,
            created_at: parse_timestamp(&created_at_str).context("Invalid created_at timestamp")?,
            updated_at: parse_timestamp(&updated_at_str).context("Invalid updated_at timestamp")?,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}
