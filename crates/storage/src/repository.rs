//! Repository Implementation

use crate::schema::SCHEMA;
use crate::{now_ms, StorageError};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Capacity of the change feed before slow subscribers start lagging
const CHANGE_FEED_CAPACITY: usize = 256;

/// User account record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: Option<String>,
    pub city: String,
    pub full_name: Option<String>,
    pub preferred_language: String,
    pub role: String,
    pub created_at_ms: i64,
}

/// Fields needed to create a user
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub city: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<String>,
}

/// Stored sensor reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SensorRecord {
    pub id: i64,
    pub pm10: f64,
    pub pm25: f64,
    pub co2: f64,
    pub humidity: f64,
    pub temperature: f64,
    pub aqi_value: i64,
    pub aqi_level: String,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub location_name: Option<String>,
    pub created_by: Option<i64>,
    pub recorded_at_ms: i64,
}

/// Alert rule record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AlertRecord {
    pub id: i64,
    pub user_id: i64,
    pub alert_type: String,
    pub threshold_value: f64,
    pub is_enabled: bool,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

/// Alert log record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AlertLogRecord {
    pub id: i64,
    pub user_id: i64,
    pub alert_type: String,
    pub message: String,
    pub is_read: bool,
    pub sensor_reading_id: Option<i64>,
    pub created_at_ms: i64,
}

/// Row inserted into one of the observed tables
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "table", content = "row", rename_all = "snake_case")]
pub enum ChangeEvent {
    ReadingInserted(SensorRecord),
    AlertLogInserted(AlertLogRecord),
}

/// Map unique-constraint violations on `users` to a conflict
fn map_user_conflict(err: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let field = if db.message().contains("users.email") {
                "Email"
            } else {
                "Username"
            };
            return StorageError::Conflict(format!("{} already exists", field));
        }
    }
    StorageError::DatabaseError(err)
}

/// Repository for data access
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
    changes: broadcast::Sender<ChangeEvent>,
}

impl Repository {
    /// Open (or create) a SQLite database and bootstrap the schema
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        info!("Opening SQLite database at {}", url);
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    /// Create a private in-memory database
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        // Every connection to :memory: is a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, StorageError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Ok(Self { pool, changes })
    }

    /// Subscribe to inserted rows
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    fn publish(&self, event: ChangeEvent) {
        // No subscribers is fine
        let _ = self.changes.send(event);
    }

    /// Check that the database answers
    pub async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // ---- users ----

    /// Create a user
    /// Insert a user; the username is checked for duplicates before the email
    pub async fn create_user(&self, user: NewUser) -> Result<UserRecord, StorageError> {
        if self.find_user_by_username(&user.username).await?.is_some() {
            return Err(StorageError::Conflict("Username already exists".to_string()));
        }
        if let Some(email) = &user.email {
            if self.find_user_by_email(email).await?.is_some() {
                return Err(StorageError::Conflict("Email already exists".to_string()));
            }
        }

        // The unique indexes still catch concurrent registrations
        let id = sqlx::query(
            "INSERT INTO users (username, password_hash, email, city, full_name, role, created_at_ms)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(user.city.as_deref().unwrap_or("Delhi"))
        .bind(&user.full_name)
        .bind(user.role.as_deref().unwrap_or("user"))
        .bind(now_ms())
        .execute(&self.pool)
        .await
        .map_err(map_user_conflict)?
        .last_insert_rowid();

        info!(user_id = id, "Created user {}", user.username);
        self.find_user_by_id(id).await?.ok_or(StorageError::NotFound)
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        Ok(sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError> {
        Ok(sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<UserRecord>, StorageError> {
        Ok(sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Update a user's city
    pub async fn update_city(&self, user_id: i64, city: &str) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE users SET city = ? WHERE id = ?")
            .bind(city)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    /// Whether the user holds a role
    pub async fn has_role(&self, user_id: i64, role: &str) -> Result<bool, StorageError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE id = ? AND role = ?")
            .bind(user_id)
            .bind(role)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Create the admin account unless the username already exists
    pub async fn seed_admin(&self, username: &str, password_hash: &str) -> Result<UserRecord, StorageError> {
        if let Some(existing) = self.find_user_by_username(username).await? {
            debug!("Admin user {} already present", username);
            return Ok(existing);
        }
        self.create_user(NewUser {
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            role: Some("admin".to_string()),
            ..Default::default()
        })
        .await
    }

    // ---- readings ----

    /// Insert a reading; `id` is ignored and assigned by the database
    pub async fn insert_reading(&self, mut record: SensorRecord) -> Result<SensorRecord, StorageError> {
        record.id = sqlx::query(
            "INSERT INTO sensor_readings
                (pm10, pm25, co2, humidity, temperature, aqi_value, aqi_level,
                 location_lat, location_lng, location_name, created_by, recorded_at_ms)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.pm10)
        .bind(record.pm25)
        .bind(record.co2)
        .bind(record.humidity)
        .bind(record.temperature)
        .bind(record.aqi_value)
        .bind(&record.aqi_level)
        .bind(record.location_lat)
        .bind(record.location_lng)
        .bind(&record.location_name)
        .bind(record.created_by)
        .bind(record.recorded_at_ms)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        debug!(reading_id = record.id, "Inserted reading");
        self.publish(ChangeEvent::ReadingInserted(record.clone()));
        Ok(record)
    }

    /// Most recent reading
    pub async fn latest_reading(&self) -> Result<Option<SensorRecord>, StorageError> {
        Ok(sqlx::query_as::<_, SensorRecord>(
            "SELECT * FROM sensor_readings ORDER BY recorded_at_ms DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Get recent readings, newest first
    pub async fn recent_readings(&self, limit: i64) -> Result<Vec<SensorRecord>, StorageError> {
        self.readings_between(None, None, limit).await
    }

    /// Readings in an inclusive time range, newest first
    pub async fn readings_between(
        &self,
        start_ms: Option<i64>,
        end_ms: Option<i64>,
        limit: i64,
    ) -> Result<Vec<SensorRecord>, StorageError> {
        Ok(sqlx::query_as::<_, SensorRecord>(
            "SELECT * FROM sensor_readings
             WHERE (? IS NULL OR recorded_at_ms >= ?)
               AND (? IS NULL OR recorded_at_ms <= ?)
             ORDER BY recorded_at_ms DESC, id DESC
             LIMIT ?",
        )
        .bind(start_ms)
        .bind(start_ms)
        .bind(end_ms)
        .bind(end_ms)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Get total reading count
    pub async fn reading_count(&self) -> Result<i64, StorageError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sensor_readings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // ---- alert rules ----

    /// Alert rules of one user, oldest first
    pub async fn alerts_for_user(&self, user_id: i64) -> Result<Vec<AlertRecord>, StorageError> {
        Ok(sqlx::query_as::<_, AlertRecord>(
            "SELECT * FROM user_alerts WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Every enabled alert rule
    pub async fn enabled_alerts(&self) -> Result<Vec<AlertRecord>, StorageError> {
        Ok(sqlx::query_as::<_, AlertRecord>(
            "SELECT * FROM user_alerts WHERE is_enabled = 1 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn create_alert(
        &self,
        user_id: i64,
        alert_type: &str,
        threshold_value: f64,
    ) -> Result<AlertRecord, StorageError> {
        let now = now_ms();
        let id = sqlx::query(
            "INSERT INTO user_alerts (user_id, alert_type, threshold_value, is_enabled, created_at_ms, updated_at_ms)
             VALUES (?, ?, ?, 1, ?, ?)",
        )
        .bind(user_id)
        .bind(alert_type)
        .bind(threshold_value)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        info!(user_id, alert_id = id, "Created {} alert", alert_type);
        Ok(AlertRecord {
            id,
            user_id,
            alert_type: alert_type.to_string(),
            threshold_value,
            is_enabled: true,
            created_at_ms: now,
            updated_at_ms: now,
        })
    }

    /// Enable or disable a rule owned by `user_id`
    pub async fn set_alert_enabled(
        &self,
        user_id: i64,
        alert_id: i64,
        enabled: bool,
    ) -> Result<AlertRecord, StorageError> {
        let result = sqlx::query(
            "UPDATE user_alerts SET is_enabled = ?, updated_at_ms = ? WHERE id = ? AND user_id = ?",
        )
        .bind(enabled)
        .bind(now_ms())
        .bind(alert_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        sqlx::query_as::<_, AlertRecord>("SELECT * FROM user_alerts WHERE id = ?")
            .bind(alert_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::NotFound)
    }

    /// Delete a rule owned by `user_id`
    pub async fn delete_alert(&self, user_id: i64, alert_id: i64) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM user_alerts WHERE id = ? AND user_id = ?")
            .bind(alert_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    // ---- alert logs ----

    /// Insert an alert log; `id` is ignored and assigned by the database
    pub async fn insert_alert_log(&self, mut record: AlertLogRecord) -> Result<AlertLogRecord, StorageError> {
        record.id = sqlx::query(
            "INSERT INTO alert_logs (user_id, alert_type, message, is_read, sensor_reading_id, created_at_ms)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(record.user_id)
        .bind(&record.alert_type)
        .bind(&record.message)
        .bind(record.is_read)
        .bind(record.sensor_reading_id)
        .bind(record.created_at_ms)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        debug!(user_id = record.user_id, log_id = record.id, "Inserted alert log");
        self.publish(ChangeEvent::AlertLogInserted(record.clone()));
        Ok(record)
    }

    /// Recent alert logs of a user, newest first
    pub async fn recent_alert_logs(&self, user_id: i64, limit: i64) -> Result<Vec<AlertLogRecord>, StorageError> {
        Ok(sqlx::query_as::<_, AlertLogRecord>(
            "SELECT * FROM alert_logs WHERE user_id = ?
             ORDER BY created_at_ms DESC, id DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Timestamp of the newest log for a (user, type) pair
    pub async fn last_alert_log_ms(&self, user_id: i64, alert_type: &str) -> Result<Option<i64>, StorageError> {
        let (last,): (Option<i64>,) = sqlx::query_as(
            "SELECT MAX(created_at_ms) FROM alert_logs WHERE user_id = ? AND alert_type = ?",
        )
        .bind(user_id)
        .bind(alert_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(last)
    }

    /// Mark a log owned by `user_id` as read
    pub async fn mark_alert_log_read(&self, user_id: i64, log_id: i64) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE alert_logs SET is_read = 1 WHERE id = ? AND user_id = ?")
            .bind(log_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    /// Get total alert log count
    pub async fn alert_log_count(&self) -> Result<i64, StorageError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM alert_logs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(recorded_at_ms: i64, pm25: f64) -> SensorRecord {
        SensorRecord {
            id: 0,
            pm10: 40.0,
            pm25,
            co2: 450.0,
            humidity: 55.0,
            temperature: 24.0,
            aqi_value: 50,
            aqi_level: "good".to_string(),
            location_lat: None,
            location_lng: None,
            location_name: None,
            created_by: None,
            recorded_at_ms,
        }
    }

    async fn user(repo: &Repository, name: &str) -> UserRecord {
        repo.create_user(NewUser {
            username: name.to_string(),
            password_hash: "hash".to_string(),
            email: Some(format!("{}@example.com", name)),
            ..Default::default()
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_user_defaults_and_conflicts() {
        let repo = Repository::in_memory().await.unwrap();
        let alice = user(&repo, "alice").await;
        assert_eq!(alice.city, "Delhi");
        assert_eq!(alice.role, "user");
        assert!(!repo.has_role(alice.id, "admin").await.unwrap());

        let dup = repo
            .create_user(NewUser {
                username: "alice".to_string(),
                password_hash: "x".to_string(),
                ..Default::default()
            })
            .await;
        assert!(matches!(dup, Err(StorageError::Conflict(m)) if m == "Username already exists"));

        let dup = repo
            .create_user(NewUser {
                username: "alice2".to_string(),
                password_hash: "x".to_string(),
                email: Some("alice@example.com".to_string()),
                ..Default::default()
            })
            .await;
        assert!(matches!(dup, Err(StorageError::Conflict(m)) if m == "Email already exists"));

        // Username is reported first when both collide
        let dup = repo
            .create_user(NewUser {
                username: "alice".to_string(),
                password_hash: "x".to_string(),
                email: Some("alice@example.com".to_string()),
                ..Default::default()
            })
            .await;
        assert!(matches!(dup, Err(StorageError::Conflict(m)) if m == "Username already exists"));

        repo.update_city(alice.id, "Mumbai").await.unwrap();
        let found = repo.find_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.city, "Mumbai");
    }

    #[tokio::test]
    async fn test_seed_admin_is_idempotent() {
        let repo = Repository::in_memory().await.unwrap();
        let first = repo.seed_admin("admin", "h").await.unwrap();
        let second = repo.seed_admin("admin", "other").await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(repo.has_role(first.id, "admin").await.unwrap());
    }

    #[tokio::test]
    async fn test_readings_range_newest_first() {
        let repo = Repository::in_memory().await.unwrap();
        for i in 1..=5 {
            repo.insert_reading(reading(i * 1000, i as f64)).await.unwrap();
        }

        assert_eq!(repo.reading_count().await.unwrap(), 5);
        assert_eq!(repo.latest_reading().await.unwrap().unwrap().recorded_at_ms, 5000);

        let range = repo.readings_between(Some(2000), Some(4000), 100).await.unwrap();
        let times: Vec<_> = range.iter().map(|r| r.recorded_at_ms).collect();
        assert_eq!(times, vec![4000, 3000, 2000]);

        let recent = repo.recent_readings(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].pm25, 5.0);
    }

    #[tokio::test]
    async fn test_alert_rules_owner_scoped() {
        let repo = Repository::in_memory().await.unwrap();
        let alice = user(&repo, "alice").await;
        let bob = user(&repo, "bob").await;

        let rule = repo.create_alert(alice.id, "pm25_high", 35.0).await.unwrap();
        assert!(matches!(
            repo.set_alert_enabled(bob.id, rule.id, false).await,
            Err(StorageError::NotFound)
        ));

        let updated = repo.set_alert_enabled(alice.id, rule.id, false).await.unwrap();
        assert!(!updated.is_enabled);
        assert!(repo.enabled_alerts().await.unwrap().is_empty());

        assert!(matches!(repo.delete_alert(bob.id, rule.id).await, Err(StorageError::NotFound)));
        repo.delete_alert(alice.id, rule.id).await.unwrap();
        assert!(repo.alerts_for_user(alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_alert_logs_and_change_feed() {
        let repo = Repository::in_memory().await.unwrap();
        let alice = user(&repo, "alice").await;
        let mut feed = repo.subscribe();

        let stored = repo.insert_reading(reading(1000, 80.0)).await.unwrap();
        assert!(matches!(feed.recv().await.unwrap(), ChangeEvent::ReadingInserted(r) if r.id == stored.id));

        for ts in [10, 20] {
            repo.insert_alert_log(AlertLogRecord {
                id: 0,
                user_id: alice.id,
                alert_type: "pm25_high".to_string(),
                message: "high".to_string(),
                is_read: false,
                sensor_reading_id: Some(stored.id),
                created_at_ms: ts,
            })
            .await
            .unwrap();
        }

        assert!(matches!(feed.recv().await.unwrap(), ChangeEvent::AlertLogInserted(l) if l.created_at_ms == 10));
        assert_eq!(repo.last_alert_log_ms(alice.id, "pm25_high").await.unwrap(), Some(20));
        assert_eq!(repo.last_alert_log_ms(alice.id, "co2_high").await.unwrap(), None);

        let logs = repo.recent_alert_logs(alice.id, 10).await.unwrap();
        assert_eq!(logs[0].created_at_ms, 20);
        repo.mark_alert_log_read(alice.id, logs[0].id).await.unwrap();
        assert!(repo.recent_alert_logs(alice.id, 1).await.unwrap()[0].is_read);
        assert_eq!(repo.alert_log_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_deleting_user_cascades() {
        let repo = Repository::in_memory().await.unwrap();
        let alice = user(&repo, "alice").await;
        repo.create_alert(alice.id, "co2_high", 1000.0).await.unwrap();
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(alice.id)
            .execute(&repo.pool)
            .await
            .unwrap();
        assert!(repo.enabled_alerts().await.unwrap().is_empty());
    }
}
