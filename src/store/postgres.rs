//! PostgreSQL event store

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::{Store, StoreResult};
use crate::error::StoreError;
use crate::models::{DeviceEvent, FileAccessEvent, LoginEvent, User};

/// Create database connection pool
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(SCHEMA_SQL).execute(pool).await?;
    tracing::info!("Database schema applied successfully");
    Ok(())
}

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- Users
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    username VARCHAR(50) NOT NULL UNIQUE,
    password_hash VARCHAR(255) NOT NULL,
    role VARCHAR(50) DEFAULT 'user',
    status VARCHAR(20) DEFAULT 'pending',
    created_at TIMESTAMPTZ DEFAULT NOW()
);

-- Login logs (append-only)
CREATE TABLE IF NOT EXISTS login_logs (
    id BIGSERIAL PRIMARY KEY,
    user_id VARCHAR(50) NOT NULL,
    login_time TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    ip_address VARCHAR(45) NOT NULL,
    success BOOLEAN NOT NULL DEFAULT FALSE,
    country VARCHAR(100) NOT NULL DEFAULT 'Unknown',
    city VARCHAR(100) NOT NULL DEFAULT 'Unknown'
);

-- Device logs (one row per physical device fingerprint)
CREATE TABLE IF NOT EXISTS device_logs (
    id BIGSERIAL PRIMARY KEY,
    user_id VARCHAR(50) NOT NULL,
    device_id VARCHAR(255) NOT NULL UNIQUE,
    mac_address VARCHAR(17) NOT NULL,
    os VARCHAR(50) NOT NULL,
    wifi_ssid VARCHAR(100) NOT NULL,
    hostname VARCHAR(100) NOT NULL,
    ip_address VARCHAR(45) NOT NULL,
    trusted BOOLEAN NOT NULL DEFAULT FALSE,
    first_seen TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- File access logs (append-only)
CREATE TABLE IF NOT EXISTS file_access_logs (
    id BIGSERIAL PRIMARY KEY,
    user_id VARCHAR(50) NOT NULL,
    file_name VARCHAR(255) NOT NULL,
    action VARCHAR(10) NOT NULL DEFAULT 'READ',
    ip_address VARCHAR(45) NOT NULL,
    access_time TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_login_logs_user_time ON login_logs(user_id, login_time);
CREATE INDEX IF NOT EXISTS idx_device_logs_user ON device_logs(user_id);
CREATE INDEX IF NOT EXISTS idx_file_access_user_time ON file_access_logs(user_id, access_time);
"#;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and apply the schema in one step.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = create_pool(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: User) -> StoreResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password_hash, role, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, password_hash, role, status, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(user.status)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation()) {
                StoreError::DuplicateUser(user.username.clone())
            } else {
                StoreError::Database(err)
            }
        })?;
        Ok(created)
    }

    async fn find_user(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, role, status, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn record_login(&self, event: LoginEvent) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO login_logs (user_id, login_time, ip_address, success, country, city)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&event.user_id)
        .bind(event.timestamp)
        .bind(&event.source_ip)
        .bind(event.succeeded)
        .bind(&event.country)
        .bind(&event.city)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn logins_for(&self, user_id: &str) -> StoreResult<Vec<LoginEvent>> {
        let logins = sqlx::query_as::<_, LoginEvent>(
            r#"
            SELECT user_id, login_time, ip_address, success, country, city
            FROM login_logs WHERE user_id = $1 ORDER BY login_time
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(logins)
    }

    async fn upsert_device(&self, event: DeviceEvent) -> StoreResult<()> {
        // trusted is deliberately absent from the conflict update
        sqlx::query(
            r#"
            INSERT INTO device_logs
                (user_id, device_id, mac_address, os, wifi_ssid, hostname, ip_address, trusted, first_seen)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (device_id) DO UPDATE SET
                ip_address = EXCLUDED.ip_address,
                wifi_ssid = EXCLUDED.wifi_ssid,
                first_seen = EXCLUDED.first_seen
            "#,
        )
        .bind(&event.user_id)
        .bind(&event.device_id)
        .bind(&event.mac_address)
        .bind(&event.os)
        .bind(&event.wifi_ssid)
        .bind(&event.hostname)
        .bind(&event.ip_address)
        .bind(event.trusted)
        .bind(event.first_seen)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn devices_for(&self, user_id: &str) -> StoreResult<Vec<DeviceEvent>> {
        let devices = sqlx::query_as::<_, DeviceEvent>(
            r#"
            SELECT user_id, device_id, mac_address, os, wifi_ssid, hostname, ip_address, trusted, first_seen
            FROM device_logs WHERE user_id = $1 ORDER BY first_seen
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(devices)
    }

    async fn record_file_access(&self, event: FileAccessEvent) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO file_access_logs (user_id, file_name, action, ip_address, access_time)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&event.user_id)
        .bind(&event.file_name)
        .bind(event.action)
        .bind(&event.ip_address)
        .bind(event.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn file_accesses_for(&self, user_id: &str) -> StoreResult<Vec<FileAccessEvent>> {
        let accesses = sqlx::query_as::<_, FileAccessEvent>(
            r#"
            SELECT user_id, file_name, action, ip_address, access_time
            FROM file_access_logs WHERE user_id = $1 ORDER BY access_time
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(accesses)
    }

    async fn recent_file_accesses(
        &self,
        user_id: &str,
        limit: i64,
    ) -> StoreResult<Vec<FileAccessEvent>> {
        let accesses = sqlx::query_as::<_, FileAccessEvent>(
            r#"
            SELECT user_id, file_name, action, ip_address, access_time
            FROM file_access_logs WHERE user_id = $1 ORDER BY access_time DESC LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(accesses)
    }

    async fn all_file_accesses(&self, limit: i64) -> StoreResult<Vec<FileAccessEvent>> {
        let accesses = sqlx::query_as::<_, FileAccessEvent>(
            r#"
            SELECT user_id, file_name, action, ip_address, access_time
            FROM file_access_logs ORDER BY access_time DESC LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(accesses)
    }

    async fn distinct_login_users(&self) -> StoreResult<Vec<String>> {
        let users = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT user_id FROM login_logs ORDER BY user_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}
