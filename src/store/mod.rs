//! Event Store
//!
//! Durable collections backing the engine: users, login logs, device logs
//! (unique on device_id) and file access logs. The [`Store`] trait is the
//! seam between scoring logic and persistence; [`PgStore`] is the production
//! backend, [`MemoryStore`] backs tests and offline runs.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{DeviceEvent, FileAccessEvent, LoginEvent, User};
use crate::signals::UserHistory;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    // Users
    async fn create_user(&self, user: User) -> StoreResult<User>;
    async fn find_user(&self, username: &str) -> StoreResult<Option<User>>;

    // Login events - append-only, immutable once written
    async fn record_login(&self, event: LoginEvent) -> StoreResult<()>;
    async fn logins_for(&self, user_id: &str) -> StoreResult<Vec<LoginEvent>>;

    // Device events - upsert keyed on device_id. Re-registration refreshes
    // ip_address, wifi_ssid and first_seen; trusted never auto-flips to true.
    async fn upsert_device(&self, event: DeviceEvent) -> StoreResult<()>;
    async fn devices_for(&self, user_id: &str) -> StoreResult<Vec<DeviceEvent>>;

    // File access events - append-only
    async fn record_file_access(&self, event: FileAccessEvent) -> StoreResult<()>;
    async fn file_accesses_for(&self, user_id: &str) -> StoreResult<Vec<FileAccessEvent>>;
    async fn recent_file_accesses(&self, user_id: &str, limit: i64)
        -> StoreResult<Vec<FileAccessEvent>>;
    async fn all_file_accesses(&self, limit: i64) -> StoreResult<Vec<FileAccessEvent>>;

    // Distinct users that have ever produced a login log (admin review)
    async fn distinct_login_users(&self) -> StoreResult<Vec<String>>;

    /// Full history for one user, as the signal extractor consumes it.
    async fn history_for(&self, user_id: &str) -> StoreResult<UserHistory> {
        Ok(UserHistory {
            logins: self.logins_for(user_id).await?,
            devices: self.devices_for(user_id).await?,
            file_accesses: self.file_accesses_for(user_id).await?,
        })
    }
}
