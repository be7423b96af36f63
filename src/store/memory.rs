//! In-memory event store
//!
//! Backs tests and single-process demo runs. Per-collection consistency via
//! an RwLock; reads never observe a half-applied write.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{Store, StoreResult};
use crate::error::StoreError;
use crate::models::{DeviceEvent, FileAccessEvent, LoginEvent, User};

#[derive(Debug, Default)]
struct Collections {
    users: HashMap<String, User>,
    logins: Vec<LoginEvent>,
    devices: Vec<DeviceEvent>,
    file_accesses: Vec<FileAccessEvent>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: User) -> StoreResult<User> {
        let mut inner = self.inner.write();
        if inner.users.contains_key(&user.username) {
            return Err(StoreError::DuplicateUser(user.username));
        }
        inner.users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn find_user(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.inner.read().users.get(username).cloned())
    }

    async fn record_login(&self, event: LoginEvent) -> StoreResult<()> {
        self.inner.write().logins.push(event);
        Ok(())
    }

    async fn logins_for(&self, user_id: &str) -> StoreResult<Vec<LoginEvent>> {
        Ok(self
            .inner
            .read()
            .logins
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn upsert_device(&self, event: DeviceEvent) -> StoreResult<()> {
        let mut inner = self.inner.write();
        if let Some(existing) = inner.devices.iter_mut().find(|d| d.device_id == event.device_id) {
            // Refresh the volatile fields only; trusted and identity fields
            // keep their stored values.
            existing.ip_address = event.ip_address;
            existing.wifi_ssid = event.wifi_ssid;
            existing.first_seen = event.first_seen;
        } else {
            inner.devices.push(event);
        }
        Ok(())
    }

    async fn devices_for(&self, user_id: &str) -> StoreResult<Vec<DeviceEvent>> {
        Ok(self
            .inner
            .read()
            .devices
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn record_file_access(&self, event: FileAccessEvent) -> StoreResult<()> {
        self.inner.write().file_accesses.push(event);
        Ok(())
    }

    async fn file_accesses_for(&self, user_id: &str) -> StoreResult<Vec<FileAccessEvent>> {
        Ok(self
            .inner
            .read()
            .file_accesses
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn recent_file_accesses(
        &self,
        user_id: &str,
        limit: i64,
    ) -> StoreResult<Vec<FileAccessEvent>> {
        let mut accesses = self.file_accesses_for(user_id).await?;
        accesses.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        accesses.truncate(limit as usize);
        Ok(accesses)
    }

    async fn all_file_accesses(&self, limit: i64) -> StoreResult<Vec<FileAccessEvent>> {
        let mut accesses = self.inner.read().file_accesses.clone();
        accesses.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        accesses.truncate(limit as usize);
        Ok(accesses)
    }

    async fn distinct_login_users(&self) -> StoreResult<Vec<String>> {
        let mut users: Vec<String> = self
            .inner
            .read()
            .logins
            .iter()
            .map(|l| l.user_id.clone())
            .collect();
        users.sort();
        users.dedup();
        Ok(users)
    }
}
