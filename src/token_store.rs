// Device Auth Token Store
//
// This module defines the persisted per-device token record and the storage
// seam behind it. The durable backend (browser local storage, keychain, ...)
// is a collaborator; the crate ships an in-memory implementation used by
// tests and demos.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Device-scoped auth token as persisted by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAuthToken {
    /// Token value
    pub token: String,

    /// Role granted when the token was issued (e.g. "operator")
    pub role: String,

    /// Scopes granted when the token was issued
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Last update timestamp (milliseconds)
    pub updated_at_ms: i64,
}

impl DeviceAuthToken {
    pub fn new(token: impl Into<String>, role: impl Into<String>, scopes: Vec<String>) -> Self {
        Self {
            token: token.into(),
            role: role.into(),
            scopes,
            updated_at_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// A record whose token trims to the empty string carries no usable
    /// credential and is treated as absent by resolution.
    pub fn is_blank(&self) -> bool {
        self.token.trim().is_empty()
    }
}

/// Storage seam for the persisted device token.
///
/// A malformed record should surface as `Ok(None)` or `Err` from `load`;
/// resolution treats both the same as "no stored token".
#[async_trait]
pub trait DeviceTokenStore: Send + Sync {
    /// Load the persisted device token, if any
    async fn load(&self) -> Result<Option<DeviceAuthToken>>;

    /// Persist (overwrite) the device token
    async fn store(&self, token: DeviceAuthToken) -> Result<()>;

    /// Clear the persisted device token
    async fn clear(&self) -> Result<()>;
}

/// In-memory device token store
pub struct MemoryTokenStore {
    inner: Arc<RwLock<Option<DeviceAuthToken>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }
}

impl Default for MemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceTokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<DeviceAuthToken>> {
        Ok(self.inner.read().await.clone())
    }

    async fn store(&self, token: DeviceAuthToken) -> Result<()> {
        *self.inner.write().await = Some(token);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.inner.write().await = None;
        Ok(())
    }
}
