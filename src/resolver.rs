// Token Resolution
//
// Picks the single credential to present on the next connect attempt.
// Precedence, first valid candidate wins:
//
// 1. Persisted device token (skipped when blank or unreadable)
// 2. Shared/static token from client config
// 3. Last known good token from the current client lifetime
//
// Resolution is a pure read over the three sources: it never mutates the
// store or the cache, and repeated calls over unchanged sources return the
// same value.

use crate::token_store::DeviceTokenStore;
use std::sync::Arc;

pub struct TokenResolver {
    store: Arc<dyn DeviceTokenStore>,
    shared_token: Option<String>,
}

impl TokenResolver {
    pub fn new(store: Arc<dyn DeviceTokenStore>, shared_token: Option<String>) -> Self {
        Self {
            store,
            shared_token,
        }
    }

    /// Resolve the token for the next attempt, or `None` when no source
    /// holds a usable credential.
    ///
    /// A store read failure is not fatal: the tier degrades to "absent" and
    /// resolution falls through to the next candidate.
    pub async fn resolve(&self, last_good: Option<&str>) -> Option<String> {
        let stored = match self.store.load().await {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!("Device token store unavailable, falling through: {err:#}");
                None
            }
        };

        let candidates = [
            stored
                .as_ref()
                .filter(|record| !record.is_blank())
                .map(|record| record.token.as_str()),
            self.shared_token.as_deref(),
            last_good,
        ];

        let resolved = candidates
            .into_iter()
            .flatten()
            .find(|candidate| !candidate.trim().is_empty())
            .map(str::to_string);
        resolved
    }
}
