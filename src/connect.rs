// Connect Handshake Driver
//
// Orchestrates one connection attempt end-to-end:
//
//   resolve token -> build identity + signature -> send "connect" ->
//   (success | auth rejected | transport failed)
//
// and carries the cross-attempt state: the in-memory last-known-good token
// and the persisted device token (written through on success, cleared on an
// explicit rejection). At most one handshake is in flight per client;
// overlapping connect calls queue behind the active one.

use crate::config::ClientConfig;
use crate::identity::{DeviceIdentityProvider, IdentityStore};
use crate::protocol::{ConnectAuth, ConnectParams, ConnectResponse, IssuedDeviceToken, CONNECT_METHOD};
use crate::resolver::TokenResolver;
use crate::token_store::{DeviceAuthToken, DeviceTokenStore};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Request transport seam: one request per connect attempt.
///
/// Framing, request ids, and socket lifecycle belong to the implementation;
/// this crate only needs a single method round trip.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, method: &str, params: JsonValue) -> Result<JsonValue>;
}

/// Verdict of one connect attempt
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectOutcome {
    /// Handshake accepted by the gateway
    Success {
        /// Negotiated protocol version
        protocol: u32,
    },

    /// Credential verdict: the gateway (or local resolution) rejected the
    /// attempt. Retrying without fresh credentials will not help.
    AuthRejected { reason: Option<String> },

    /// No verdict: network error, timeout, or undecodable response.
    /// Retryable; no credential state was touched.
    TransportFailed { reason: String },
}

/// Gateway client auth core.
///
/// Owns the per-lifetime mutable auth state; collaborators (token store,
/// identity store, transport) are injected at construction.
pub struct GatewayClient {
    config: ClientConfig,
    resolver: TokenResolver,
    token_store: Arc<dyn DeviceTokenStore>,
    identity: DeviceIdentityProvider,
    transport: Arc<dyn Transport>,

    /// Token of the most recent successful handshake. Instance-scoped, not
    /// persisted; bridges transient store unavailability across reconnects.
    last_good_auth_token: RwLock<Option<String>>,

    /// Serializes handshakes: a reconnect arriving while one is in flight
    /// queues behind it instead of racing the state updates.
    handshake_gate: Mutex<()>,
}

impl GatewayClient {
    pub fn new(
        config: ClientConfig,
        token_store: Arc<dyn DeviceTokenStore>,
        identity_store: Arc<dyn IdentityStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let resolver = TokenResolver::new(token_store.clone(), config.token.clone());
        Self {
            config,
            resolver,
            token_store,
            identity: DeviceIdentityProvider::new(identity_store),
            transport,
            last_good_auth_token: RwLock::new(None),
            handshake_gate: Mutex::new(()),
        }
    }

    /// Resolve the token the next attempt would present. Pure read; never
    /// mutates the store or the cache.
    pub async fn resolve_token(&self) -> Option<String> {
        let last_good = self.last_good_auth_token.read().await;
        self.resolver.resolve(last_good.as_deref()).await
    }

    /// Token of the most recent successful handshake, if any
    pub async fn last_good_auth_token(&self) -> Option<String> {
        self.last_good_auth_token.read().await.clone()
    }

    /// Run one connect attempt.
    ///
    /// All failure classes map into the returned outcome; success-path side
    /// effects (last-good cache, issued-token write-through) are committed
    /// only after the gateway's verdict, so dropping the future mid-flight
    /// commits nothing.
    pub async fn connect(&self) -> ConnectOutcome {
        let _attempt = self.handshake_gate.lock().await;

        let token = {
            let last_good = self.last_good_auth_token.read().await;
            self.resolver.resolve(last_good.as_deref()).await
        };

        if token.is_none() && !self.config.allow_unauthenticated {
            tracing::debug!("No credential available, rejecting without a round trip");
            return ConnectOutcome::AuthRejected {
                reason: Some("no credential available".to_string()),
            };
        }

        let identity = match self.identity.load_or_create().await {
            Ok(identity) => identity,
            Err(err) => {
                return ConnectOutcome::TransportFailed {
                    reason: format!("device identity unavailable: {err:#}"),
                };
            }
        };

        let sent_token = token.clone().unwrap_or_default();
        let nonce = Uuid::new_v4().to_string();
        let ts = chrono::Utc::now().timestamp_millis();

        // Canonical payload the gateway verifies against the device key
        let claims = serde_json::json!({
            "deviceId": identity.device_id(),
            "token": sent_token,
            "nonce": nonce,
            "ts": ts,
        });
        let signature = identity.sign(claims.to_string().as_bytes());

        let params = ConnectParams {
            min_protocol: self.config.min_protocol,
            max_protocol: self.config.max_protocol,
            auth: ConnectAuth {
                token: sent_token.clone(),
                device_id: Some(identity.device_id().to_string()),
                public_key: Some(identity.public_key_base64()),
                signature: Some(signature),
                nonce: Some(nonce),
                ts: Some(ts),
            },
        };

        let params = match serde_json::to_value(&params) {
            Ok(params) => params,
            Err(err) => {
                return ConnectOutcome::TransportFailed {
                    reason: format!("encode connect params: {err}"),
                };
            }
        };

        let raw = match self.transport.request(CONNECT_METHOD, params).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::debug!("Connect transport failure: {err:#}");
                return ConnectOutcome::TransportFailed {
                    reason: format!("{err:#}"),
                };
            }
        };

        let response: ConnectResponse = match serde_json::from_value(raw) {
            Ok(response) => response,
            Err(err) => {
                return ConnectOutcome::TransportFailed {
                    reason: format!("undecodable connect response: {err}"),
                };
            }
        };

        match response {
            ConnectResponse::HelloOk {
                protocol,
                device_token,
            } => {
                self.commit_success(token, device_token).await;
                tracing::info!(protocol, "Gateway handshake accepted");
                ConnectOutcome::Success { protocol }
            }
            ConnectResponse::HelloRejected { reason, retryable } => {
                self.commit_rejection(&sent_token).await;
                tracing::warn!(
                    reason = reason.as_deref().unwrap_or("unspecified"),
                    retryable = retryable.unwrap_or(false),
                    "Gateway rejected handshake auth"
                );
                ConnectOutcome::AuthRejected { reason }
            }
        }
    }

    /// Success path: remember the token that just worked and persist any
    /// freshly issued device token. A store write failure is logged but does
    /// not downgrade the successful handshake.
    async fn commit_success(&self, used_token: Option<String>, issued: Option<IssuedDeviceToken>) {
        if used_token.is_some() {
            *self.last_good_auth_token.write().await = used_token;
        }

        if let Some(issued) = issued {
            let record = DeviceAuthToken::new(issued.token, issued.role, issued.scopes);
            if let Err(err) = self.token_store.store(record).await {
                tracing::warn!("Failed to persist issued device token: {err:#}");
            }
        }
    }

    /// Rejection path: the presented credential is presumed revoked. Clear
    /// the persisted device token, and drop the last-good cache only when it
    /// holds the very token that was just rejected.
    async fn commit_rejection(&self, rejected_token: &str) {
        if let Err(err) = self.token_store.clear().await {
            tracing::warn!("Failed to clear rejected device token: {err:#}");
        }

        let mut last_good = self.last_good_auth_token.write().await;
        if last_good.as_deref() == Some(rejected_token) {
            *last_good = None;
        }
    }
}
