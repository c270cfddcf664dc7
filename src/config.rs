// Client Configuration
//
// Immutable per-client construction input. The config is never mutated after
// construction; everything that changes across connect attempts lives on the
// `GatewayClient` itself.

use crate::protocol::{PROTOCOL_VERSION_MAX, PROTOCOL_VERSION_MIN};

/// Gateway client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Gateway WebSocket URL
    pub url: String,

    /// Shared/static auth token (fallback when no device token is stored)
    pub token: Option<String>,

    /// Allow connect attempts with no credential at all.
    /// Mirrors the gateway-side `allow_unauthenticated_requests` policy.
    pub allow_unauthenticated: bool,

    /// Minimum protocol version this client speaks
    pub min_protocol: u32,

    /// Maximum protocol version this client speaks
    pub max_protocol: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:18789/ws".to_string(),
            token: None,
            allow_unauthenticated: false,
            min_protocol: PROTOCOL_VERSION_MIN,
            max_protocol: PROTOCOL_VERSION_MAX,
        }
    }
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_allow_unauthenticated(mut self, allow: bool) -> Self {
        self.allow_unauthenticated = allow;
        self
    }
}
