// Connect Handshake Wire Types
//
// This module defines the payloads exchanged during the connect handshake:
//
// 1. Client sends a "connect" request carrying the resolved auth token and
//    the device identity signature
// 2. Gateway responds with "hello-ok" (negotiated protocol version, optional
//    freshly issued device token) or "hello-rejected"

use serde::{Deserialize, Serialize};

/// Minimum protocol version this crate speaks
pub const PROTOCOL_VERSION_MIN: u32 = 1;

/// Maximum protocol version this crate speaks
pub const PROTOCOL_VERSION_MAX: u32 = 3;

/// Method name of the connect/hello request
pub const CONNECT_METHOD: &str = "connect";

/// Auth payload sent inside the connect request.
///
/// Carries exactly one resolved token value. The identity fields are omitted
/// when device identity is not engaged for the attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectAuth {
    /// Resolved bearer token (empty string on an unauthenticated attempt)
    pub token: String,

    /// Device identifier (derived from the device public key)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    /// Device public key (Base64URL-encoded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,

    /// Signature over the canonical attempt payload (Base64URL-encoded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,

    /// Per-attempt freshness nonce
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// Attempt timestamp (milliseconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

/// Parameters of the connect request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
    /// Minimum protocol version supported by the client
    pub min_protocol: u32,

    /// Maximum protocol version supported by the client
    pub max_protocol: u32,

    /// Auth payload for this attempt
    pub auth: ConnectAuth,
}

/// Gateway verdict on a connect request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConnectResponse {
    /// Handshake accepted
    #[serde(rename = "hello-ok")]
    HelloOk {
        /// Negotiated protocol version
        protocol: u32,

        /// Device token freshly issued by the gateway, to be persisted
        #[serde(
            rename = "deviceToken",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        device_token: Option<IssuedDeviceToken>,
    },

    /// Handshake explicitly rejected (credential verdict, not a transport
    /// failure)
    #[serde(rename = "hello-rejected")]
    HelloRejected {
        /// Human-readable rejection reason
        #[serde(default)]
        reason: Option<String>,

        /// Whether the gateway considers the attempt retryable as-is
        #[serde(default)]
        retryable: Option<bool>,
    },
}

/// Device token minted by the gateway on a successful handshake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedDeviceToken {
    /// Token value
    pub token: String,

    /// Granted role (e.g. "operator")
    #[serde(default)]
    pub role: String,

    /// Granted scopes
    #[serde(default)]
    pub scopes: Vec<String>,
}
