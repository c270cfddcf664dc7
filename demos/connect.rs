// Gateway Client Connect Demo
//
// This demo wires the auth core against in-memory collaborators and a
// loopback transport standing in for the gateway:
// 1. First connect authenticates with the shared token
// 2. The loopback gateway issues a device token, persisted on success
// 3. The next connect presents the device token (it outranks the shared one)

use anyhow::Result;
use async_trait::async_trait;
use clawlink::{
    ClientConfig, GatewayClient, MemoryIdentityStore, MemoryTokenStore, Transport,
};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;

/// Loopback gateway: accepts any non-empty token and issues a device token
/// on the first successful handshake.
struct LoopbackGateway;

#[async_trait]
impl Transport for LoopbackGateway {
    async fn request(&self, method: &str, params: JsonValue) -> Result<JsonValue> {
        tracing::info!(method, auth = %params["auth"], "Loopback gateway received request");

        let token = params["auth"]["token"].as_str().unwrap_or_default();
        if token.trim().is_empty() {
            return Ok(json!({ "type": "hello-rejected", "reason": "Token required" }));
        }

        if token == "shared-token" {
            // First contact: mint a device-scoped token
            Ok(json!({
                "type": "hello-ok",
                "protocol": 3,
                "deviceToken": { "token": "dev-token-1", "role": "operator", "scopes": ["chat"] }
            }))
        } else {
            Ok(json!({ "type": "hello-ok", "protocol": 3 }))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = ClientConfig::default().with_token("shared-token");
    tracing::info!(url = %config.url, "Clawlink connect demo");

    let token_store = Arc::new(MemoryTokenStore::new());
    let client = GatewayClient::new(
        config,
        token_store,
        Arc::new(MemoryIdentityStore::new()),
        Arc::new(LoopbackGateway),
    );

    tracing::info!(token = ?client.resolve_token().await, "Resolved token for first attempt");
    let outcome = client.connect().await;
    tracing::info!(?outcome, "First connect finished");

    // The issued device token now outranks the shared token
    tracing::info!(token = ?client.resolve_token().await, "Resolved token for reconnect");
    let outcome = client.connect().await;
    tracing::info!(?outcome, "Reconnect finished");

    Ok(())
}
