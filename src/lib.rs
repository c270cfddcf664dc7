// Clawlink - OpenClaw-compatible Gateway Client Auth Core
//
// This crate implements the credential-resolution and connect-handshake logic
// of a gateway client: which token to present on each (re)connect attempt,
// how to fall back when preferred credentials are absent or rejected, and the
// ed25519 device identity layered on top of the bearer-token scheme.
//
// Transport framing, reconnect scheduling, and durable storage backends stay
// behind the `Transport`, `DeviceTokenStore`, and `IdentityStore` seams.

pub mod config;
pub mod connect;
pub mod identity;
pub mod protocol;
pub mod resolver;
pub mod token_store;

pub use config::ClientConfig;
pub use connect::{ConnectOutcome, GatewayClient, Transport};
pub use identity::{
    DeviceIdentity, DeviceIdentityProvider, DeviceKeyPair, IdentityStore, MemoryIdentityStore,
    StoredIdentity,
};
pub use protocol::*;
pub use resolver::TokenResolver;
pub use token_store::{DeviceAuthToken, DeviceTokenStore, MemoryTokenStore};
