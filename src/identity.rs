// Device Identity Management
//
// This module implements device identity using ed25519 public key
// cryptography. Each device has one keypair, created lazily on first need and
// cached for the client lifetime; the device id is derived from the public
// key, so it is stable for as long as the keypair is.

use anyhow::{Context, Result};
use async_trait::async_trait;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};

/// Device identity keypair
#[derive(Clone)]
pub struct DeviceKeyPair {
    signing: SigningKey,
}

impl DeviceKeyPair {
    /// Generate a new random ed25519 keypair
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut secret = [0u8; 32];
        rng.fill(&mut secret);

        Self {
            signing: SigningKey::from_bytes(&secret),
        }
    }

    /// Rebuild a keypair from a Base64URL-encoded secret key
    pub fn from_secret_base64(secret: &str) -> Result<Self> {
        let bytes = base64_url_decode(secret).context("decode device secret key")?;
        let secret: [u8; 32] = bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("Invalid secret key length"))?;
        Ok(Self {
            signing: SigningKey::from_bytes(&secret),
        })
    }

    /// Get public key as Base64URL-encoded string
    pub fn public_key_base64(&self) -> String {
        base64_url_encode(&self.signing.verifying_key().to_bytes())
    }

    /// Get secret key as Base64URL-encoded string
    pub fn secret_key_base64(&self) -> String {
        base64_url_encode(&self.signing.to_bytes())
    }

    /// Sign a payload, returning a Base64URL-encoded signature
    pub fn sign(&self, payload: &[u8]) -> String {
        base64_url_encode(&self.signing.sign(payload).to_bytes())
    }

    /// Verify a Base64URL-encoded signature over a payload
    pub fn verify(&self, payload: &[u8], signature: &str) -> Result<bool> {
        let bytes = base64_url_decode(signature).context("decode signature")?;
        let bytes: [u8; 64] = bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("Invalid signature length"))?;
        let signature = Signature::from_bytes(&bytes);
        Ok(self
            .signing
            .verifying_key()
            .verify(payload, &signature)
            .is_ok())
    }
}

/// Derive a stable device id from the public key
fn derive_device_id(public_key: &[u8]) -> String {
    let digest = Sha256::digest(public_key);
    format!("dev-{}", base64_url_encode_no_pad(&digest[..12]))
}

/// Device identity: keypair plus derived device id
#[derive(Clone)]
pub struct DeviceIdentity {
    device_id: String,
    keypair: DeviceKeyPair,
}

impl DeviceIdentity {
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn public_key_base64(&self) -> String {
        self.keypair.public_key_base64()
    }

    pub fn sign(&self, payload: &[u8]) -> String {
        self.keypair.sign(payload)
    }
}

/// Device identity as persisted in the backing store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredIdentity {
    /// Unique device ID (derived from public key)
    pub device_id: String,

    /// Public key (Base64URL-encoded)
    pub public_key: String,

    /// Secret key (Base64URL-encoded)
    pub secret_key: String,
}

/// Storage seam for the device identity
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Load the persisted identity, if any
    async fn load(&self) -> Result<Option<StoredIdentity>>;

    /// Persist the identity
    async fn store(&self, identity: &StoredIdentity) -> Result<()>;
}

/// In-memory identity store
pub struct MemoryIdentityStore {
    inner: Arc<RwLock<Option<StoredIdentity>>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }
}

impl Default for MemoryIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn load(&self) -> Result<Option<StoredIdentity>> {
        Ok(self.inner.read().await.clone())
    }

    async fn store(&self, identity: &StoredIdentity) -> Result<()> {
        *self.inner.write().await = Some(identity.clone());
        Ok(())
    }
}

/// Lazily initialized, process-cached device identity.
///
/// `load_or_create` is single-flight: concurrent callers share one in-flight
/// initialization instead of racing to create two identities. A failed
/// initialization is not cached, so a later attempt retries the store.
pub struct DeviceIdentityProvider {
    store: Arc<dyn IdentityStore>,
    cell: OnceCell<DeviceIdentity>,
}

impl DeviceIdentityProvider {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self {
            store,
            cell: OnceCell::new(),
        }
    }

    /// Return the existing identity, loading it from the store or creating
    /// and persisting a fresh one on first need.
    pub async fn load_or_create(&self) -> Result<&DeviceIdentity> {
        self.cell
            .get_or_try_init(|| async {
                if let Some(stored) = self.store.load().await.context("load device identity")? {
                    let keypair = DeviceKeyPair::from_secret_base64(&stored.secret_key)?;
                    tracing::debug!(device_id = %stored.device_id, "Loaded device identity");
                    return Ok(DeviceIdentity {
                        device_id: stored.device_id,
                        keypair,
                    });
                }

                let keypair = DeviceKeyPair::generate();
                let device_id = derive_device_id(&keypair.signing.verifying_key().to_bytes());
                let identity = DeviceIdentity {
                    device_id: device_id.clone(),
                    keypair,
                };

                self.store
                    .store(&StoredIdentity {
                        device_id,
                        public_key: identity.public_key_base64(),
                        secret_key: identity.keypair.secret_key_base64(),
                    })
                    .await
                    .context("persist device identity")?;

                tracing::info!(device_id = %identity.device_id, "Created device identity");
                Ok(identity)
            })
            .await
    }

    /// Sign a payload with the device's private key
    pub async fn sign_payload(&self, payload: &[u8]) -> Result<String> {
        let identity = self.load_or_create().await?;
        Ok(identity.sign(payload))
    }
}

/// Base64URL encode (URL-safe base64)
pub fn base64_url_encode(data: &[u8]) -> String {
    use base64::prelude::*;
    BASE64_URL_SAFE.encode(data)
}

/// Base64URL encode without padding
fn base64_url_encode_no_pad(data: &[u8]) -> String {
    use base64::prelude::*;
    BASE64_URL_SAFE_NO_PAD.encode(data)
}

/// Base64URL decode
pub fn base64_url_decode(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    use base64::prelude::*;
    BASE64_URL_SAFE.decode(s)
}
