//! Vendor client and adapter caches shared by router instances

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use switchyard_config::ProviderEndpointConfig;
use switchyard_core::{ProviderKind, Result};

use crate::adapter::{Adapter, VendorClient};

/// SHA-256 hex digest of a credential, used in cache keys
pub fn fingerprint(secret: &SecretString) -> String {
    format!("{:x}", Sha256::digest(secret.expose_secret().as_bytes()))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-wide vendor clients keyed by provider, endpoint and credential
#[derive(Default)]
pub struct ClientCache {
    clients: Mutex<HashMap<String, Arc<VendorClient>>>,
}

impl ClientCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached client or build one under the same lock
    pub fn get_or_create(
        &self,
        provider: ProviderKind,
        endpoint: &ProviderEndpointConfig,
        api_key: &SecretString,
    ) -> Result<Arc<VendorClient>> {
        let key = client_key(provider, endpoint, api_key);
        let mut clients = lock(&self.clients);

        if let Some(client) = clients.get(&key) {
            return Ok(Arc::clone(client));
        }

        tracing::debug!(provider = %provider, "creating vendor client");
        let client = Arc::new(VendorClient::new(provider, endpoint, api_key.clone())?);
        clients.insert(key, Arc::clone(&client));
        Ok(client)
    }

    pub fn clear(&self) {
        lock(&self.clients).clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.clients).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn client_key(provider: ProviderKind, endpoint: &ProviderEndpointConfig, api_key: &SecretString) -> String {
    let base_url = endpoint.base_url.as_ref().map_or("", url::Url::as_str);
    let timeout = endpoint.timeout.unwrap_or_default();
    format!("{provider}|{base_url}|{timeout}|{}", fingerprint(api_key))
}

/// Identity of one cached adapter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AdapterKey {
    pub company: String,
    pub provider: ProviderKind,
    pub fingerprint: String,
}

impl AdapterKey {
    pub fn new(company: &str, provider: ProviderKind, api_key: &SecretString) -> Self {
        Self {
            company: company.to_lowercase(),
            provider,
            fingerprint: fingerprint(api_key),
        }
    }
}

/// Adapters owned by one router instance
#[derive(Default)]
pub struct AdapterCache {
    adapters: Mutex<HashMap<AdapterKey, Arc<dyn Adapter>>>,
}

impl AdapterCache {
    pub fn get_or_try_insert<F>(&self, key: AdapterKey, build: F) -> Result<Arc<dyn Adapter>>
    where
        F: FnOnce() -> Result<Arc<dyn Adapter>>,
    {
        let mut adapters = lock(&self.adapters);

        if let Some(adapter) = adapters.get(&key) {
            return Ok(Arc::clone(adapter));
        }

        let adapter = build()?;
        adapters.insert(key, Arc::clone(&adapter));
        Ok(adapter)
    }

    /// Drop every adapter built for `company`
    pub fn invalidate_company(&self, company: &str) {
        let company = company.to_lowercase();
        lock(&self.adapters).retain(|key, _| key.company != company);
    }

    pub fn clear(&self) {
        lock(&self.adapters).clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.adapters).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
