use std::collections::HashMap;
use std::hash::BuildHasher;

/// Resolves secret references to their values
///
/// Implementations decide how tenant scoping is handled; the engine only
/// ever asks for a single `(company, reference)` pair at a time.
pub trait SecretProvider: Send + Sync {
    /// Look up a secret, returning `None` when it is unset
    fn get_secret(&self, company: &str, reference: &str) -> Option<String>;
}

/// Secret provider backed by process environment variables
///
/// The company is ignored; references name environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretProvider;

impl SecretProvider for EnvSecretProvider {
    fn get_secret(&self, _company: &str, reference: &str) -> Option<String> {
        std::env::var(reference.trim()).ok()
    }
}

impl<S: BuildHasher + Send + Sync> SecretProvider for HashMap<String, String, S> {
    fn get_secret(&self, _company: &str, reference: &str) -> Option<String> {
        self.get(reference).cloned()
    }
}
