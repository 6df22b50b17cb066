//! Shared vocabulary for the Switchyard orchestration engine
//!
//! Holds the error taxonomy every crate reports through, the provider
//! identifiers, and the narrow collaborator traits the engine consumes
//! (secrets, read-only company configuration, and preamble building).

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod company;
mod error;
mod provider;
mod secrets;

pub use company::{ConfigurationProvider, CredentialRefs, PreambleSource};
pub use error::{Error, ErrorKind, Result};
pub use provider::ProviderKind;
pub use secrets::{EnvSecretProvider, SecretProvider};
