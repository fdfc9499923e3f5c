//! Credential resolution

pub mod identity;
pub mod provider;
pub mod resolver;

pub use identity::ResolvedIdentity;
pub use provider::{CredentialProvider, EnvCredentialProvider, FileCredentialProvider, ProvidedCredential};
pub use resolver::IdentityResolver;
