//! Provider authorization: where the `Authorization` header value comes from.
//!
//! - `StaticKeyProvider`: legacy server key, sent as `key=<secret>`
//! - `ServiceAccountProvider`: signed assertion exchanged for an OAuth2 bearer token

mod service_account;
mod static_key;
mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use service_account::{
    sign_assertion, AssertionClaims, ServiceAccount, ServiceAccountProvider,
    ASSERTION_LIFETIME_SECS, JWT_BEARER_GRANT,
};
pub use static_key::StaticKeyProvider;
pub use types::{Credential, CredentialScheme};

/// Produces a fresh credential for one invocation.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Scheme of the credentials this provider mints
    fn scheme(&self) -> CredentialScheme;

    /// Fails with `Configuration` when the secret or identity record is absent,
    /// `Credential` when minting or exchanging fails.
    async fn acquire(&self) -> Result<Credential>;
}
