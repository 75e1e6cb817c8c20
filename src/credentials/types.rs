use std::fmt;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialScheme {
    StaticKey,
    Bearer,
}

impl CredentialScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialScheme::StaticKey => "static-key",
            CredentialScheme::Bearer => "bearer",
        }
    }
}

impl fmt::Display for CredentialScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization material for one invocation. Never cached.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    StaticKey {
        secret: String,
    },
    Bearer {
        access_token: String,
        expires_at: DateTime<Utc>,
    },
}

impl Credential {
    pub fn scheme(&self) -> CredentialScheme {
        match self {
            Credential::StaticKey { .. } => CredentialScheme::StaticKey,
            Credential::Bearer { .. } => CredentialScheme::Bearer,
        }
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        match self {
            Credential::StaticKey { secret } => format!("key={}", secret),
            Credential::Bearer { access_token, .. } => format!("Bearer {}", access_token),
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::StaticKey { .. } => f
                .debug_struct("StaticKey")
                .field("secret", &"***")
                .finish(),
            Credential::Bearer { expires_at, .. } => f
                .debug_struct("Bearer")
                .field("access_token", &"***")
                .field("expires_at", expires_at)
                .finish(),
        }
    }
}
