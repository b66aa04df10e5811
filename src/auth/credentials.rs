// Credential sources

use std::fmt;
use std::sync::RwLock;

/// Supplies the identity/credential pair for an authentication attempt
pub trait CredentialSource: Send + Sync {
    fn identity(&self) -> String;
    fn credential(&self) -> String;
}

/// In-memory credential pair that can be replaced between attempts
pub struct StaticCredentials {
    inner: RwLock<(String, String)>,
}

impl StaticCredentials {
    pub fn new(identity: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            inner: RwLock::new((identity.into(), credential.into())),
        }
    }

    pub fn set_identity(&self, identity: impl Into<String>) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.0 = identity.into();
    }

    pub fn set_credential(&self, credential: impl Into<String>) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.1 = credential.into();
    }
}

impl CredentialSource for StaticCredentials {
    fn identity(&self) -> String {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.0.clone()
    }

    fn credential(&self) -> String {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.1.clone()
    }
}

// Never print the credential
impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("identity", &self.identity())
            .field("credential", &"***")
            .finish()
    }
}
