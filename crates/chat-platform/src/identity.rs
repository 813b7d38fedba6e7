use std::{
    collections::HashMap,
    sync::{
        Arc, RwLock,
        atomic::{AtomicBool, Ordering},
    },
};

use tracing::debug;

use crate::{PlatformError, UserRecord};

/// Exchanges an opaque credential for a user record.
pub trait IdentityProvider: Send + Sync {
    fn exchange(&self, credential: &str) -> Result<UserRecord, PlatformError>;
}

/// Profile claims carried by a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    pub subject: String,
    pub email: String,
    pub name: String,
    pub picture: String,
}

#[derive(Default)]
struct IdentityTables {
    credentials: HashMap<String, IdentityClaims>,
    users: HashMap<String, UserRecord>,
    next_user_id: u64,
}

/// Identity provider backed by a table of known credentials.
///
/// Signing in with the same subject again keeps the user ID and refreshes
/// name and avatar.
#[derive(Clone, Default)]
pub struct InMemoryIdentityProvider {
    tables: Arc<RwLock<IdentityTables>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryIdentityProvider {
    pub fn register_credential(
        &self,
        credential: impl Into<String>,
        claims: IdentityClaims,
    ) -> Result<(), PlatformError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| PlatformError::Storage("poisoned lock".to_owned()))?;
        tables.credentials.insert(credential.into(), claims);
        Ok(())
    }

    /// Simulate an outage: every exchange fails with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl IdentityProvider for InMemoryIdentityProvider {
    fn exchange(&self, credential: &str) -> Result<UserRecord, PlatformError> {
        if credential.trim().is_empty() {
            return Err(PlatformError::Invalid("missing credential".to_owned()));
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PlatformError::Unavailable("identity provider offline".to_owned()));
        }

        let mut tables = self
            .tables
            .write()
            .map_err(|_| PlatformError::Storage("poisoned lock".to_owned()))?;
        let claims = tables
            .credentials
            .get(credential)
            .cloned()
            .ok_or(PlatformError::Unauthorized)?;
        if claims.subject.is_empty() || claims.email.is_empty() || claims.name.is_empty() {
            return Err(PlatformError::Invalid("missing required fields".to_owned()));
        }

        let next_id = tables.next_user_id + 1;
        let user = tables
            .users
            .entry(claims.subject.clone())
            .and_modify(|user| {
                user.name = claims.name.clone();
                user.avatar_url = claims.picture.clone();
            })
            .or_insert_with(|| UserRecord {
                id: next_id,
                identity_provider_id: claims.subject.clone(),
                email: claims.email.clone(),
                name: claims.name.clone(),
                avatar_url: claims.picture.clone(),
            })
            .clone();
        if user.id == next_id {
            tables.next_user_id = next_id;
        }
        debug!(user_id = user.id, "identity exchange succeeded");
        Ok(user)
    }
}
