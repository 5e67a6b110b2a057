//! Credential persistence seam.
//!
//! Persistence itself is a collaborator concern; the flow layer only needs a
//! narrow trait it can save refreshed results into and clear on sign-out.
//! [`InMemoryCredentialStore`] is the default process-local implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use signet_core::AccountResult;
use thiserror::Error;

/// Failure of a credential store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store failed.
    #[error("Credential store failure: {0}")]
    Backend(String),
}

/// Where signed-in accounts are kept between operations.
pub trait CredentialStore: Send + Sync {
    /// Save or replace the stored result for the account it belongs to.
    fn save(&self, account: &AccountResult) -> Result<(), StoreError>;

    /// Load the stored result for an account, when one exists.
    fn load(&self, home_account_id: &str) -> Result<Option<AccountResult>, StoreError>;

    /// Remove the stored result for an account. Removing an absent account is
    /// not an error.
    fn clear(&self, home_account_id: &str) -> Result<(), StoreError>;
}

/// Process-local [`CredentialStore`] keyed by home account id.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    accounts: Mutex<HashMap<String, AccountResult>>,
}

impl InMemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, AccountResult>>, StoreError> {
        self.accounts
            .lock()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn save(&self, account: &AccountResult) -> Result<(), StoreError> {
        self.lock()?
            .insert(account.home_account_id().to_string(), account.clone());
        Ok(())
    }

    fn load(&self, home_account_id: &str) -> Result<Option<AccountResult>, StoreError> {
        Ok(self.lock()?.get(home_account_id).cloned())
    }

    fn clear(&self, home_account_id: &str) -> Result<(), StoreError> {
        self.lock()?.remove(home_account_id);
        Ok(())
    }
}
