//! High-level API over a storage backend for tokens and the account snapshot.

use crate::{CredentialStorage, ProviderKind, StorageError, StorageKeys, StorageResult, TokenKind};
use serde::{Deserialize, Serialize};

/// Account snapshot persisted at login.
///
/// Reconciliation rebuilds the in-memory account from this record when a
/// backend session is restored from stored tokens; the profile is not
/// re-fetched from the backend in that path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Opaque account identifier issued by the backend
    pub id: String,
    /// Display name at the time of login
    pub display_name: String,
    /// Profile image URL, if any
    #[serde(default)]
    pub image_url: Option<String>,
    /// Provider the account signed in with
    pub provider: ProviderKind,
}

/// Keyed token storage plus the persisted account snapshot.
///
/// Backend tokens are stored under the provider that produced the backend
/// session, so `clear(provider)` removes the complete session material for
/// that provider in one call.
pub struct TokenStore {
    storage: Box<dyn CredentialStorage>,
}

impl TokenStore {
    /// Create a token store over the given storage backend.
    pub fn new(storage: Box<dyn CredentialStorage>) -> Self {
        Self { storage }
    }

    /// Read a token slot. Absence is a normal result.
    pub fn get(&self, provider: ProviderKind, kind: TokenKind) -> StorageResult<Option<String>> {
        self.storage.get(&StorageKeys::token(provider, kind))
    }

    /// Write a token slot. Last write wins.
    pub fn set(&self, provider: ProviderKind, kind: TokenKind, value: &str) -> StorageResult<()> {
        self.storage.set(&StorageKeys::token(provider, kind), value)
    }

    /// Remove every token stored under a provider.
    pub fn clear(&self, provider: ProviderKind) -> StorageResult<()> {
        for kind in TokenKind::ALL {
            let _ = self.storage.delete(&StorageKeys::token(provider, kind));
        }
        Ok(())
    }

    /// Remove every provider's tokens.
    pub fn clear_all(&self) -> StorageResult<()> {
        for provider in ProviderKind::ALL {
            self.clear(provider)?;
        }
        Ok(())
    }

    /// Whether a provider credential is stored for the given provider.
    pub fn has_provider_credential(&self, provider: ProviderKind) -> StorageResult<bool> {
        self.storage
            .has(&StorageKeys::token(provider, TokenKind::ProviderAccess))
    }

    /// The provider with a stored credential, if any.
    ///
    /// Kakao takes precedence when both providers have stored credentials;
    /// that state should not arise under normal operation (login clears the
    /// other provider first) but is resolved deterministically here.
    pub fn stored_provider(&self) -> StorageResult<Option<ProviderKind>> {
        for provider in ProviderKind::ALL {
            if self.has_provider_credential(provider)? {
                return Ok(Some(provider));
            }
        }
        Ok(None)
    }

    /// Persist the account snapshot.
    pub fn set_account(&self, record: &AccountRecord) -> StorageResult<()> {
        let json =
            serde_json::to_string(record).map_err(|e| StorageError::Encoding(e.to_string()))?;
        self.storage.set(StorageKeys::ACCOUNT_RECORD, &json)
    }

    /// Read the persisted account snapshot.
    pub fn get_account(&self) -> StorageResult<Option<AccountRecord>> {
        match self.storage.get(StorageKeys::ACCOUNT_RECORD)? {
            Some(json) => {
                let record: AccountRecord = serde_json::from_str(&json)
                    .map_err(|e| StorageError::Encoding(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Remove the persisted account snapshot.
    pub fn clear_account(&self) -> StorageResult<()> {
        let _ = self.storage.delete(StorageKeys::ACCOUNT_RECORD);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;

    fn create_store() -> TokenStore {
        TokenStore::new(Box::new(MemoryStorage::new()))
    }

    fn sample_record(provider: ProviderKind) -> AccountRecord {
        AccountRecord {
            id: "member-42".to_string(),
            display_name: "Jin".to_string(),
            image_url: None,
            provider,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let store = create_store();

        store
            .set(ProviderKind::Kakao, TokenKind::ProviderAccess, "tok")
            .unwrap();
        assert_eq!(
            store
                .get(ProviderKind::Kakao, TokenKind::ProviderAccess)
                .unwrap(),
            Some("tok".to_string())
        );
        // Same kind under the other provider is a different slot.
        assert_eq!(
            store
                .get(ProviderKind::Apple, TokenKind::ProviderAccess)
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_clear_removes_only_that_provider() {
        let store = create_store();

        for kind in TokenKind::ALL {
            store.set(ProviderKind::Kakao, kind, "k").unwrap();
            store.set(ProviderKind::Apple, kind, "a").unwrap();
        }

        store.clear(ProviderKind::Kakao).unwrap();

        for kind in TokenKind::ALL {
            assert_eq!(store.get(ProviderKind::Kakao, kind).unwrap(), None);
            assert_eq!(
                store.get(ProviderKind::Apple, kind).unwrap(),
                Some("a".to_string())
            );
        }
    }

    #[test]
    fn test_clear_all() {
        let store = create_store();

        store
            .set(ProviderKind::Kakao, TokenKind::BackendAccess, "k")
            .unwrap();
        store
            .set(ProviderKind::Apple, TokenKind::BackendRefresh, "a")
            .unwrap();

        store.clear_all().unwrap();

        assert_eq!(store.stored_provider().unwrap(), None);
        assert_eq!(
            store
                .get(ProviderKind::Apple, TokenKind::BackendRefresh)
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_stored_provider_prefers_kakao() {
        let store = create_store();

        store
            .set(ProviderKind::Apple, TokenKind::ProviderAccess, "a")
            .unwrap();
        assert_eq!(store.stored_provider().unwrap(), Some(ProviderKind::Apple));

        store
            .set(ProviderKind::Kakao, TokenKind::ProviderAccess, "k")
            .unwrap();
        assert_eq!(store.stored_provider().unwrap(), Some(ProviderKind::Kakao));
    }

    #[test]
    fn test_account_record_round_trip() {
        let store = create_store();
        assert_eq!(store.get_account().unwrap(), None);

        let record = sample_record(ProviderKind::Kakao);
        store.set_account(&record).unwrap();
        assert_eq!(store.get_account().unwrap(), Some(record));

        store.clear_account().unwrap();
        assert_eq!(store.get_account().unwrap(), None);
    }
}
