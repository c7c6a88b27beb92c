//! The signed-in account.

use credential_store::{AccountRecord, ProviderKind};

/// Identity of the signed-in user.
///
/// Exists exactly when the application phase is not `Unauthenticated`.
/// Created by a successful login or by auto-login reconciliation, replaced
/// wholesale on re-login, and destroyed on logout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Opaque account identifier issued by the backend
    pub id: String,
    /// Display name
    pub display_name: String,
    /// Profile image URL, if any
    pub image_url: Option<String>,
    /// Provider the account signed in with
    pub provider: ProviderKind,
    /// Backend access token
    pub access_token: String,
    /// Backend refresh token
    pub refresh_token: Option<String>,
}

impl Account {
    /// Rebuild an account from its persisted snapshot plus stored tokens.
    pub fn from_record(
        record: AccountRecord,
        access_token: String,
        refresh_token: Option<String>,
    ) -> Self {
        Self {
            id: record.id,
            display_name: record.display_name,
            image_url: record.image_url,
            provider: record.provider,
            access_token,
            refresh_token,
        }
    }

    /// The persistable snapshot of this account's profile fields.
    pub fn record(&self) -> AccountRecord {
        AccountRecord {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            image_url: self.image_url.clone(),
            provider: self.provider,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_round_trip() {
        let account = Account {
            id: "member-7".to_string(),
            display_name: "Hana".to_string(),
            image_url: Some("https://cdn.keepin.app/p/7.png".to_string()),
            provider: ProviderKind::Apple,
            access_token: "at".to_string(),
            refresh_token: Some("rt".to_string()),
        };

        let rebuilt = Account::from_record(
            account.record(),
            account.access_token.clone(),
            account.refresh_token.clone(),
        );
        assert_eq!(rebuilt, account);
    }
}
