/// User model
///
/// Accounts live in the `users` collection. A document is either a **pending
/// verification record** (it carries a `verify_token`) or an **active user**
/// (no `verify_token`). Activation clears the token in place, so the document
/// id becomes the user id.
///
/// # Document
///
/// ```json
/// {
///   "email": "jo@example.com",
///   "password_hash": "$argon2id$...",
///   "create_date": "2024-01-01T10:00:00Z",
///   "last_login_date": "2024-01-02T08:30:00Z",
///   "verify_token": "...",
///   "reset_token": "...",
///   "reset_date": "2024-01-02T08:31:00Z"
/// }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Document, SearchHit, StoreError, Version};

/// Persisted shape of a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDocument {
    /// Lower-cased email address
    pub email: String,

    /// Argon2id hash
    pub password_hash: String,

    pub create_date: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_date: Option<DateTime<Utc>>,

    /// Present while the account awaits activation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_token: Option<String>,

    /// Present while a password reset is outstanding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,

    /// When `reset_token` was issued
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_date: Option<DateTime<Utc>>,
}

/// A user as read from the store
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub version: Version,
    pub email: String,
    pub password_hash: String,
    pub create_date: DateTime<Utc>,
    pub last_login_date: Option<DateTime<Utc>>,
    pub verify_token: Option<String>,
    pub reset_token: Option<String>,
    pub reset_date: Option<DateTime<Utc>>,
}

/// Public view of an active account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub email: String,
    pub create_date: DateTime<Utc>,
    pub last_login_date: Option<DateTime<Utc>>,
}

impl User {
    fn from_parts(id: String, version: Version, source: serde_json::Value) -> Result<Self, StoreError> {
        let doc: UserDocument = serde_json::from_value(source)?;

        Ok(Self {
            id,
            version,
            email: doc.email,
            password_hash: doc.password_hash,
            create_date: doc.create_date,
            last_login_date: doc.last_login_date,
            verify_token: doc.verify_token,
            reset_token: doc.reset_token,
            reset_date: doc.reset_date,
        })
    }

    /// Decodes a document fetched by id
    pub fn from_document(doc: Document) -> Result<Self, StoreError> {
        Self::from_parts(doc.id, doc.version, doc.source)
    }

    /// Decodes a search hit; the search must not project fields away
    pub fn from_hit(hit: SearchHit) -> Result<Self, StoreError> {
        Self::from_parts(hit.id, hit.version, hit.source)
    }

    /// Whether the account still awaits activation
    pub fn is_pending(&self) -> bool {
        self.verify_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn profile(&self) -> Profile {
        Profile {
            user_id: self.id.clone(),
            email: self.email.clone(),
            create_date: self.create_date,
            last_login_date: self.last_login_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn version() -> Version {
        Version {
            seq_no: 3,
            primary_term: 1,
        }
    }

    #[test]
    fn test_pending_user_from_document() {
        let doc = Document {
            id: "abc".to_string(),
            version: version(),
            source: json!({
                "email": "jo@example.com",
                "password_hash": "$argon2id$x",
                "create_date": "2024-01-01T10:00:00Z",
                "verify_token": "tok",
            }),
        };

        let user = User::from_document(doc).unwrap();
        assert_eq!(user.id, "abc");
        assert!(user.is_pending());
        assert!(user.last_login_date.is_none());
        assert_eq!(user.version, version());
    }

    #[test]
    fn test_cleared_token_is_active() {
        let doc = Document {
            id: "abc".to_string(),
            version: version(),
            source: json!({
                "email": "jo@example.com",
                "password_hash": "$argon2id$x",
                "create_date": "2024-01-01T10:00:00Z",
                "verify_token": null,
            }),
        };

        assert!(!User::from_document(doc).unwrap().is_pending());
    }

    #[test]
    fn test_malformed_document() {
        let doc = Document {
            id: "abc".to_string(),
            version: version(),
            source: json!({ "email": 5 }),
        };

        assert!(matches!(User::from_document(doc), Err(StoreError::Serialization(_))));
    }

    #[test]
    fn test_document_skips_empty_optionals() {
        let doc = UserDocument {
            email: "jo@example.com".to_string(),
            password_hash: "h".to_string(),
            create_date: "2024-01-01T10:00:00Z".parse().unwrap(),
            last_login_date: None,
            verify_token: Some("t".to_string()),
            reset_token: None,
            reset_date: None,
        };

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["verify_token"], "t");
        assert!(value.get("reset_token").is_none());
        assert!(value.get("last_login_date").is_none());
    }
}
