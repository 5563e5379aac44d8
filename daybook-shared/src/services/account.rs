/// Account lifecycle
///
/// # States
///
/// ```text
/// NoAccount --register--> Pending --activate--> Active
/// Active --request reset--> ResetRequested --consume reset / login--> Active
/// ```
///
/// A pending record is written under an id derived from the normalized email
/// with a create-if-absent call, so two concurrent registrations of the same
/// address land on one document. Activation, reset consumption and
/// re-registration are compare-and-set updates against the version that was
/// read, so a token can be redeemed exactly once.
///
/// Lookups never tell a caller whether an email is registered: a wrong
/// password and an unknown address are both `UserNotFound`.

use std::sync::Arc;

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, is_valid_password, verify_password, MIN_PASSWORD_LENGTH};
use crate::auth::token::{account_id, generate_token, normalize_email};
use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::mail::templates::{reset_message, verification_message};
use crate::mail::Mailer;
use crate::models::user::{Profile, User, UserDocument};
use crate::store::{Collection, DocumentStore, Query, SearchRequest, StoreError};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// Checks the rough shape of an email address
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Account Lifecycle Manager
pub struct AccountService {
    store: Arc<dyn DocumentStore>,
    mailer: Arc<dyn Mailer>,
    config: Arc<ServiceConfig>,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        mailer: Arc<dyn Mailer>,
        config: Arc<ServiceConfig>,
    ) -> Self {
        Self {
            store,
            mailer,
            config,
        }
    }

    /// Registers an email address and mails the activation link
    ///
    /// Registering an address that is still pending keeps its token, stores
    /// the new password and sends the link again.
    ///
    /// # Errors
    ///
    /// - `EmailInvalid` / `PasswordInvalid` for malformed input
    /// - `EmailInUse` if an active account has this email
    /// - `Mail` if the message could not be sent; the record stays written
    pub async fn create_verification(&self, email: &str, password: &str) -> ServiceResult<()> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(ServiceError::EmailInvalid);
        }
        if !is_valid_password(password) {
            return Err(ServiceError::PasswordInvalid);
        }

        let existing = self.find_by_email(&email).await?;
        if existing.iter().any(|user| !user.is_pending()) {
            return Err(ServiceError::EmailInUse);
        }

        let password_hash = hash_password(password)?;
        if let Some(pending) = existing.into_iter().next() {
            return self.reissue(pending, &password_hash).await;
        }

        let token = generate_token();
        let doc = UserDocument {
            email: email.clone(),
            password_hash: password_hash.clone(),
            create_date: Utc::now(),
            last_login_date: None,
            verify_token: Some(token.clone()),
            reset_token: None,
            reset_date: None,
        };
        let source = serde_json::to_value(&doc).map_err(StoreError::from)?;

        let id = account_id(&email);
        match self.store.create(Collection::Users, &id, &source).await {
            Ok(_) => {}
            Err(StoreError::Conflict { .. }) => {
                let current = match self.store.get(Collection::Users, &id).await? {
                    Some(doc) => User::from_document(doc)?,
                    None => return Err(ServiceError::EmailInUse),
                };

                if current.email == email {
                    if !current.is_pending() {
                        return Err(ServiceError::EmailInUse);
                    }
                    return self.reissue(current, &password_hash).await;
                }

                // The account at this id has since moved to another email
                let fallback = Uuid::new_v4().simple().to_string();
                self.store.create(Collection::Users, &fallback, &source).await?;
                info!(user_id = %fallback, "Created pending verification");
                return self.send_verification(&email, &token).await;
            }
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %id, "Created pending verification");
        self.send_verification(&email, &token).await
    }

    /// Redeems an activation token and returns the new user id
    ///
    /// # Errors
    ///
    /// - `VerificationNotFound` if the token is unknown or was already used
    /// - `EmailInUse` if another account took the email in the meantime
    pub async fn activate(&self, token: &str) -> ServiceResult<String> {
        let pending = self
            .find_one_by_token("verify_token", token)
            .await?
            .ok_or(ServiceError::VerificationNotFound)?;

        if let Some(active) = self.find_active_by_email(&pending.email).await? {
            if active.id != pending.id {
                return Err(ServiceError::EmailInUse);
            }
        }

        self.store
            .update(
                Collection::Users,
                &pending.id,
                &json!({ "verify_token": null }),
                Some(pending.version),
            )
            .await
            .map_err(|e| match e {
                StoreError::Conflict { .. } | StoreError::NotFound { .. } => {
                    ServiceError::VerificationNotFound
                }
                other => other.into(),
            })?;

        info!(user_id = %pending.id, "Activated account");
        Ok(pending.id)
    }

    /// Checks credentials and records the login
    ///
    /// An outstanding reset token is discarded.
    ///
    /// # Errors
    ///
    /// `UserNotFound` for an unknown, pending or wrong-password account
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<Profile> {
        let email = normalize_email(email);
        let user = self
            .find_active_by_email(&email)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        match verify_password(password, &user.password_hash) {
            Ok(true) => {}
            Ok(false) => {
                debug!(user_id = %user.id, "Password mismatch");
                return Err(ServiceError::UserNotFound);
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Stored password hash is unreadable");
                return Err(ServiceError::UserNotFound);
            }
        }

        let now = Utc::now();
        self.store
            .update(
                Collection::Users,
                &user.id,
                &json!({
                    "last_login_date": now,
                    "reset_token": null,
                    "reset_date": null,
                }),
                None,
            )
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => ServiceError::UserNotFound,
                other => other.into(),
            })?;

        info!(user_id = %user.id, "User logged in");

        let mut profile = user.profile();
        profile.last_login_date = Some(now);
        Ok(profile)
    }

    /// Public profile of an active account
    ///
    /// # Errors
    ///
    /// `UserNotFound` if the id is unknown or still pending
    pub async fn get_profile(&self, user_id: &str) -> ServiceResult<Profile> {
        Ok(self.load_active(user_id).await?.profile())
    }

    /// Changes the email and/or password of an active account
    ///
    /// An empty email is ignored, and so is a password shorter than the
    /// minimum, which lets clients send only the field that changed.
    ///
    /// # Errors
    ///
    /// `UserNotFound` if the id is unknown or still pending
    pub async fn update_profile(
        &self,
        user_id: &str,
        email: Option<&str>,
        password: Option<&str>,
    ) -> ServiceResult<Profile> {
        let user = self.load_active(user_id).await?;
        let mut profile = user.profile();
        let mut patch = Map::new();

        if let Some(email) = email.map(normalize_email).filter(|e| !e.is_empty()) {
            if email != user.email {
                patch.insert("email".to_string(), Value::String(email.clone()));
                profile.email = email;
            }
        }

        if let Some(password) = password.filter(|p| p.chars().count() >= MIN_PASSWORD_LENGTH) {
            patch.insert(
                "password_hash".to_string(),
                Value::String(hash_password(password)?),
            );
        }

        if patch.is_empty() {
            return Ok(profile);
        }

        let changed: Vec<String> = patch.keys().cloned().collect();
        self.store
            .update(Collection::Users, &user.id, &Value::Object(patch), None)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => ServiceError::UserNotFound,
                other => other.into(),
            })?;

        info!(user_id = %user.id, fields = ?changed, "Updated profile");
        Ok(profile)
    }

    /// Issues a reset token and mails the reset link
    ///
    /// Callers facing the public should report success regardless of the
    /// outcome so the response does not reveal which emails exist.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if no active account has this email
    /// - `Mail` if the message could not be sent; the token stays written
    pub async fn request_password_reset(&self, email: &str) -> ServiceResult<()> {
        let email = normalize_email(email);
        let user = self
            .find_active_by_email(&email)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let token = generate_token();
        self.store
            .update(
                Collection::Users,
                &user.id,
                &json!({ "reset_token": token, "reset_date": Utc::now() }),
                None,
            )
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => ServiceError::UserNotFound,
                other => other.into(),
            })?;

        info!(user_id = %user.id, "Issued password reset");

        let message = reset_message(&self.config, &user.email, &token);
        self.mailer.send(&message).await?;
        Ok(())
    }

    /// Checks that a reset token is live without consuming it
    ///
    /// # Errors
    ///
    /// `ResetNotFound` if the token is unknown, used or expired
    pub async fn check_reset_token(&self, token: &str) -> ServiceResult<()> {
        self.find_by_reset_token(token).await.map(|_| ())
    }

    /// Sets a new password using a reset token
    ///
    /// # Errors
    ///
    /// - `ResetNotFound` if the token is unknown, used or expired
    /// - `PasswordInvalid` if the password is outside the policy; nothing is
    ///   changed in that case
    pub async fn consume_reset(&self, token: &str, new_password: &str) -> ServiceResult<()> {
        let user = self.find_by_reset_token(token).await?;

        if !is_valid_password(new_password) {
            return Err(ServiceError::PasswordInvalid);
        }
        let password_hash = hash_password(new_password)?;

        self.store
            .update(
                Collection::Users,
                &user.id,
                &json!({
                    "password_hash": password_hash,
                    "reset_token": null,
                    "reset_date": null,
                }),
                Some(user.version),
            )
            .await
            .map_err(|e| match e {
                StoreError::Conflict { .. } | StoreError::NotFound { .. } => {
                    ServiceError::ResetNotFound
                }
                other => other.into(),
            })?;

        info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }

    async fn reissue(&self, pending: User, password_hash: &str) -> ServiceResult<()> {
        let token = match pending.verify_token.clone() {
            Some(token) if !token.is_empty() => token,
            _ => return Err(ServiceError::EmailInUse),
        };

        self.store
            .update(
                Collection::Users,
                &pending.id,
                &json!({ "password_hash": password_hash }),
                Some(pending.version),
            )
            .await
            .map_err(|e| match e {
                // Activated or rewritten since it was read
                StoreError::Conflict { .. } | StoreError::NotFound { .. } => {
                    ServiceError::EmailInUse
                }
                other => other.into(),
            })?;

        info!(user_id = %pending.id, "Re-issued pending verification");
        self.send_verification(&pending.email, &token).await
    }

    async fn send_verification(&self, email: &str, token: &str) -> ServiceResult<()> {
        let message = verification_message(&self.config, email, token);
        self.mailer.send(&message).await?;
        Ok(())
    }

    async fn load_active(&self, user_id: &str) -> ServiceResult<User> {
        if user_id.is_empty() {
            return Err(ServiceError::UserNotFound);
        }

        let doc = self
            .store
            .get(Collection::Users, user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;
        let user = User::from_document(doc)?;

        if user.is_pending() {
            return Err(ServiceError::UserNotFound);
        }
        Ok(user)
    }

    /// Every record, active or pending, holding this email
    async fn find_by_email(&self, email: &str) -> ServiceResult<Vec<User>> {
        let request = SearchRequest::new(Query::term("email", email)).size(10);
        let response = self.store.search(Collection::Users, &request).await?;

        Ok(response
            .hits
            .into_iter()
            .map(User::from_hit)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn find_active_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        if email.is_empty() {
            return Ok(None);
        }

        let request = SearchRequest::new(
            Query::bool()
                .must(Query::term("email", email))
                .must_not(Query::exists("verify_token"))
                .build(),
        )
        .size(1);

        let response = self.store.search(Collection::Users, &request).await?;
        Ok(response
            .hits
            .into_iter()
            .next()
            .map(User::from_hit)
            .transpose()?)
    }

    async fn find_one_by_token(&self, field: &str, token: &str) -> ServiceResult<Option<User>> {
        if token.trim().is_empty() {
            return Ok(None);
        }

        let request = SearchRequest::new(Query::term(field, token)).size(1);
        let response = self.store.search(Collection::Users, &request).await?;

        Ok(response
            .hits
            .into_iter()
            .next()
            .map(User::from_hit)
            .transpose()?)
    }

    async fn find_by_reset_token(&self, token: &str) -> ServiceResult<User> {
        let user = self
            .find_one_by_token("reset_token", token)
            .await?
            .ok_or(ServiceError::ResetNotFound)?;

        let issued = user.reset_date.ok_or(ServiceError::ResetNotFound)?;
        // A lifetime past the end of representable time never expires
        let expires = self
            .config
            .reset_token_ttl()
            .and_then(|ttl| issued.checked_add_signed(ttl));
        if expires.is_some_and(|at| at < Utc::now()) {
            debug!(user_id = %user.id, "Reset token expired");
            return Err(ServiceError::ResetNotFound);
        }

        Ok(user)
    }
}
