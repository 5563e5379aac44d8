/// Domain errors returned by the service layer
///
/// Every variant except the wrapped infrastructure errors is a business
/// outcome the caller is expected to handle. Store "not found" and "conflict"
/// results never surface as [`ServiceError::Store`]; each call site translates
/// them into the domain kind that fits.

use crate::auth::password::PasswordError;
use crate::mail::MailError;
use crate::store::StoreError;

/// Service layer error
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// No active user matches, or the credentials are wrong
    #[error("User not found")]
    UserNotFound,

    /// Caller is not signed in
    #[error("User is not authorized")]
    UserUnauthorized,

    /// An active account already uses this email
    #[error("Email address is already in use")]
    EmailInUse,

    /// Email address is not syntactically valid
    #[error("Email address is invalid")]
    EmailInvalid,

    /// Verification token is unknown or already redeemed
    #[error("Verification not found")]
    VerificationNotFound,

    /// Reset token is unknown, redeemed or expired
    #[error("Password reset not found")]
    ResetNotFound,

    /// Password is outside the length policy
    #[error("Password must be between 6 and 50 characters")]
    PasswordInvalid,

    /// No journal entry for the requested day
    #[error("No journal entry exists for that date")]
    NoJournalWithDate,

    /// Entry is missing or belongs to someone else
    #[error("Journal entry not found")]
    EntryNotFound,

    /// An entry for that day already exists
    #[error("A journal entry already exists for that date")]
    EntryAlreadyExists,

    /// An entry line is too long
    #[error("Journal entries must be 500 characters or fewer")]
    JournalEntryInvalid,

    /// An entry line is empty after sanitization
    #[error("Journal entries must not be empty")]
    JournalEntryEmpty,

    /// More than seven lines in one entry
    #[error("A journal entry may have at most 7 lines")]
    TooManyEntries,

    /// Document store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Password hashing failure
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Mail delivery failure
    #[error(transparent)]
    Mail(#[from] MailError),
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
