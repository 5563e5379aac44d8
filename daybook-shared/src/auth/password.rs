/// Password hashing and password policy
///
/// Passwords are hashed with Argon2id and stored in PHC string format, so the
/// parameters travel with the hash and verification never needs configuration.
///
/// # Policy
///
/// A password is acceptable when its length, counted in characters, is within
/// [`MIN_PASSWORD_LENGTH`]..=[`MAX_PASSWORD_LENGTH`]. The registration and
/// reset paths enforce it; the profile update path silently skips passwords
/// shorter than the minimum so that email-only updates work.
///
/// # Example
///
/// ```
/// use daybook_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("journal_password")?;
///
/// assert!(verify_password("journal_password", &hash)?);
/// assert!(!verify_password("wrong_password", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Shortest acceptable password (characters)
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Longest acceptable password (characters)
pub const MAX_PASSWORD_LENGTH: usize = 50;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Stored hash is not a valid PHC string
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashes a password using Argon2id
///
/// Work factor is fixed: 19 MiB of memory, 2 passes, 1 lane. A failure here is
/// fatal for the caller; there is no fallback to storing anything unhashed.
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
///
/// # Example
///
/// ```
/// use daybook_shared::auth::password::hash_password;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("my_password")?;
/// assert!(hash.starts_with("$argon2id$"));
/// # Ok(())
/// # }
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(19456)
        .t_cost(2)
        .p_cost(1)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored hash
///
/// A mismatch is `Ok(false)`, not an error. Only a corrupt stored hash or an
/// internal failure of the hasher is reported as `Err`.
///
/// # Errors
///
/// - `PasswordError::InvalidHash` if `hash` is not a PHC string carrying a hash output
/// - `PasswordError::VerifyError` for any other verification failure
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;
    if parsed_hash.hash.is_none() {
        return Err(PasswordError::InvalidHash("hash has no output".to_string()));
    }

    // Parameters are embedded in the hash
    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Checks a password against the length policy
///
/// # Example
///
/// ```
/// use daybook_shared::auth::password::is_valid_password;
///
/// assert!(is_valid_password("secret"));
/// assert!(!is_valid_password("ab"));
/// assert!(!is_valid_password(&"x".repeat(51)));
/// ```
pub fn is_valid_password(password: &str) -> bool {
    let length = password.chars().count();
    (MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length)
}
