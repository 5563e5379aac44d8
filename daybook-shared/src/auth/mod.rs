/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the password length policy
/// - [`jwt`]: Session token generation and validation
/// - [`token`]: Random verification/reset tokens and deterministic document ids
///
/// # Example
///
/// ```no_run
/// use daybook_shared::auth::password::{hash_password, verify_password};
/// use daybook_shared::auth::jwt::{create_token, Claims, SessionLength};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new("user-id", SessionLength::Session);
/// let token = create_token(&claims, "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod password;
pub mod token;
