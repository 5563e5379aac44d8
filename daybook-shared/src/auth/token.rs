/// Opaque tokens and deterministic document ids
///
/// Two kinds of identifiers are produced here:
///
/// - **Tokens**: single-use random strings carried in verification and
///   password-reset links. 32 characters of base62, about 190 bits.
/// - **Deterministic ids**: SHA-256 hex digests of a natural key. Writing a
///   document under such an id with a create-if-absent operation makes the
///   store enforce uniqueness of that key.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use daybook_shared::auth::token::{account_id, generate_token, journal_entry_id};
///
/// let token = generate_token();
/// assert_eq!(token.len(), 32);
///
/// // Email is normalized before hashing
/// assert_eq!(account_id("Jo@Example.com"), account_id("jo@example.com"));
///
/// let day = NaiveDate::from_ymd_opt(2002, 5, 20).unwrap();
/// assert_eq!(journal_entry_id("user-1", day), journal_entry_id("user-1", day));
/// assert_ne!(journal_entry_id("user-1", day), journal_entry_id("user-2", day));
/// ```

use chrono::NaiveDate;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of generated tokens (characters)
pub const TOKEN_LENGTH: usize = 32;

/// Generates a random URL-safe token
pub fn generate_token() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    (0..TOKEN_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Normalizes an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Document id of the account registered under `email`
pub fn account_id(email: &str) -> String {
    digest(&normalize_email(email))
}

/// Document id of the journal entry written by `user_id` on `day`
pub fn journal_entry_id(user_id: &str, day: NaiveDate) -> String {
    digest(&format!("{}:{}", user_id, day.format("%Y-%m-%d")))
}

/// Whether `id` has the shape of a derived document id (lowercase hex sha-256)
pub fn is_document_id(id: &str) -> bool {
    id.len() == 64 && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn digest(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_format() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_token_uniqueness() {
        let tokens: std::collections::HashSet<_> = (0..100).map(|_| generate_token()).collect();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Test@Test.COM "), "test@test.com");
    }

    #[test]
    fn test_account_id_is_hex_sha256() {
        let id = account_id("test@test.com");
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, account_id("TEST@test.com"));
    }

    #[test]
    fn test_journal_entry_id_depends_on_day() {
        let may_20 = NaiveDate::from_ymd_opt(2002, 5, 20).unwrap();
        let may_21 = NaiveDate::from_ymd_opt(2002, 5, 21).unwrap();

        assert_ne!(journal_entry_id("u", may_20), journal_entry_id("u", may_21));
    }

    #[test]
    fn test_is_document_id() {
        let day = NaiveDate::from_ymd_opt(2002, 5, 20).unwrap();
        assert!(is_document_id(&journal_entry_id("u", day)));
        assert!(is_document_id(&account_id("test@test.com")));

        assert!(!is_document_id(""));
        assert!(!is_document_id("../../daybook_users/_doc/abc"));
        assert!(!is_document_id(&account_id("a@b.c").to_uppercase()));
        assert!(!is_document_id(&format!("{}?", &account_id("a@b.c")[..63])));
    }
}
