/// Service layer configuration
///
/// Built once at startup and shared read-only by every service.
///
/// # Example
///
/// ```
/// use daybook_shared::config::ServiceConfig;
///
/// let config = ServiceConfig {
///     site_url: "https://daybook.example.com".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(config.verify_link("abc"), "https://daybook.example.com/verify/abc");
/// ```

use chrono::Duration;

/// Longest reset link lifetime accepted from configuration (one leap year)
pub const MAX_RESET_TOKEN_TTL_HOURS: i64 = 24 * 366;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Hours a password reset link stays valid
    pub reset_token_ttl_hours: i64,

    /// Public URL of the web client, used to build links in mail
    pub site_url: String,

    /// Product name used in mail subjects and bodies
    pub product_name: String,

    /// Sender address for outgoing mail
    pub mail_from: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            reset_token_ttl_hours: 24,
            site_url: "http://localhost:3000".to_string(),
            product_name: "Daybook".to_string(),
            mail_from: "no-reply@daybook.app".to_string(),
        }
    }
}

impl ServiceConfig {
    /// `None` when the configured hours do not fit a [`Duration`]
    pub fn reset_token_ttl(&self) -> Option<Duration> {
        Duration::try_hours(self.reset_token_ttl_hours)
    }

    pub fn verify_link(&self, token: &str) -> String {
        format!("{}/verify/{}", self.site_url.trim_end_matches('/'), token)
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/reset/{}", self.site_url.trim_end_matches('/'), token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_ignore_trailing_slash() {
        let config = ServiceConfig {
            site_url: "https://example.com/".to_string(),
            ..Default::default()
        };

        assert_eq!(config.verify_link("t"), "https://example.com/verify/t");
        assert_eq!(config.reset_link("t"), "https://example.com/reset/t");
    }

    #[test]
    fn test_reset_ttl() {
        assert_eq!(ServiceConfig::default().reset_token_ttl(), Some(Duration::hours(24)));

        let config = ServiceConfig {
            reset_token_ttl_hours: i64::MAX,
            ..Default::default()
        };
        assert_eq!(config.reset_token_ttl(), None);
    }
}
