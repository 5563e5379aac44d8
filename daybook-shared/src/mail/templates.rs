/// Account mail templates
///
/// # Example
///
/// ```
/// use daybook_shared::config::ServiceConfig;
/// use daybook_shared::mail::templates::verification_message;
///
/// let message = verification_message(&ServiceConfig::default(), "jo@example.com", "tok");
/// assert_eq!(message.subject, "Activate your Daybook account");
/// assert!(message.text.contains("/verify/tok"));
/// ```

use crate::config::ServiceConfig;

use super::MailMessage;

/// Mail carrying the account activation link
pub fn verification_message(config: &ServiceConfig, to: &str, token: &str) -> MailMessage {
    let link = config.verify_link(token);
    let product = &config.product_name;

    MailMessage {
        to: to.to_string(),
        from: config.mail_from.clone(),
        subject: format!("Activate your {} account", product),
        text: format!(
            "Thanks for signing up for {product}!\n\n\
             Open the link below to activate your account:\n\n{link}\n\n\
             If you did not sign up, you can ignore this message.\n",
        ),
        html: format!(
            "<p>Thanks for signing up for {product}!</p>\
             <p><a href=\"{link}\">Activate your account</a></p>\
             <p>If you did not sign up, you can ignore this message.</p>",
        ),
    }
}

/// Mail carrying the password reset link
pub fn reset_message(config: &ServiceConfig, to: &str, token: &str) -> MailMessage {
    let link = config.reset_link(token);
    let product = &config.product_name;
    let hours = config.reset_token_ttl_hours;

    MailMessage {
        to: to.to_string(),
        from: config.mail_from.clone(),
        subject: format!("Reset your {} password", product),
        text: format!(
            "Someone asked to reset the password of your {product} account.\n\n\
             Open the link below within {hours} hours to choose a new password:\n\n{link}\n\n\
             If this wasn't you, no action is needed.\n",
        ),
        html: format!(
            "<p>Someone asked to reset the password of your {product} account.</p>\
             <p><a href=\"{link}\">Choose a new password</a> (valid for {hours} hours)</p>\
             <p>If this wasn't you, no action is needed.</p>",
        ),
    }
}
