//! Wire names of the settings fields.

/// Primary server URL.
pub const SERVER_URL: &str = "server-url";
/// Secondary (Tableau) server URL.
pub const TABLEAU_SERVER_URL: &str = "tableau-server-url";
/// New administrator password.
pub const PASSWORD: &str = "password";
/// Administrator password confirmation.
pub const CONFIRM_PASSWORD: &str = "confirm-password";
/// Mail server type dropdown.
pub const MAIL_SERVER_TYPE: &str = "mail-server-type";
/// Display name on alert emails.
pub const ALERT_EMAIL_NAME: &str = "alert-email-name";
/// Sender address on alert emails.
pub const ALERT_EMAIL_ADDRESS: &str = "alert-email-address";
/// SMTP relay host.
pub const SMTP_SERVER: &str = "smtp-server";
/// SMTP relay port.
pub const SMTP_PORT: &str = "smtp-port";
/// SMTP relay username.
pub const SMTP_USERNAME: &str = "smtp-username";
/// SMTP relay password.
pub const SMTP_PASSWORD: &str = "smtp-password";
/// Recipient for test emails; not part of the mail section's fields.
pub const TEST_EMAIL_RECIPIENT: &str = "test-email-recipient";
/// TLS on/off switch.
pub const ENABLE_SSL: &str = "enable-ssl";
/// TLS certificate file.
pub const SSL_CERTIFICATE_FILE: &str = "ssl-certificate-file";
/// TLS private key file.
pub const SSL_CERTIFICATE_KEY_FILE: &str = "ssl-certificate-key-file";
/// TLS chain file.
pub const SSL_CERTIFICATE_CHAIN_FILE: &str = "ssl-certificate-chain-file";
/// Server timezone.
pub const TIMEZONE: &str = "timezone";
/// Authentication mode.
pub const AUTHENTICATION_TYPE: &str = "authentication-type";
