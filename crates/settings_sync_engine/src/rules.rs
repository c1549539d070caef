//! Eligibility rules for each kind of settings section.
//!
//! Every rule set answers two questions about `(current, baseline)`:
//! may the section be cancelled (it has edits worth reverting) and may it be
//! saved (it has edits and they are structurally valid). Saving always
//! implies cancelling.

use crate::validate::{valid_email, valid_port, valid_url};
use settings_sync_protocol::fields::*;
use settings_sync_protocol::{Comparison, FieldMap};

/// A field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// Offending field.
    pub field: String,
    /// Message to render next to it.
    pub message: String,
}

impl FieldIssue {
    /// Creates an issue.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Section-specific predicates and field policies.
pub trait SectionRules: Send + Sync {
    /// True iff the section holds edits worth reverting.
    fn is_cancel_eligible(&self, current: &FieldMap, baseline: &FieldMap) -> bool;

    /// Structural problems with `current`; empty when valid.
    fn issues(&self, current: &FieldMap) -> Vec<FieldIssue>;

    /// True iff the section is both changed and valid.
    fn is_save_eligible(&self, current: &FieldMap, baseline: &FieldMap) -> bool {
        self.is_cancel_eligible(current, baseline) && self.issues(current).is_empty()
    }

    /// Comparison used for dirty reporting.
    fn comparison(&self) -> Comparison {
        Comparison::strict()
    }

    /// Fields that are never persisted: blank in the baseline, blanked in the
    /// widgets after a successful save.
    fn transient_fields(&self) -> &[&'static str] {
        &[]
    }

    /// Fields left out of the request body.
    fn withheld_fields(&self) -> &[&'static str] {
        &[]
    }

    /// True iff the section's test action may run.
    ///
    /// `extra` carries fields read outside the section's own map, such as a
    /// test recipient.
    fn is_test_eligible(
        &self,
        _current: &FieldMap,
        _baseline: &FieldMap,
        _extra: &FieldMap,
    ) -> bool {
        false
    }
}

/// A single URL field.
#[derive(Debug, Clone)]
pub struct UrlRules {
    field: &'static str,
}

impl UrlRules {
    /// Rules for the URL stored in `field`.
    pub fn new(field: &'static str) -> Self {
        Self { field }
    }
}

impl SectionRules for UrlRules {
    fn is_cancel_eligible(&self, current: &FieldMap, baseline: &FieldMap) -> bool {
        current.text(self.field) != baseline.text(self.field)
    }

    fn issues(&self, current: &FieldMap) -> Vec<FieldIssue> {
        if valid_url(current.text(self.field)) {
            Vec::new()
        } else {
            vec![FieldIssue::new(self.field, "Invalid URL")]
        }
    }
}

/// Administrator password change.
#[derive(Debug, Clone, Default)]
pub struct AdminRules;

impl SectionRules for AdminRules {
    fn is_cancel_eligible(&self, current: &FieldMap, _baseline: &FieldMap) -> bool {
        !current.text(PASSWORD).is_empty() || !current.text(CONFIRM_PASSWORD).is_empty()
    }

    fn issues(&self, current: &FieldMap) -> Vec<FieldIssue> {
        let password = current.text(PASSWORD);
        let confirm = current.text(CONFIRM_PASSWORD);
        let mut issues = Vec::new();

        if password.is_empty() {
            issues.push(FieldIssue::new(PASSWORD, "Password is required."));
        }
        if confirm.is_empty() {
            issues.push(FieldIssue::new(
                CONFIRM_PASSWORD,
                "Confirmation password is required.",
            ));
        }
        if issues.is_empty() && password != confirm {
            issues.push(FieldIssue::new(PASSWORD, "Passwords must match."));
        }
        issues
    }

    fn transient_fields(&self) -> &[&'static str] {
        &[PASSWORD, CONFIRM_PASSWORD]
    }

    fn withheld_fields(&self) -> &[&'static str] {
        &[CONFIRM_PASSWORD]
    }
}

/// How outbound mail is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailServerType {
    /// Mail is disabled.
    None,
    /// Local delivery; only the alert address matters.
    Direct,
    /// Delivery through an SMTP relay.
    Relay,
}

impl MailServerType {
    /// Parses the dropdown value.
    ///
    /// An empty value means no mail. Unrecognised values are validated as a
    /// relay, the strictest mode.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "none" => MailServerType::None,
            "direct" => MailServerType::Direct,
            _ => MailServerType::Relay,
        }
    }
}

/// Outbound mail settings.
#[derive(Debug, Clone, Default)]
pub struct MailRules;

impl SectionRules for MailRules {
    fn is_cancel_eligible(&self, current: &FieldMap, baseline: &FieldMap) -> bool {
        current.differs_from(baseline, &self.comparison())
    }

    fn issues(&self, current: &FieldMap) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        let kind = MailServerType::parse(current.text(MAIL_SERVER_TYPE));
        if kind == MailServerType::None {
            return issues;
        }

        if !valid_email(current.text(ALERT_EMAIL_ADDRESS)) {
            issues.push(FieldIssue::new(
                ALERT_EMAIL_ADDRESS,
                "The email address is invalid.",
            ));
        }
        if kind == MailServerType::Direct {
            return issues;
        }

        if current.text(SMTP_SERVER).trim().is_empty() {
            issues.push(FieldIssue::new(SMTP_SERVER, "The mail server is required."));
        }

        let port = current.text(SMTP_PORT).trim();
        if port.is_empty() || port == "0" {
            issues.push(FieldIssue::new(SMTP_PORT, "The port is required."));
        } else if !valid_port(port) {
            issues.push(FieldIssue::new(SMTP_PORT, "The port is invalid."));
        }

        let username = current.text(SMTP_USERNAME);
        let password = current.text(SMTP_PASSWORD);
        if !username.is_empty() && password.is_empty() {
            issues.push(FieldIssue::new(
                SMTP_PASSWORD,
                "The password is required when a username is specified.",
            ));
        } else if username.is_empty() && !password.is_empty() {
            issues.push(FieldIssue::new(
                SMTP_USERNAME,
                "The username is required when a password is specified.",
            ));
        }
        issues
    }

    fn is_test_eligible(&self, current: &FieldMap, baseline: &FieldMap, extra: &FieldMap) -> bool {
        !current.differs_from(baseline, &self.comparison())
            && valid_email(extra.text(TEST_EMAIL_RECIPIENT))
    }
}

/// TLS certificate upload.
#[derive(Debug, Clone, Default)]
pub struct TlsRules;

const TLS_FILES: [&str; 3] = [
    SSL_CERTIFICATE_FILE,
    SSL_CERTIFICATE_KEY_FILE,
    SSL_CERTIFICATE_CHAIN_FILE,
];

impl SectionRules for TlsRules {
    fn is_cancel_eligible(&self, current: &FieldMap, _baseline: &FieldMap) -> bool {
        current.flag(ENABLE_SSL) && TLS_FILES.iter().any(|f| !current.text(f).is_empty())
    }

    fn issues(&self, current: &FieldMap) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        if !current.flag(ENABLE_SSL) {
            return issues;
        }
        if current.text(SSL_CERTIFICATE_FILE).is_empty() {
            issues.push(FieldIssue::new(
                SSL_CERTIFICATE_FILE,
                "The certificate file is required.",
            ));
        }
        if current.text(SSL_CERTIFICATE_KEY_FILE).is_empty() {
            issues.push(FieldIssue::new(
                SSL_CERTIFICATE_KEY_FILE,
                "The certificate key file is required.",
            ));
        }
        issues
    }

    fn comparison(&self) -> Comparison {
        Comparison::strict().ignore_when_off(ENABLE_SSL, TLS_FILES)
    }

    fn transient_fields(&self) -> &[&'static str] {
        &TLS_FILES
    }
}

/// A section whose only requirement is having changed, such as a dropdown.
#[derive(Debug, Clone, Default)]
pub struct ChangeRules;

impl SectionRules for ChangeRules {
    fn is_cancel_eligible(&self, current: &FieldMap, baseline: &FieldMap) -> bool {
        current.differs_from(baseline, &self.comparison())
    }

    fn issues(&self, _current: &FieldMap) -> Vec<FieldIssue> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay(host: &str, port: &str, user: &str, pass: &str) -> FieldMap {
        FieldMap::new()
            .with(MAIL_SERVER_TYPE, "smtp")
            .with(ALERT_EMAIL_NAME, "Palette")
            .with(ALERT_EMAIL_ADDRESS, "alerts@example.com")
            .with(SMTP_SERVER, host)
            .with(SMTP_PORT, port)
            .with(SMTP_USERNAME, user)
            .with(SMTP_PASSWORD, pass)
    }

    fn tls(enabled: bool, cert: &str, key: &str, chain: &str) -> FieldMap {
        FieldMap::new()
            .with(ENABLE_SSL, enabled)
            .with(SSL_CERTIFICATE_FILE, cert)
            .with(SSL_CERTIFICATE_KEY_FILE, key)
            .with(SSL_CERTIFICATE_CHAIN_FILE, chain)
    }

    #[test]
    fn url_rules() {
        let rules = UrlRules::new(SERVER_URL);
        let baseline = FieldMap::new().with(SERVER_URL, "https://a.com");

        let typo = FieldMap::new().with(SERVER_URL, "not a url");
        assert!(!rules.is_save_eligible(&typo, &baseline));
        assert!(rules.is_cancel_eligible(&typo, &baseline));
        assert_eq!(rules.issues(&typo), vec![FieldIssue::new(SERVER_URL, "Invalid URL")]);

        let fixed = FieldMap::new().with(SERVER_URL, "https://b.com");
        assert!(rules.is_save_eligible(&fixed, &baseline));
        assert!(rules.is_cancel_eligible(&fixed, &baseline));

        assert!(!rules.is_save_eligible(&baseline, &baseline));
        assert!(!rules.is_cancel_eligible(&baseline, &baseline));
    }

    #[test]
    fn admin_rules() {
        let rules = AdminRules;
        let blank = FieldMap::new().with(PASSWORD, "").with(CONFIRM_PASSWORD, "");
        let pw = |a: &str, b: &str| FieldMap::new().with(PASSWORD, a).with(CONFIRM_PASSWORD, b);

        assert!(!rules.is_cancel_eligible(&blank, &blank));
        assert!(rules.is_cancel_eligible(&pw("", "x"), &blank));
        assert!(!rules.is_save_eligible(&pw("secret", ""), &blank));
        assert!(!rules.is_save_eligible(&pw("secret", "secreT"), &blank));
        assert!(rules.is_save_eligible(&pw("secret", "secret"), &blank));

        assert_eq!(
            rules.issues(&pw("secret", "other")),
            vec![FieldIssue::new(PASSWORD, "Passwords must match.")]
        );
        assert_eq!(rules.issues(&blank).len(), 2);
    }

    #[test]
    fn mail_relay_scenario() {
        let rules = MailRules;
        let baseline = relay("", "", "", "");

        let edited = relay("mail.x.com", "25", "", "");
        assert!(rules.is_save_eligible(&edited, &baseline));

        let user_only = relay("mail.x.com", "25", "admin", "");
        assert!(!rules.is_save_eligible(&user_only, &baseline));
        assert!(rules.is_cancel_eligible(&user_only, &baseline));

        let both = relay("mail.x.com", "25", "admin", "secret");
        assert!(rules.is_save_eligible(&both, &baseline));

        let pass_only = relay("mail.x.com", "25", "", "secret");
        assert_eq!(
            rules.issues(&pass_only),
            vec![FieldIssue::new(
                SMTP_USERNAME,
                "The username is required when a password is specified."
            )]
        );
    }

    #[test]
    fn mail_relay_without_alert_email() {
        let rules = MailRules;
        let baseline = relay("", "", "", "").with(ALERT_EMAIL_ADDRESS, "");

        let edited = relay("mail.x.com", "25", "", "").with(ALERT_EMAIL_ADDRESS, "");
        assert!(rules.is_cancel_eligible(&edited, &baseline));
        assert!(!rules.is_save_eligible(&edited, &baseline));
        assert_eq!(
            rules.issues(&edited),
            vec![FieldIssue::new(ALERT_EMAIL_ADDRESS, "The email address is invalid.")]
        );
    }

    #[test]
    fn mail_relay_requires_host_and_numeric_port() {
        let rules = MailRules;
        let issues = rules.issues(&relay("", "smtp", "", ""));
        assert!(issues.contains(&FieldIssue::new(SMTP_SERVER, "The mail server is required.")));
        assert!(issues.contains(&FieldIssue::new(SMTP_PORT, "The port is invalid.")));

        let issues = rules.issues(&relay("mail.x.com", "0", "", ""));
        assert_eq!(issues, vec![FieldIssue::new(SMTP_PORT, "The port is required.")]);
    }

    #[test]
    fn mail_disabled_and_direct() {
        let rules = MailRules;
        let baseline = relay("mail.x.com", "25", "", "");

        let disabled = relay("", "", "", "")
            .with(MAIL_SERVER_TYPE, "none")
            .with(ALERT_EMAIL_ADDRESS, "");
        assert!(rules.issues(&disabled).is_empty());
        assert!(rules.is_save_eligible(&disabled, &baseline));

        let direct = relay("", "", "", "")
            .with(MAIL_SERVER_TYPE, "direct")
            .with(ALERT_EMAIL_ADDRESS, "bad");
        assert_eq!(rules.issues(&direct).len(), 1);
    }

    #[test]
    fn mail_test_gate_requires_committed_state() {
        let rules = MailRules;
        let baseline = relay("mail.x.com", "25", "", "");
        let recipient = FieldMap::new().with(TEST_EMAIL_RECIPIENT, "ops@example.com");
        let no_recipient = FieldMap::new().with(TEST_EMAIL_RECIPIENT, "ops");

        assert!(rules.is_test_eligible(&baseline, &baseline, &recipient));
        assert!(!rules.is_test_eligible(&baseline, &baseline, &no_recipient));

        let edited = relay("mail.y.com", "25", "", "");
        assert!(!rules.is_test_eligible(&edited, &baseline, &recipient));
    }

    #[test]
    fn tls_rules() {
        let rules = TlsRules;
        let baseline = tls(false, "", "", "");

        let off_with_stale = tls(false, "old.pem", "old.key", "");
        assert!(!rules.is_save_eligible(&off_with_stale, &baseline));
        assert!(!rules.is_cancel_eligible(&off_with_stale, &baseline));

        let missing_key = tls(true, "a.pem", "", "");
        assert!(!rules.is_save_eligible(&missing_key, &baseline));
        assert!(rules.is_cancel_eligible(&missing_key, &baseline));

        let complete = tls(true, "a.pem", "a.key", "");
        assert!(rules.is_save_eligible(&complete, &baseline));

        let chain_only = tls(true, "", "", "chain.pem");
        assert!(rules.is_cancel_eligible(&chain_only, &baseline));
        assert!(!rules.is_save_eligible(&chain_only, &baseline));
    }

    #[test]
    fn tls_dirty_ignores_files_while_off() {
        let cmp = TlsRules.comparison();
        let baseline = tls(false, "", "", "");
        assert!(!tls(false, "stale.pem", "", "").differs_from(&baseline, &cmp));
        assert!(tls(true, "", "", "").differs_from(&baseline, &cmp));
    }

    #[test]
    fn change_rules() {
        let rules = ChangeRules;
        let baseline = FieldMap::new().with(TIMEZONE, "UTC");
        assert!(!rules.is_save_eligible(&baseline, &baseline));
        let changed = FieldMap::new().with(TIMEZONE, "America/New_York");
        assert!(rules.is_save_eligible(&changed, &baseline));
        assert!(rules.is_cancel_eligible(&changed, &baseline));
    }

    #[test]
    fn mail_type_parsing() {
        assert_eq!(MailServerType::parse(""), MailServerType::None);
        assert_eq!(MailServerType::parse("None"), MailServerType::None);
        assert_eq!(MailServerType::parse("direct"), MailServerType::Direct);
        assert_eq!(MailServerType::parse("smtp"), MailServerType::Relay);
        assert_eq!(MailServerType::parse("relay"), MailServerType::Relay);
    }
}
