//! In-memory settings storage.

use crate::error::{ServerError, ServerResult};
use parking_lot::RwLock;
use settings_sync_protocol::fields::*;
use settings_sync_protocol::FieldMap;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Sections the store accepts, with the fields each one owns.
pub const SECTIONS: &[(&str, &[&str])] = &[
    ("url", &[SERVER_URL]),
    ("tableau-url", &[TABLEAU_SERVER_URL]),
    ("admin", &[PASSWORD]),
    (
        "mail",
        &[
            MAIL_SERVER_TYPE,
            ALERT_EMAIL_NAME,
            ALERT_EMAIL_ADDRESS,
            SMTP_SERVER,
            SMTP_PORT,
            SMTP_USERNAME,
            SMTP_PASSWORD,
        ],
    ),
    (
        "ssl",
        &[
            ENABLE_SSL,
            SSL_CERTIFICATE_FILE,
            SSL_CERTIFICATE_KEY_FILE,
            SSL_CERTIFICATE_CHAIN_FILE,
        ],
    ),
    ("tz", &[TIMEZONE]),
    ("auth", &[AUTHENTICATION_TYPE]),
];

/// Fields never served in the setup document.
pub const WITHHELD_FIELDS: &[&str] = &[
    PASSWORD,
    CONFIRM_PASSWORD,
    SSL_CERTIFICATE_FILE,
    SSL_CERTIFICATE_KEY_FILE,
    SSL_CERTIFICATE_CHAIN_FILE,
];

/// Fields owned by a section, if the section exists.
pub fn section_fields(section: &str) -> Option<&'static [&'static str]> {
    SECTIONS
        .iter()
        .find(|(name, _)| *name == section)
        .map(|(_, fields)| *fields)
}

/// Stores the settings document and the administrator password digest.
#[derive(Debug, Default)]
pub struct SettingsStore {
    document: RwLock<FieldMap>,
    admin_digest: RwLock<Option<[u8; 32]>>,
    saves: RwLock<HashMap<String, u64>>,
}

impl SettingsStore {
    /// Creates a store holding `initial`.
    ///
    /// An administrator password in `initial` is hashed, not stored.
    pub fn new(initial: FieldMap) -> Self {
        let admin_digest = initial
            .get(PASSWORD)
            .filter(|p| !p.is_blank())
            .map(|p| hash_password(&p.to_string()));
        Self {
            document: RwLock::new(initial.without(&[PASSWORD, CONFIRM_PASSWORD])),
            admin_digest: RwLock::new(admin_digest),
            saves: RwLock::new(HashMap::new()),
        }
    }

    /// Applies a section save. Fields the section does not own are ignored.
    pub fn apply(&self, section: &str, fields: &FieldMap) -> ServerResult<()> {
        let owned = section_fields(section)
            .ok_or_else(|| ServerError::NotFound(format!("/rest/setup/{section}")))?;

        if section == "admin" {
            *self.admin_digest.write() = Some(hash_password(fields.text(PASSWORD)));
        } else {
            let mut document = self.document.write();
            *document = document.merged(&fields.subset(owned));
        }

        *self.saves.write().entry(section.to_string()).or_insert(0) += 1;
        Ok(())
    }

    /// The setup document, without passwords or uploaded file names.
    pub fn setup_document(&self) -> FieldMap {
        self.document.read().without(WITHHELD_FIELDS)
    }

    /// Every stored field, including withheld ones.
    pub fn document(&self) -> FieldMap {
        self.document.read().clone()
    }

    /// Returns true if `password` matches the stored administrator password.
    pub fn verify_admin_password(&self, password: &str) -> bool {
        self.admin_digest
            .read()
            .is_some_and(|digest| digest == hash_password(password))
    }

    /// Returns true once an administrator password has been set.
    pub fn has_admin_password(&self) -> bool {
        self.admin_digest.read().is_some()
    }

    /// Number of successful saves for a section.
    pub fn save_count(&self, section: &str) -> u64 {
        self.saves.read().get(section).copied().unwrap_or(0)
    }
}

fn hash_password(password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}
