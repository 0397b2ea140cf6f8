//! Server settings, read from a TOML file.
//!
//! Every key is optional:
//!
//! ```toml
//! bind = "0.0.0.0:8080"
//! root = "site"
//! site_title = "My Blog"
//! page_size = 20
//! max_body_bytes = 1048576
//!
//! [log]
//! enabled = true
//! max_size = 500000
//!
//! [admin]
//! enabled = true
//! user = "admin"
//! password = "change-me"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Error;

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// `host:port` to listen on.
    pub bind: String,
    /// Directory that backs storage.
    pub root: PathBuf,
    pub site_title: String,
    pub page_size: usize,
    /// Larger request bodies are refused with 413.
    pub max_body_bytes: usize,
    pub log: LogSettings,
    pub admin: AdminSettings,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
    pub enabled: bool,
    /// Rotation threshold in bytes.
    pub max_size: u64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdminSettings {
    pub enabled: bool,
    pub user: String,
    /// The panel stays off while this is empty.
    pub password: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_owned(),
            root: PathBuf::from("site"),
            site_title: "My Blog".to_owned(),
            page_size: 20,
            max_body_bytes: 1024 * 1024,
            log: LogSettings::default(),
            admin: AdminSettings::default(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { enabled: true, max_size: 500_000 }
    }
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self { enabled: true, user: "admin".to_owned(), password: String::new() }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut settings: Self = toml::from_str(text)?;
        settings.page_size = settings.page_size.max(1);
        Ok(settings)
    }

    /// Whether the admin routes should be mounted.
    pub fn admin_enabled(&self) -> bool {
        self.admin.enabled && !self.admin.password.is_empty()
    }
}
