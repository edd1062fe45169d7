//! Configuration management
//!
//! Settings live in `settings.json` in the data directory:
//! ```json
//! {
//!   "app": { "eventLogging": true },
//!   "receipt": { "businessName": "...", "footerText": "..." }
//! }
//! ```
//! Keys this crate does not know about are kept as-is when saving.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::result::Error;

/// Environment variable overriding `app.eventLogging`
pub const EVENT_LOGGING_ENV: &str = "BILLPAY_EVENT_LOGGING";

/// Environment variable overriding the data directory
pub const DIR_ENV: &str = "BILLPAY_DIR";

/// Record database file name inside the data directory
pub const DATABASE_FILE: &str = "billpay.duckdb";

const SETTINGS_FILE: &str = "settings.json";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    #[serde(default)]
    receipt: ReceiptSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default = "default_true")]
    event_logging: bool,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            event_logging: true,
            other: HashMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Business details printed on receipts
///
/// Only persisted here; rendering is done by whatever prints the receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReceiptSettings {
    pub business_name: String,
    pub owner_name: String,
    pub address: String,
    pub location: String,
    pub phone_number: String,
    pub receipt_title: String,
    pub footer_text: String,
}

impl Default for ReceiptSettings {
    fn default() -> Self {
        Self {
            business_name: String::new(),
            owner_name: String::new(),
            address: String::new(),
            location: String::new(),
            phone_number: String::new(),
            receipt_title: "Prepaid Electricity Receipt".to_string(),
            footer_text: "Thank you".to_string(),
        }
    }
}

/// Billpay configuration (the parts of settings.json this crate manages)
#[derive(Debug, Clone)]
pub struct Config {
    pub event_logging: bool,
    pub receipt: ReceiptSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            event_logging: true,
            receipt: ReceiptSettings::default(),
        }
    }
}

impl Config {
    /// Keys accepted by [`Config::get`] and [`Config::set`], as written in settings.json
    pub const KEYS: [&'static str; 8] = [
        "app.eventLogging",
        "receipt.businessName",
        "receipt.ownerName",
        "receipt.address",
        "receipt.location",
        "receipt.phoneNumber",
        "receipt.receiptTitle",
        "receipt.footerText",
    ];

    /// Load config from the data directory
    ///
    /// A missing settings file yields defaults; a malformed one yields
    /// defaults and a warning on stderr. Event logging can also be switched
    /// with `BILLPAY_EVENT_LOGGING`.
    pub fn load(billpay_dir: &Path) -> Result<Self> {
        let raw = read_settings(billpay_dir)?;

        let event_logging = std::env::var(EVENT_LOGGING_ENV)
            .ok()
            .as_deref()
            .and_then(parse_bool)
            .unwrap_or(raw.app.event_logging);

        Ok(Self {
            event_logging,
            receipt: raw.receipt,
        })
    }

    /// Save config to the data directory, preserving settings we don't manage
    ///
    /// Refuses to overwrite a settings file that is not valid JSON.
    pub fn save(&self, billpay_dir: &Path) -> Result<()> {
        let mut settings = read_settings_strict(billpay_dir)?;

        settings.app.event_logging = self.event_logging;
        settings.receipt = self.receipt.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        let path = billpay_dir.join(SETTINGS_FILE);
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Current value of a setting, `None` for an unknown key
    pub fn get(&self, key: &str) -> Option<String> {
        let receipt = &self.receipt;
        let value = match key {
            "app.eventLogging" => return Some(self.event_logging.to_string()),
            "receipt.businessName" => &receipt.business_name,
            "receipt.ownerName" => &receipt.owner_name,
            "receipt.address" => &receipt.address,
            "receipt.location" => &receipt.location,
            "receipt.phoneNumber" => &receipt.phone_number,
            "receipt.receiptTitle" => &receipt.receipt_title,
            "receipt.footerText" => &receipt.footer_text,
            _ => return None,
        };
        Some(value.clone())
    }

    /// Change one setting in memory; call [`Config::save`] to persist it
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let receipt = &mut self.receipt;
        let field = match key {
            "app.eventLogging" => {
                self.event_logging = parse_bool(value).ok_or_else(|| {
                    Error::config(format!("{} expects on/off or true/false, got '{}'", key, value))
                })?;
                return Ok(());
            }
            "receipt.businessName" => &mut receipt.business_name,
            "receipt.ownerName" => &mut receipt.owner_name,
            "receipt.address" => &mut receipt.address,
            "receipt.location" => &mut receipt.location,
            "receipt.phoneNumber" => &mut receipt.phone_number,
            "receipt.receiptTitle" => &mut receipt.receipt_title,
            "receipt.footerText" => &mut receipt.footer_text,
            _ => {
                return Err(Error::config(format!(
                    "Unknown setting '{}'. Known settings: {}",
                    key,
                    Self::KEYS.join(", ")
                ))
                .into())
            }
        };
        *field = value.trim().to_string();
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Raw settings.json text, `None` when the file does not exist
fn read_settings_text(billpay_dir: &Path) -> Result<Option<String>> {
    let path = billpay_dir.join(SETTINGS_FILE);
    if !path.exists() {
        return Ok(None);
    }
    std::fs::read_to_string(&path)
        .map(Some)
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Settings for reading: malformed JSON falls back to defaults
fn read_settings(billpay_dir: &Path) -> Result<SettingsFile> {
    let Some(content) = read_settings_text(billpay_dir)? else {
        return Ok(SettingsFile::default());
    };
    match serde_json::from_str(&content) {
        Ok(settings) => Ok(settings),
        Err(e) => {
            eprintln!(
                "[billpay] Ignoring malformed {} ({}); using defaults",
                billpay_dir.join(SETTINGS_FILE).display(),
                e
            );
            Ok(SettingsFile::default())
        }
    }
}

/// Settings for updating: malformed JSON is an error, so it is never overwritten
fn read_settings_strict(billpay_dir: &Path) -> Result<SettingsFile> {
    let Some(content) = read_settings_text(billpay_dir)? else {
        return Ok(SettingsFile::default());
    };
    let path = billpay_dir.join(SETTINGS_FILE);
    serde_json::from_str(&content).with_context(|| {
        format!(
            "{} is not valid JSON; fix or remove it before changing settings",
            path.display()
        )
    })
}

/// Data directory: `BILLPAY_DIR` if set, else `~/.billpay`
pub fn billpay_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".billpay"))
        .context("Could not find home directory")
}
