//! Engine configuration.
//!
//! Loads and validates `pagewright.toml`. Every table and every key has a
//! default (`#[serde(default)]` on each section struct), so a file only names
//! the values it changes: an absent `[page]` table is the stock page config,
//! and a `[page]` table with only `title` keeps the stock `stylesheet`. A
//! list such as `language.supported` is replaced as a whole, never appended
//! to.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [language]
//! default = "en"            # Fallback language for every content cell
//! supported = ["en", "ar"]  # Languages the switcher cycles through
//! rtl = ["ar"]              # Languages rendered right-to-left
//!
//! [images]
//! dir = "images"            # Image store directory
//!
//! [page]
//! title = "Home"            # Document <title>
//! stylesheet = ""           # Extra stylesheet href (empty = none)
//!
//! [preferences]
//! file = ".pagewright-lang" # Where the chosen language is remembered
//! ```
//!
//! Relative paths are resolved against the directory holding the config
//! file. Unknown keys are rejected to catch typos early.

use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Engine configuration loaded from `pagewright.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub language: LanguageConfig,
    pub images: ImagesConfig,
    pub page: PageConfig,
    pub preferences: PreferencesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LanguageConfig {
    pub default: String,
    pub supported: Vec<String>,
    pub rtl: Vec<String>,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            default: "en".to_string(),
            supported: vec!["en".to_string(), "ar".to_string()],
            rtl: vec!["ar".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    pub dir: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            dir: "images".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    pub title: String,
    pub stylesheet: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: "Home".to_string(),
            stylesheet: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreferencesConfig {
    pub file: String,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            file: ".pagewright-lang".to_string(),
        }
    }
}

impl EngineConfig {
    /// Validate the language set and paths.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lang = &self.language;
        if lang.supported.is_empty() {
            return Err(ConfigError::Validation(
                "language.supported must not be empty".into(),
            ));
        }
        for code in lang
            .supported
            .iter()
            .chain(&lang.rtl)
            .chain(std::iter::once(&lang.default))
        {
            Language::new(code).map_err(|e| ConfigError::Validation(format!("language: {}", e)))?;
        }
        let supported: Vec<Language> = lang
            .supported
            .iter()
            .filter_map(|c| Language::new(c).ok())
            .collect();
        let is_supported = |code: &str| Language::new(code).is_ok_and(|l| supported.contains(&l));
        if !is_supported(&lang.default) {
            return Err(ConfigError::Validation(format!(
                "language.default {:?} must be listed in language.supported",
                lang.default
            )));
        }
        if let Some(code) = lang.rtl.iter().find(|c| !is_supported(c)) {
            return Err(ConfigError::Validation(format!(
                "language.rtl entry {:?} must be listed in language.supported",
                code
            )));
        }
        if self.images.dir.trim().is_empty() {
            return Err(ConfigError::Validation("images.dir must not be empty".into()));
        }
        if self.preferences.file.trim().is_empty() {
            return Err(ConfigError::Validation(
                "preferences.file must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Image store directory, resolved against `base`.
    pub fn images_dir(&self, base: &Path) -> PathBuf {
        base.join(&self.images.dir)
    }

    /// Language preference file, resolved against `base`.
    pub fn preferences_file(&self, base: &Path) -> PathBuf {
        base.join(&self.preferences.file)
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Parse config text, fill in defaults, and validate.
pub fn parse_config(text: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path`. A missing file is the stock config.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(text) => parse_config(&text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("no config at {}, using defaults", path.display());
            Ok(EngineConfig::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Returns a fully-commented stock `pagewright.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Pagewright Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Relative paths are resolved against the directory holding this file.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Languages
# ---------------------------------------------------------------------------
[language]
# Fallback language. A content cell with no value in the current language
# shows its value in this one.
default = "en"

# Languages a visitor can switch between, in switcher order.
# Must include the default.
supported = ["en", "ar"]

# Languages written right-to-left. The page gets dir="rtl" when one of
# these is current.
rtl = ["ar"]

# ---------------------------------------------------------------------------
# Image store
# ---------------------------------------------------------------------------
[images]
# Directory of images referenced by local-img-<id> tokens. The id is the
# file name without its extension.
dir = "images"

# ---------------------------------------------------------------------------
# Rendered page
# ---------------------------------------------------------------------------
[page]
# Document <title>.
title = "Home"

# Extra stylesheet linked after the built-in styles. Empty = none.
stylesheet = ""

# ---------------------------------------------------------------------------
# Language preference
# ---------------------------------------------------------------------------
[preferences]
# File remembering the last chosen language between sessions.
file = ".pagewright-lang"
"##
}
