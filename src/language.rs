//! Active-language state.
//!
//! The composer never reads ambient global state: every pass receives a
//! [`LanguageContext`] value describing the current language, the single
//! fallback language, and the finite set of languages the site supports.
//!
//! ## Lifecycle
//!
//! 1. At session start the context is built from the stored preference (if it
//!    names a supported language) or the configured default.
//! 2. An explicit user action ([`LanguageContext::switch_to`] or
//!    [`LanguageContext::toggle`]) mutates it.
//! 3. The caller persists the new code through a [`PreferenceStore`] and runs a
//!    fresh composition pass. Changing the language never runs the engine.

use crate::config::LanguageConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum LanguageError {
    #[error("invalid language code: {0:?}")]
    InvalidCode(String),
    #[error("unsupported language: {code} (supported: {supported})")]
    Unsupported { code: String, supported: String },
}

/// A validated language code such as `en`, `ar` or `pt-BR`.
///
/// Codes are 2–8 ASCII letters optionally followed by `-` separated
/// alphanumeric subtags. Case is canonicalized: the primary subtag is
/// lowercased, two-letter regions uppercased, four-letter scripts
/// titlecased, anything else lowercased. `PT-br` becomes `pt-BR`,
/// `zh-hant` becomes `zh-Hant`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Language(String);

impl Language {
    pub fn new(code: &str) -> Result<Self, LanguageError> {
        let code = code.trim();
        let mut parts = code.split('-');
        let primary = parts.next().unwrap_or_default();
        let primary_ok =
            (2..=8).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic());
        let rest_ok = parts.all(|p| {
            (1..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphanumeric())
        });
        if !primary_ok || !rest_ok {
            return Err(LanguageError::InvalidCode(code.to_string()));
        }
        let normalized: Vec<String> = code
            .split('-')
            .enumerate()
            .map(|(i, part)| canonical_subtag(i, part))
            .collect();
        Ok(Self(normalized.join("-")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn canonical_subtag(index: usize, part: &str) -> String {
    let alpha = part.chars().all(|c| c.is_ascii_alphabetic());
    match part.len() {
        2 if index > 0 && alpha => part.to_ascii_uppercase(),
        4 if index > 0 && alpha => {
            let (head, tail) = part.split_at(1);
            format!("{}{}", head.to_ascii_uppercase(), tail.to_ascii_lowercase())
        }
        _ => part.to_ascii_lowercase(),
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Language {
    type Error = LanguageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Language::new(&value)
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.0
    }
}

/// Writing direction of a language, rendered as the document `dir` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

/// The language state consumed by a composition pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageContext {
    current: Language,
    default: Language,
    supported: Vec<Language>,
    rtl: Vec<Language>,
}

impl LanguageContext {
    /// Build a context directly. `default` and `current` are added to the
    /// supported set if missing.
    pub fn new(current: Language, default: Language) -> Self {
        let mut supported = vec![default.clone()];
        if current != default {
            supported.push(current.clone());
        }
        Self {
            current,
            default,
            supported,
            rtl: Vec::new(),
        }
    }

    /// Build a context from validated config, honoring a stored preference
    /// when it names a supported language.
    ///
    /// An unsupported or malformed preference is ignored, not an error: the
    /// session simply starts in the default language.
    pub fn from_config(config: &LanguageConfig, preference: Option<&str>) -> Self {
        let supported: Vec<Language> = config
            .supported
            .iter()
            .filter_map(|c| Language::new(c).ok())
            .collect();
        let default = Language::new(&config.default)
            .ok()
            .or_else(|| supported.first().cloned())
            .unwrap_or_else(|| Language("en".to_string()));
        let current = preference
            .and_then(|p| Language::new(p).ok())
            .filter(|p| supported.contains(p))
            .unwrap_or_else(|| default.clone());
        let rtl = config
            .rtl
            .iter()
            .filter_map(|c| Language::new(c).ok())
            .collect();

        let mut ctx = Self {
            current,
            default,
            supported,
            rtl,
        };
        if !ctx.supported.contains(&ctx.default) {
            ctx.supported.insert(0, ctx.default.clone());
        }
        ctx
    }

    pub fn with_rtl(mut self, rtl: Vec<Language>) -> Self {
        self.rtl = rtl;
        self
    }

    pub fn with_supported(mut self, supported: Vec<Language>) -> Self {
        self.supported = supported;
        for lang in [self.default.clone(), self.current.clone()] {
            if !self.supported.contains(&lang) {
                self.supported.push(lang);
            }
        }
        self
    }

    pub fn current(&self) -> &Language {
        &self.current
    }

    pub fn default_language(&self) -> &Language {
        &self.default
    }

    pub fn supported(&self) -> &[Language] {
        &self.supported
    }

    pub fn is_supported(&self, lang: &Language) -> bool {
        self.supported.contains(lang)
    }

    pub fn direction(&self) -> Direction {
        if self.rtl.contains(&self.current) {
            Direction::Rtl
        } else {
            Direction::Ltr
        }
    }

    /// Explicit user action: make `code` the current language.
    ///
    /// On error the context is left unchanged.
    pub fn switch_to(&mut self, code: &str) -> Result<(), LanguageError> {
        let lang = Language::new(code)?;
        if !self.is_supported(&lang) {
            return Err(LanguageError::Unsupported {
                code: lang.0,
                supported: self
                    .supported
                    .iter()
                    .map(Language::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
        self.current = lang;
        Ok(())
    }

    /// Advance to the next supported language, wrapping around.
    ///
    /// With the usual two locales this is the language switch button.
    pub fn toggle(&mut self) -> &Language {
        let pos = self
            .supported
            .iter()
            .position(|l| l == &self.current)
            .unwrap_or(0);
        self.current = self.supported[(pos + 1) % self.supported.len()].clone();
        &self.current
    }
}

// =============================================================================
// Preference store
// =============================================================================

#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Supplies and persists the session's language preference.
pub trait PreferenceStore {
    /// The stored code, if any. Read failures count as "no preference".
    fn load(&self) -> Option<String>;
    fn save(&self, lang: &Language) -> Result<(), PreferenceError>;
}

/// Preference stored as a single line in a plain text file.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> Option<String> {
        let raw = fs::read_to_string(&self.path).ok()?;
        let code = raw.trim();
        (!code.is_empty()).then(|| code.to_string())
    }

    fn save(&self, lang: &Language) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, format!("{}\n", lang))?;
        Ok(())
    }
}
