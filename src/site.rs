//! The persisted site document.
//!
//! ```json
//! {
//!   "sectionOrder": ["hero", "about", "team"],
//!   "sections": {
//!     "hero": {
//!       "component": "Hero",
//!       "layout": { "template": "split", "imageWidth": 40 },
//!       "elements": {
//!         "hero-title": { "content": { "en": "Welcome", "ar": "أهلا" } },
//!         "hero-background": { "style": { "background": "url('local-img-abc') center" } }
//!       }
//!     },
//!     "team": {
//!       "component": "Team",
//!       "items": ["7", "3"],
//!       "elements": { "team-7-name": { "content": { "en": "Ada" } } }
//!     }
//!   }
//! }
//! ```
//!
//! The document is owned by the editor side; the engine only reads snapshots
//! of it. Edits are expressed as [`SitePatch`] values that produce a new
//! snapshot, after which the caller runs a fresh composition pass.

use crate::content::{ContentValue, ElementContent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteError {
    /// The document as a whole could not be obtained. Fatal for the page.
    #[error("site configuration unavailable ({}): {source}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    #[serde(default)]
    pub section_order: Vec<String>,
    #[serde(default)]
    pub sections: BTreeMap<String, SectionDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDescriptor {
    /// Component kind tag, e.g. `"Hero"`.
    pub component: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
    /// Element id → content. Ids are opaque here.
    #[serde(default)]
    pub elements: BTreeMap<String, ElementContent>,
    /// Ordered ids of repeated items.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
}

impl SectionDescriptor {
    pub fn new(component: &str) -> Self {
        Self {
            component: component.to_string(),
            layout: None,
            elements: BTreeMap::new(),
            items: Vec::new(),
        }
    }
}

/// Template choice plus free-form numeric options.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(flatten)]
    pub options: BTreeMap<String, serde_json::Value>,
}

impl SiteConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Ids in `sectionOrder` with no descriptor, in order of appearance.
    pub fn dangling_ids(&self) -> Vec<&str> {
        self.section_order
            .iter()
            .filter(|id| !self.sections.contains_key(id.as_str()))
            .map(String::as_str)
            .collect()
    }
}

/// Where snapshots of the site document come from.
pub trait SiteSource {
    fn load(&self) -> Result<SiteConfig, SiteError>;
}

/// A site document stored as a JSON file.
#[derive(Debug, Clone)]
pub struct FileSiteSource {
    path: PathBuf,
}

impl FileSiteSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SiteSource for FileSiteSource {
    fn load(&self) -> Result<SiteConfig, SiteError> {
        let unavailable = |source: Box<dyn std::error::Error + Send + Sync>| SiteError::Unavailable {
            path: self.path.clone(),
            source,
        };
        let raw = fs::read_to_string(&self.path).map_err(|e| unavailable(e.into()))?;
        SiteConfig::from_json(&raw).map_err(|e| unavailable(e.into()))
    }
}

/// One editor action against the site document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SitePatch {
    SetContent {
        section: String,
        element: String,
        language: String,
        value: ContentValue,
    },
    /// `None` removes the property.
    SetStyle {
        section: String,
        element: String,
        property: String,
        value: Option<String>,
    },
    /// `None` returns the section to its kind's default variant.
    SetTemplate {
        section: String,
        template: Option<String>,
    },
    SetLayoutOption {
        section: String,
        key: String,
        value: serde_json::Value,
    },
    Reorder { order: Vec<String> },
    /// Drops the descriptor and every occurrence in `sectionOrder`.
    RemoveSection { section: String },
}

impl SitePatch {
    /// Apply to a copy of `site`. Patches naming a missing section are no-ops.
    pub fn apply(&self, site: &SiteConfig) -> SiteConfig {
        let mut next = site.clone();
        self.apply_to(&mut next);
        next
    }

    fn apply_to(&self, site: &mut SiteConfig) {
        match self {
            SitePatch::SetContent {
                section,
                element,
                language,
                value,
            } => {
                if let Some(desc) = section_mut(site, section) {
                    desc.elements
                        .entry(element.clone())
                        .or_default()
                        .content
                        .set(language, value.clone());
                }
            }
            SitePatch::SetStyle {
                section,
                element,
                property,
                value,
            } => {
                if let Some(desc) = section_mut(site, section) {
                    let style = &mut desc.elements.entry(element.clone()).or_default().style;
                    match value {
                        Some(value) => style.set(property, value),
                        None => {
                            style.remove(property);
                        }
                    }
                }
            }
            SitePatch::SetTemplate { section, template } => {
                if let Some(desc) = section_mut(site, section) {
                    desc.layout.get_or_insert_with(Layout::default).template = template.clone();
                }
            }
            SitePatch::SetLayoutOption {
                section,
                key,
                value,
            } => {
                if let Some(desc) = section_mut(site, section) {
                    let layout = desc.layout.get_or_insert_with(Layout::default);
                    if key == "template" {
                        layout.template = value.as_str().map(str::to_string);
                    } else {
                        layout.options.insert(key.clone(), value.clone());
                    }
                }
            }
            SitePatch::Reorder { order } => {
                site.section_order = order.clone();
            }
            SitePatch::RemoveSection { section } => {
                site.sections.remove(section);
                site.section_order.retain(|id| id != section);
            }
        }
    }
}

/// Apply patches in order to a copy of `site`.
pub fn apply_all<'p>(site: &SiteConfig, patches: impl IntoIterator<Item = &'p SitePatch>) -> SiteConfig {
    let mut next = site.clone();
    for patch in patches {
        patch.apply_to(&mut next);
    }
    next
}

fn section_mut<'s>(site: &'s mut SiteConfig, id: &str) -> Option<&'s mut SectionDescriptor> {
    let desc = site.sections.get_mut(id);
    if desc.is_none() {
        log::debug!("patch targets unknown section {:?}", id);
    }
    desc
}
