//! Section composition.
//!
//! [`Composer::compose`] turns a [`SiteConfig`] snapshot and a
//! [`LanguageContext`] into an ordered list of [`RenderNode`]s:
//!
//! ```text
//! for id in sectionOrder:
//!     descriptor = sections[id]              missing      → skip
//!     template   = registry(kind, variant)   unknown kind → skip
//!                                            unknown variant → default variant
//!     for each field the template needs:
//!         value  = content[lang] → content[default] → Empty
//!         value  = sanitize (rich text) / resolve token (image)
//!         style  = resolve background asset token
//!     layout     = template option domains, clamped
//!     emit RenderNode
//! ```
//!
//! A pass is a pure function of its inputs: no I/O, no shared mutable state,
//! no suspension points. Running it twice on the same inputs yields equal
//! output, so live edits can simply re-run it and discard stale results.
//! A faulty section is skipped and recorded in [`Composition::skipped`]; it
//! never aborts the page.

use crate::asset::{ImageLookup, resolve_asset_tokens, resolve_image_source};
use crate::content::{ContentFormat, ContentValue, ElementContent, ImageRef, StyleDeclarations};
use crate::language::{Direction, Language, LanguageContext};
use crate::naming::ElementKey;
use crate::registry::{
    FieldKind, OptionKey, RegistryError, SectionKind, TemplateRegistry, TemplateSpec, registry,
};
use crate::sanitize::{Sanitizer, default_sanitizer, is_safe_url};
use crate::site::{Layout, SectionDescriptor, SiteConfig};
use pulldown_cmark::{Options, Parser, html as md_html};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Resolved, display-safe value of one element.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ResolvedValue {
    #[default]
    Empty,
    /// Plain text; templates escape it.
    Text(String),
    /// Sanitized markup; templates may emit it unescaped.
    Html(String),
    Image(ImageRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ResolvedElement {
    pub value: ResolvedValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleDeclarations>,
}

static EMPTY_ELEMENT: ResolvedElement = ResolvedElement {
    value: ResolvedValue::Empty,
    style: None,
};

impl ResolvedElement {
    pub fn is_empty(&self) -> bool {
        match &self.value {
            ResolvedValue::Empty => true,
            ResolvedValue::Text(s) | ResolvedValue::Html(s) => s.trim().is_empty(),
            ResolvedValue::Image(img) => img.src.is_empty(),
        }
    }

    pub fn image(&self) -> Option<&ImageRef> {
        match &self.value {
            ResolvedValue::Image(img) if !img.src.is_empty() => Some(img),
            _ => None,
        }
    }

    /// Value of the inline `style` attribute, if any declarations exist.
    pub fn inline_style(&self) -> Option<String> {
        self.style
            .as_ref()
            .filter(|s| !s.is_empty())
            .map(StyleDeclarations::to_inline)
    }
}

/// Layout options after parsing and clamping, keyed by option.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ResolvedLayout(BTreeMap<OptionKey, u32>);

impl ResolvedLayout {
    pub fn get(&self, key: OptionKey) -> Option<u32> {
        self.0.get(&key).copied()
    }
}

/// A resolved, safe, ready-to-display section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNode {
    pub section_id: String,
    pub kind: SectionKind,
    pub variant: &'static str,
    /// The variant name the document asked for, when it was not honored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_variant: Option<String>,
    pub layout: ResolvedLayout,
    /// Ordered repeated-item ids (team members, portfolio entries...).
    pub items: Vec<String>,
    pub elements: BTreeMap<ElementKey, ResolvedElement>,
}

impl RenderNode {
    /// A section-level field. Unknown fields are empty, never missing.
    pub fn field(&self, name: &str) -> &ResolvedElement {
        ElementKey::field(&self.section_id, name)
            .ok()
            .and_then(|key| self.elements.get(&key))
            .unwrap_or(&EMPTY_ELEMENT)
    }

    /// A field of one repeated item.
    pub fn item_field(&self, item: &str, name: &str) -> &ResolvedElement {
        ElementKey::item(self.kind.slug(), item, name)
            .ok()
            .and_then(|key| self.elements.get(&key))
            .unwrap_or(&EMPTY_ELEMENT)
    }

    pub fn option(&self, key: OptionKey) -> Option<u32> {
        self.layout.get(key)
    }
}

/// Why a section id produced no node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The id in `sectionOrder` has no descriptor.
    Missing,
    /// The component kind could not be resolved to any template.
    Unresolvable { cause: RegistryError },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Missing => f.write_str("no section with this id"),
            SkipReason::Unresolvable { cause } => write!(f, "{}", cause),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedSection {
    /// Zero-based position in `sectionOrder`.
    pub position: usize,
    pub section_id: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Output of one composition pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Composition {
    pub language: Language,
    pub direction: Direction,
    pub nodes: Vec<RenderNode>,
    pub skipped: Vec<SkippedSection>,
}

impl Composition {
    pub fn node(&self, section_id: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| n.section_id == section_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A problem found by [`Composer::check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub section_id: String,
    pub severity: Severity,
    pub message: String,
}

/// Composition driver bound to a registry, an image store snapshot and a
/// sanitizer. Cheap to build; holds only references.
#[derive(Clone, Copy)]
pub struct Composer<'a> {
    registry: &'a TemplateRegistry,
    images: &'a dyn ImageLookup,
    sanitizer: &'a Sanitizer,
}

/// Compose with the built-in registry and default sanitizer.
pub fn compose(site: &SiteConfig, lang: &LanguageContext, images: &dyn ImageLookup) -> Composition {
    Composer::new(images).compose(site, lang)
}

impl<'a> Composer<'a> {
    pub fn new(images: &'a dyn ImageLookup) -> Self {
        Self {
            registry: registry(),
            images,
            sanitizer: default_sanitizer(),
        }
    }

    pub fn with_registry(mut self, registry: &'a TemplateRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: &'a Sanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn registry(&self) -> &'a TemplateRegistry {
        self.registry
    }

    pub fn compose(&self, site: &SiteConfig, lang: &LanguageContext) -> Composition {
        let mut nodes = Vec::with_capacity(site.section_order.len());
        let mut skipped = Vec::new();

        for (position, id) in site.section_order.iter().enumerate() {
            match self.compose_section(id, site.sections.get(id), lang) {
                Ok(node) => nodes.push(node),
                Err(reason) => {
                    log::warn!("skipping section {:?} at position {}: {}", id, position, reason);
                    skipped.push(SkippedSection {
                        position,
                        section_id: id.clone(),
                        reason,
                    });
                }
            }
        }

        Composition {
            language: lang.current().clone(),
            direction: lang.direction(),
            nodes,
            skipped,
        }
    }

    fn compose_section(
        &self,
        id: &str,
        descriptor: Option<&SectionDescriptor>,
        lang: &LanguageContext,
    ) -> Result<RenderNode, SkipReason> {
        let descriptor = descriptor.ok_or(SkipReason::Missing)?;
        let requested = descriptor.layout.as_ref().and_then(|l| l.template.as_deref());
        let resolution = self
            .registry
            .resolve_renderer(&descriptor.component, requested)
            .map_err(|cause| SkipReason::Unresolvable { cause })?;
        let spec = resolution.template;

        let requested_variant = match (resolution.fell_back, requested) {
            (true, Some(name)) if !name.trim().is_empty() => {
                log::debug!(
                    "section {:?}: variant {:?} not registered for {}, using {:?}",
                    id,
                    name,
                    spec.kind,
                    spec.variant
                );
                Some(name.to_string())
            }
            _ => None,
        };

        let mut elements = BTreeMap::new();
        for field in spec.fields {
            let key = match ElementKey::field(id, field.name) {
                Ok(key) => key,
                Err(e) => {
                    log::warn!("section {:?}: skipping field {:?}: {}", id, field.name, e);
                    continue;
                }
            };
            let element = self.resolve_element(descriptor.elements.get(key.as_str()), field.kind, lang);
            elements.insert(key, element);
        }

        let mut items = Vec::new();
        if !spec.item_fields.is_empty() {
            for item in &descriptor.items {
                let keys: Result<Vec<_>, _> = spec
                    .item_fields
                    .iter()
                    .map(|f| ElementKey::item(spec.kind.slug(), item, f.name).map(|k| (k, f.kind)))
                    .collect();
                let keys = match keys {
                    Ok(keys) => keys,
                    Err(e) => {
                        log::warn!("section {:?}: skipping item {:?}: {}", id, item, e);
                        continue;
                    }
                };
                for (key, kind) in keys {
                    let element = self.resolve_element(descriptor.elements.get(key.as_str()), kind, lang);
                    elements.insert(key, element);
                }
                items.push(item.clone());
            }
        }

        Ok(RenderNode {
            section_id: id.to_string(),
            kind: spec.kind,
            variant: spec.variant,
            requested_variant,
            layout: resolve_layout(descriptor.layout.as_ref(), spec),
            items,
            elements,
        })
    }

    fn resolve_element(
        &self,
        element: Option<&ElementContent>,
        kind: FieldKind,
        lang: &LanguageContext,
    ) -> ResolvedElement {
        let Some(element) = element else {
            return ResolvedElement::default();
        };
        let style = (!element.style.is_empty())
            .then(|| resolve_asset_tokens(&element.style, self.images).into_owned());
        let value = match kind {
            FieldKind::Backdrop => ResolvedValue::Empty,
            _ => {
                let raw = element.content.resolve(lang.current(), lang.default_language());
                self.resolve_value(raw, kind, element.format)
            }
        };
        ResolvedElement { value, style }
    }

    fn resolve_value(&self, raw: &ContentValue, kind: FieldKind, format: ContentFormat) -> ResolvedValue {
        match (raw, kind) {
            (ContentValue::Empty, _) => ResolvedValue::Empty,
            (ContentValue::Image(img), _) => {
                ResolvedValue::Image(resolve_image_source(img, self.images).into_owned())
            }
            (ContentValue::Text(src), FieldKind::Image) => {
                let img = ImageRef {
                    src: src.trim().to_string(),
                    alt: None,
                };
                ResolvedValue::Image(resolve_image_source(&img, self.images).into_owned())
            }
            (ContentValue::Text(url), FieldKind::Link) => {
                let url = url.trim();
                if is_safe_url(url) {
                    ResolvedValue::Text(url.to_string())
                } else {
                    log::warn!("dropping link with unsafe scheme: {:?}", url);
                    ResolvedValue::Empty
                }
            }
            (ContentValue::Text(text), FieldKind::RichText) => match format {
                ContentFormat::Html => ResolvedValue::Html(self.sanitizer.sanitize(text)),
                ContentFormat::Markdown => {
                    ResolvedValue::Html(self.sanitizer.sanitize(&markdown_to_html(text)))
                }
                ContentFormat::Text => ResolvedValue::Text(text.clone()),
            },
            (ContentValue::Text(text), _) => ResolvedValue::Text(text.clone()),
        }
    }

    /// Report everything a composition pass would silently recover from.
    pub fn check(&self, site: &SiteConfig, lang: &LanguageContext) -> Vec<Issue> {
        let mut issues = Vec::new();
        let mut seen: Vec<&str> = Vec::new();

        for id in &site.section_order {
            if seen.contains(&id.as_str()) {
                issues.push(Issue {
                    section_id: id.clone(),
                    severity: Severity::Warning,
                    message: "listed more than once in sectionOrder".to_string(),
                });
            }
            seen.push(id);

            let Some(descriptor) = site.sections.get(id) else {
                issues.push(error(id, SkipReason::Missing.to_string()));
                continue;
            };
            let requested = descriptor.layout.as_ref().and_then(|l| l.template.as_deref());
            let resolution = match self.registry.resolve_renderer(&descriptor.component, requested) {
                Ok(resolution) => resolution,
                Err(cause) => {
                    issues.push(error(id, cause.to_string()));
                    continue;
                }
            };
            if let (true, Some(name)) = (resolution.fell_back, requested) {
                issues.push(Issue {
                    section_id: id.clone(),
                    severity: Severity::Warning,
                    message: format!(
                        "unknown template {:?}, falling back to {:?}",
                        name, resolution.template.variant
                    ),
                });
            }
            for field in resolution.template.fields {
                if field.kind == FieldKind::Backdrop {
                    continue;
                }
                let Ok(key) = ElementKey::field(id, field.name) else {
                    continue;
                };
                let has_default = descriptor
                    .elements
                    .get(key.as_str())
                    .is_some_and(|el| !el.content.resolve(lang.default_language(), lang.default_language()).is_empty());
                if !has_default {
                    issues.push(Issue {
                        section_id: id.clone(),
                        severity: Severity::Warning,
                        message: format!("{} has no {} content", key, lang.default_language()),
                    });
                }
            }
        }

        for id in site.sections.keys() {
            if !site.section_order.contains(id) {
                issues.push(Issue {
                    section_id: id.clone(),
                    severity: Severity::Warning,
                    message: "not listed in sectionOrder; never rendered".to_string(),
                });
            }
        }
        issues
    }
}

fn error(id: &str, message: String) -> Issue {
    Issue {
        section_id: id.to_string(),
        severity: Severity::Error,
        message,
    }
}

fn resolve_layout(layout: Option<&Layout>, spec: &TemplateSpec) -> ResolvedLayout {
    let mut values = BTreeMap::new();
    for opt in spec.options {
        let value = layout
            .and_then(|l| l.options.get(opt.key.key()))
            .and_then(parse_option)
            .map(|v| opt.clamp(v))
            .unwrap_or(opt.default);
        values.insert(opt.key, value);
    }
    ResolvedLayout(values)
}

/// Accepts `40`, `40.6`, `"40"`, `"40%"`. Negative values become 0.
fn parse_option(value: &serde_json::Value) -> Option<u32> {
    let n = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !n.is_finite() {
        return None;
    }
    Some(n.round().clamp(0.0, u32::MAX as f64) as u32)
}

fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);
    let mut html = String::new();
    md_html::push_html(&mut html, parser);
    html
}
