//! Template registry.
//!
//! Maps `(section kind, variant name)` to a [`TemplateSpec`]: the fields the
//! variant needs, its layout option domains, and its renderer function.
//!
//! Kinds are a closed enum. The catalog of variants per kind is an exhaustive
//! `match` in [`crate::templates::catalog`], so adding a kind without giving it
//! templates is a compile error rather than a runtime surprise. The registry
//! is built once and shared read-only by every composition pass.
//!
//! ## Resolution
//!
//! | Request | Result |
//! |---------|--------|
//! | known kind, known variant | that variant |
//! | known kind, absent/unknown variant | the kind's default variant (recoverable) |
//! | kind with no registered variants | [`RegistryError::NoVariants`] |
//! | unrecognized component tag | [`RegistryError::UnknownKind`] |

use crate::compose::RenderNode;
use maud::Markup;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum RegistryError {
    #[error("unknown component kind {component:?}")]
    UnknownKind { component: String },
    #[error("no templates registered for {kind}")]
    NoVariants { kind: SectionKind },
}

/// Semantic kind of a section, from the descriptor's `component` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SectionKind {
    Hero,
    About,
    Services,
    Portfolio,
    Team,
    Testimonials,
    Contact,
    Footer,
}

impl SectionKind {
    pub const ALL: [SectionKind; 8] = [
        SectionKind::Hero,
        SectionKind::About,
        SectionKind::Services,
        SectionKind::Portfolio,
        SectionKind::Team,
        SectionKind::Testimonials,
        SectionKind::Contact,
        SectionKind::Footer,
    ];

    /// Match a component tag, ignoring ASCII case.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag().eq_ignore_ascii_case(tag))
    }

    pub fn tag(self) -> &'static str {
        match self {
            SectionKind::Hero => "Hero",
            SectionKind::About => "About",
            SectionKind::Services => "Services",
            SectionKind::Portfolio => "Portfolio",
            SectionKind::Team => "Team",
            SectionKind::Testimonials => "Testimonials",
            SectionKind::Contact => "Contact",
            SectionKind::Footer => "Footer",
        }
    }

    /// Lowercase prefix of repeated-item element ids (`team-42-name`).
    pub fn slug(self) -> &'static str {
        match self {
            SectionKind::Hero => "hero",
            SectionKind::About => "about",
            SectionKind::Services => "service",
            SectionKind::Portfolio => "portfolio",
            SectionKind::Team => "team",
            SectionKind::Testimonials => "testimonial",
            SectionKind::Contact => "contact",
            SectionKind::Footer => "footer",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// How a field's content is treated during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Plain text, escaped when rendered.
    Text,
    /// Markup (or markdown) run through the sanitizer.
    RichText,
    /// Image reference; bare asset tokens are resolved.
    Image,
    /// Link target. Values with a script-capable scheme resolve to empty.
    Link,
    /// Style-only element (section backdrop); content is ignored.
    Backdrop,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

pub const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind }
}

/// Numeric layout options a template understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OptionKey {
    /// Share of the row given to the image, in percent.
    ImageWidth,
    /// Grid column count.
    Columns,
}

impl OptionKey {
    /// Key in the persisted `layout` object.
    pub fn key(self) -> &'static str {
        match self {
            OptionKey::ImageWidth => "imageWidth",
            OptionKey::Columns => "columns",
        }
    }
}

/// Accepted domain of one layout option.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub key: OptionKey,
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

impl OptionSpec {
    pub fn clamp(&self, value: u32) -> u32 {
        value.clamp(self.min, self.max)
    }
}

pub const fn option(key: OptionKey, min: u32, max: u32, default: u32) -> OptionSpec {
    OptionSpec {
        key,
        min,
        max,
        default,
    }
}

/// A presentational function: consumes a resolved node, never the raw site.
pub type RenderFn = fn(&RenderNode) -> Markup;

/// One registered `(kind, variant)` pair.
#[derive(Debug, Clone, Copy)]
pub struct TemplateSpec {
    pub kind: SectionKind,
    pub variant: &'static str,
    /// Section-level fields, keyed `{section}-{field}`.
    pub fields: &'static [FieldSpec],
    /// Per-item fields, keyed `{kind}-{item}-{field}`. Empty for kinds
    /// without repeated items.
    pub item_fields: &'static [FieldSpec],
    pub options: &'static [OptionSpec],
    pub render: RenderFn,
}

/// Outcome of [`TemplateRegistry::resolve_renderer`].
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'r> {
    pub template: &'r TemplateSpec,
    /// True when the requested variant was absent or unknown.
    pub fell_back: bool,
}

#[derive(Debug, Default)]
struct KindEntry {
    default: usize,
    variants: Vec<&'static TemplateSpec>,
}

/// Immutable `(kind, variant)` → template table.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    kinds: BTreeMap<SectionKind, KindEntry>,
}

static BUILTIN: LazyLock<TemplateRegistry> = LazyLock::new(TemplateRegistry::builtin);

/// The process-wide registry of built-in templates.
pub fn registry() -> &'static TemplateRegistry {
    &BUILTIN
}

impl TemplateRegistry {
    /// Build from specs. The first spec registered for a kind is its default.
    /// A later spec with the same `(kind, variant)` is ignored.
    pub fn from_specs(specs: impl IntoIterator<Item = &'static TemplateSpec>) -> Self {
        let mut kinds: BTreeMap<SectionKind, KindEntry> = BTreeMap::new();
        for spec in specs {
            let entry = kinds.entry(spec.kind).or_default();
            if entry.variants.iter().any(|s| s.variant == spec.variant) {
                continue;
            }
            entry.variants.push(spec);
        }
        Self { kinds }
    }

    /// All built-in templates.
    pub fn builtin() -> Self {
        Self::from_specs(
            SectionKind::ALL
                .into_iter()
                .flat_map(crate::templates::catalog),
        )
    }

    /// Resolve a component tag and optional variant name to a template.
    pub fn resolve_renderer(
        &self,
        component: &str,
        variant: Option<&str>,
    ) -> Result<Resolution<'_>, RegistryError> {
        let kind = SectionKind::from_tag(component).ok_or_else(|| RegistryError::UnknownKind {
            component: component.to_string(),
        })?;
        self.resolve_kind(kind, variant)
    }

    pub fn resolve_kind(
        &self,
        kind: SectionKind,
        variant: Option<&str>,
    ) -> Result<Resolution<'_>, RegistryError> {
        let entry = self
            .kinds
            .get(&kind)
            .filter(|e| !e.variants.is_empty())
            .ok_or(RegistryError::NoVariants { kind })?;

        let requested = variant
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .and_then(|v| {
                entry
                    .variants
                    .iter()
                    .find(|s| s.variant.eq_ignore_ascii_case(v))
                    .copied()
            });

        Ok(match requested {
            Some(template) => Resolution {
                template,
                fell_back: false,
            },
            None => Resolution {
                template: entry.variants[entry.default],
                fell_back: true,
            },
        })
    }

    /// Look up an exact pair, as recorded in a render node.
    pub fn get(&self, kind: SectionKind, variant: &str) -> Option<&TemplateSpec> {
        self.kinds
            .get(&kind)?
            .variants
            .iter()
            .find(|s| s.variant == variant)
            .copied()
    }

    pub fn default_variant(&self, kind: SectionKind) -> Option<&'static str> {
        let entry = self.kinds.get(&kind)?;
        entry.variants.get(entry.default).map(|s| s.variant)
    }

    pub fn variants(&self, kind: SectionKind) -> impl Iterator<Item = &'static str> {
        self.kinds
            .get(&kind)
            .into_iter()
            .flat_map(|e| e.variants.iter().map(|s| s.variant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_default_variant() {
        let registry = TemplateRegistry::builtin();
        for kind in SectionKind::ALL {
            assert!(
                registry.default_variant(kind).is_some(),
                "{kind} has no default variant"
            );
        }
    }

    #[test]
    fn from_tag_is_case_insensitive() {
        assert_eq!(SectionKind::from_tag("Hero"), Some(SectionKind::Hero));
        assert_eq!(SectionKind::from_tag("testimonials"), Some(SectionKind::Testimonials));
        assert_eq!(SectionKind::from_tag(" TEAM "), Some(SectionKind::Team));
        assert_eq!(SectionKind::from_tag("Pricing"), None);
    }

    #[test]
    fn known_variant_resolves_exactly() {
        let res = registry().resolve_renderer("Hero", Some("split")).unwrap();
        assert_eq!(res.template.kind, SectionKind::Hero);
        assert_eq!(res.template.variant, "split");
        assert!(!res.fell_back);
    }

    #[test]
    fn unknown_variant_falls_back_to_default() {
        let default = registry().default_variant(SectionKind::About).unwrap();
        let res = registry().resolve_renderer("About", Some("does-not-exist")).unwrap();
        assert_eq!(res.template.variant, default);
        assert!(res.fell_back);
    }

    #[test]
    fn absent_variant_falls_back_to_default() {
        let res = registry().resolve_renderer("Team", None).unwrap();
        assert_eq!(res.template.variant, registry().default_variant(SectionKind::Team).unwrap());
        assert!(res.fell_back);

        let res = registry().resolve_renderer("Team", Some("  ")).unwrap();
        assert!(res.fell_back);
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let err = registry().resolve_renderer("Pricing", Some("grid")).unwrap_err();
        assert_eq!(
            err,
            RegistryError::UnknownKind {
                component: "Pricing".to_string()
            }
        );
    }

    #[test]
    fn kind_without_variants_is_an_error() {
        let partial = TemplateRegistry::from_specs(crate::templates::catalog(SectionKind::Hero));
        assert!(partial.resolve_renderer("Hero", None).is_ok());
        let err = partial.resolve_renderer("Footer", None).unwrap_err();
        assert_eq!(err, RegistryError::NoVariants { kind: SectionKind::Footer });
    }

    #[test]
    fn first_registered_spec_is_default() {
        let specs = crate::templates::catalog(SectionKind::Hero);
        let registry = TemplateRegistry::from_specs(specs.iter().rev());
        assert_eq!(
            registry.default_variant(SectionKind::Hero),
            specs.last().map(|s| s.variant)
        );
    }

    #[test]
    fn variant_names_are_unique_per_kind() {
        for kind in SectionKind::ALL {
            let names: Vec<&str> = crate::templates::catalog(kind).iter().map(|s| s.variant).collect();
            let mut deduped = names.clone();
            deduped.sort_unstable();
            deduped.dedup();
            assert_eq!(names.len(), deduped.len(), "duplicate variant for {kind}");
        }
    }

    #[test]
    fn option_defaults_lie_inside_their_domain() {
        for kind in SectionKind::ALL {
            for spec in crate::templates::catalog(kind) {
                for opt in spec.options {
                    assert!(opt.min <= opt.default && opt.default <= opt.max);
                }
            }
        }
    }
}
