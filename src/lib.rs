//! # Pagewright
//!
//! A composition engine for multilingual landing pages. A site document
//! lists sections in order; each section names a component kind, an optional
//! template variant and per-language content for its elements. Pagewright
//! turns that document into a page in one language.
//!
//! # Architecture: Compose, Then Render
//!
//! ```text
//! site.json + images/ + language
//!        │
//!        ▼
//! 1. Compose   SiteConfig  →  Composition   (pure: resolve content, assets,
//!                                            templates and layout per section)
//! 2. Render    Composition →  HTML          (maud, one renderer per variant)
//! ```
//!
//! Composition does no I/O. It reads a [`site::SiteConfig`], an
//! [`asset::ImageLookup`] snapshot and a [`language::LanguageContext`], and
//! returns plain data: one [`compose::RenderNode`] per renderable section plus
//! a record of the sections it skipped. Rendering is a function of that data,
//! so the composition alone decides what reaches the page and is what the
//! render cache fingerprints.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`site`] | Site document model, file-backed loading, immutable edit patches |
//! | [`content`] | Localized element content, formats, style declarations |
//! | [`language`] | Language codes, text direction, current-language state and its persistence |
//! | [`naming`] | Element id convention (`{section}-{field}`, `{kind}-{item}-{field}`) |
//! | [`asset`] | `local-img-*` token resolution against an image lookup |
//! | [`store`] | Directory-backed image store producing `data:` URIs |
//! | [`sanitize`] | Allowlist HTML sanitizer for rich-text content |
//! | [`registry`] | Section kinds, template specs, variant resolution with fallback |
//! | [`templates`] | Built-in maud renderers for every kind and variant |
//! | [`compose`] | The section composer: site document → render nodes |
//! | [`page`] | Full HTML document around a composition |
//! | [`cache`] | Render manifest and write-if-changed output |
//! | [`config`] | `pagewright.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## A Closed Set of Section Kinds
//!
//! Component kinds are an enum ([`registry::SectionKind`]) and every kind has
//! a built-in catalog of variants. Adding a kind is a compile error until it
//! has templates, so a registry lookup can only fail on data (an unknown tag
//! or variant name), never on a missing renderer.
//!
//! ## Degrade, Don't Fail
//!
//! A bad section never takes the page down. Unknown ids and unknown kinds are
//! skipped and recorded; an unknown variant falls back to the kind's default
//! and records what was asked for; out-of-range layout options are clamped;
//! missing translations fall back to the default language, then to empty.
//! `pagewright check` reports each of these so they can be fixed at the
//! source.
//!
//! ## Sanitize, Then Let Maud Escape
//!
//! Rich text is the only content rendered unescaped, and it passes through
//! [`sanitize`] first. Everything else is interpolated by maud and escaped.
//! Asset tokens are substituted before either step, so a resolved `data:` URI
//! is subject to the same rules as any other URL.
//!
//! ## Immutable Edits
//!
//! [`site::SitePatch::apply`] returns a new document and leaves its input
//! untouched. Callers keep the old value for undo or diffing, and the
//! composer never sees a half-applied edit.

pub mod asset;
pub mod cache;
pub mod compose;
pub mod config;
pub mod content;
pub mod language;
pub mod naming;
pub mod output;
pub mod page;
pub mod registry;
pub mod sanitize;
pub mod site;
pub mod store;
pub mod templates;

#[cfg(test)]
pub(crate) mod test_helpers;
