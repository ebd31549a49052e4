//! Shared test utilities.
//!
//! Builders for site documents and language contexts, plus lookups that
//! panic with a clear message on miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = SiteBuilder::new()
//!     .section("hero", "Hero")
//!     .element("hero", "hero-title", ElementContent::text("en", "Welcome"))
//!     .order(&["hero"])
//!     .build();
//!
//! let out = compose(&site, &english(), &NoImages);
//! assert_eq!(node_ids(&out), ["hero"]);
//! ```

use crate::compose::{Composition, RenderNode};
use crate::content::ElementContent;
use crate::language::{Language, LanguageContext};
use crate::site::{Layout, SectionDescriptor, SiteConfig};

// =========================================================================
// Language contexts
// =========================================================================

fn bilingual(current: &str) -> LanguageContext {
    let en = Language::new("en").unwrap();
    let ar = Language::new("ar").unwrap();
    LanguageContext::new(Language::new(current).unwrap(), en.clone())
        .with_supported(vec![en, ar.clone()])
        .with_rtl(vec![ar])
}

/// English current, English default, Arabic supported and RTL.
pub fn english() -> LanguageContext {
    bilingual("en")
}

/// Arabic current, English default.
pub fn arabic() -> LanguageContext {
    bilingual("ar")
}

// =========================================================================
// Site documents
// =========================================================================

/// Fluent builder for [`SiteConfig`]. Element and item calls on a section
/// that was not added first panic.
#[derive(Debug, Default)]
pub struct SiteBuilder {
    site: SiteConfig,
}

impl SiteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(mut self, id: &str, component: &str) -> Self {
        self.site
            .sections
            .insert(id.to_string(), SectionDescriptor::new(component));
        self
    }

    pub fn section_with_template(self, id: &str, component: &str, template: &str) -> Self {
        self.section_with_layout(id, component, serde_json::json!({ "template": template }))
    }

    /// `layout` is the persisted JSON shape, e.g. `{"template": "split", "imageWidth": 40}`.
    pub fn section_with_layout(mut self, id: &str, component: &str, layout: serde_json::Value) -> Self {
        let layout: Layout = serde_json::from_value(layout).unwrap();
        let mut desc = SectionDescriptor::new(component);
        desc.layout = Some(layout);
        self.site.sections.insert(id.to_string(), desc);
        self
    }

    pub fn element(mut self, section: &str, element: &str, content: ElementContent) -> Self {
        self.descriptor(section)
            .elements
            .insert(element.to_string(), content);
        self
    }

    pub fn items(mut self, section: &str, items: &[&str]) -> Self {
        self.descriptor(section).items = items.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn order(mut self, ids: &[&str]) -> Self {
        self.site.section_order = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn build(self) -> SiteConfig {
        self.site
    }

    fn descriptor(&mut self, section: &str) -> &mut SectionDescriptor {
        let known: Vec<String> = self.site.sections.keys().cloned().collect();
        self.site
            .sections
            .get_mut(section)
            .unwrap_or_else(|| panic!("section '{section}' not added. Available: {known:?}"))
    }
}

/// A small bilingual landing page: hero, about, team (two members), footer.
pub fn sample_site() -> SiteConfig {
    SiteBuilder::new()
        .section_with_layout("hero", "Hero", serde_json::json!({ "template": "split", "imageWidth": 45 }))
        .element(
            "hero",
            "hero-title",
            ElementContent::text("en", "Welcome").with_text("ar", "أهلا وسهلا"),
        )
        .element("hero", "hero-subtitle", ElementContent::text("en", "<p>We build <b>things</b></p>"))
        .section("about", "About")
        .element("about", "about-title", ElementContent::text("en", "About us"))
        .section("team", "Team")
        .items("team", &["1", "2"])
        .element("team", "team-1-name", ElementContent::text("en", "Ada"))
        .element("team", "team-2-name", ElementContent::text("en", "Grace").with_text("ar", "غريس"))
        .section("footer", "Footer")
        .element("footer", "footer-copyright", ElementContent::text("en", "© 2026"))
        .order(&["hero", "about", "team", "footer"])
        .build()
}

// =========================================================================
// Composition lookups
// =========================================================================

/// Section ids of the emitted nodes, in order.
pub fn node_ids(out: &Composition) -> Vec<&str> {
    out.nodes.iter().map(|n| n.section_id.as_str()).collect()
}

/// Find a node by section id. Panics if not found.
pub fn find_node<'a>(out: &'a Composition, section_id: &str) -> &'a RenderNode {
    out.node(section_id).unwrap_or_else(|| {
        let ids = node_ids(out);
        panic!("node '{section_id}' not found. Available: {ids:?}")
    })
}
