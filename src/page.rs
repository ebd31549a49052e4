//! Full-page rendering.
//!
//! Wraps a [`Composition`] in an HTML5 document. Each [`RenderNode`] is
//! dispatched to the renderer recorded for its `(kind, variant)` in the
//! template registry; the document's `lang` and `dir` come from the
//! composition's language.
//!
//! ```text
//! <!DOCTYPE html>
//! <html lang="ar" dir="rtl">
//!   <head> title, inline page.css, optional extra stylesheet,
//!          hreflang alternates </head>
//!   <body>
//!     <nav class="lang-switch"> ... </nav>   (only with alternates)
//!     <main> section, section, ... </main>
//!   </body>
//! </html>
//! ```
//!
//! Base styles are embedded at compile time from `static/page.css`.

use crate::compose::{Composition, RenderNode};
use crate::config::PageConfig;
use crate::language::Language;
use crate::registry::{TemplateRegistry, registry};
use maud::{DOCTYPE, Markup, PreEscaped, html};

const CSS_STATIC: &str = include_str!("../static/page.css");

/// A link to the same page in another language.
#[derive(Debug, Clone, PartialEq)]
pub struct Alternate {
    pub language: Language,
    pub href: String,
}

/// Document-level settings that are not part of the composition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageOptions {
    pub title: String,
    /// Extra stylesheet linked after the built-in styles.
    pub stylesheet: Option<String>,
    /// Language switcher entries, current language included.
    pub alternates: Vec<Alternate>,
}

impl PageOptions {
    pub fn from_config(config: &PageConfig) -> Self {
        Self {
            title: config.title.clone(),
            stylesheet: Some(config.stylesheet.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            alternates: Vec::new(),
        }
    }

    pub fn with_alternates(mut self, alternates: Vec<Alternate>) -> Self {
        self.alternates = alternates;
        self
    }

    /// Strings that change the rendered document; fed to the cache fingerprint.
    pub fn cache_params(&self) -> Vec<&str> {
        let mut params = vec![self.title.as_str(), self.stylesheet.as_deref().unwrap_or("")];
        for alt in &self.alternates {
            params.push(alt.language.as_str());
            params.push(&alt.href);
        }
        params
    }
}

/// Render with the built-in template registry.
pub fn render_page(composition: &Composition, options: &PageOptions) -> Markup {
    render_page_with(composition, registry(), options)
}

pub fn render_page_with(
    composition: &Composition,
    registry: &TemplateRegistry,
    options: &PageOptions,
) -> Markup {
    let content = html! {
        @if !options.alternates.is_empty() {
            (language_switch(&composition.language, &options.alternates))
        }
        main {
            @for node in &composition.nodes {
                (render_node(node, registry))
            }
        }
    };
    base_document(composition, options, content)
}

/// Render a single node through its registered renderer.
///
/// A node whose `(kind, variant)` is not in `registry` renders as nothing;
/// that only happens when a composition is paired with a different registry
/// than the one that produced it.
pub fn render_node(node: &RenderNode, registry: &TemplateRegistry) -> Markup {
    match registry.get(node.kind, node.variant) {
        Some(spec) => (spec.render)(node),
        None => {
            log::warn!(
                "no renderer for {}/{} (section {:?})",
                node.kind,
                node.variant,
                node.section_id
            );
            html! {}
        }
    }
}

fn base_document(composition: &Composition, options: &PageOptions, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(composition.language.as_str()) dir=(composition.direction.as_str()) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (options.title) }
                style { (PreEscaped(CSS_STATIC)) }
                @if let Some(href) = &options.stylesheet {
                    link rel="stylesheet" href=(href);
                }
                @for alt in &options.alternates {
                    link rel="alternate" hreflang=(alt.language.as_str()) href=(alt.href);
                }
            }
            body {
                (content)
            }
        }
    }
}

fn language_switch(current: &Language, alternates: &[Alternate]) -> Markup {
    html! {
        nav.lang-switch {
            @for alt in alternates {
                @let is_current = &alt.language == current;
                a href=(alt.href) hreflang=(alt.language.as_str()) lang=(alt.language.as_str())
                    aria-current=[is_current.then_some("page")] {
                    (alt.language.as_str().to_uppercase())
                }
            }
        }
    }
}
