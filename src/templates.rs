//! Built-in section templates.
//!
//! Each template is a [`TemplateSpec`]: the fields it reads, the layout
//! options it accepts, and a maud renderer over a resolved [`RenderNode`].
//! Renderers never see raw site data; everything they receive has already
//! been localized, sanitized and had its asset tokens resolved.
//!
//! | Kind | Variants (default first) | Options |
//! |------|--------------------------|---------|
//! | Hero | centered, split, fullscreen | split: imageWidth 30–70 |
//! | About | split, stacked | split: imageWidth 20–80 |
//! | Services | grid, list | grid: columns 1–4 |
//! | Portfolio | grid, masonry | columns 2–4 / 2–5 |
//! | Team | cards, list | cards: columns 2–4 |
//! | Testimonials | cards, quote | cards: columns 1–3 |
//! | Contact | simple, split | split: imageWidth 30–70 |
//! | Footer | simple, columns | columns: columns 2–4 |
//!
//! Every rendered element carries a `data-element` attribute with its
//! element id so an editor can map clicks back to persisted content.

use crate::compose::{RenderNode, ResolvedElement, ResolvedValue};
use crate::registry::FieldKind::{Backdrop, Image, Link, RichText, Text};
use crate::registry::{FieldSpec, OptionKey, OptionSpec, SectionKind, TemplateSpec, field, option};
use maud::{Markup, PreEscaped, html};

/// Templates registered for `kind`. The first entry is the kind's default.
pub fn catalog(kind: SectionKind) -> &'static [TemplateSpec] {
    match kind {
        SectionKind::Hero => &HERO,
        SectionKind::About => &ABOUT,
        SectionKind::Services => &SERVICES,
        SectionKind::Portfolio => &PORTFOLIO,
        SectionKind::Team => &TEAM,
        SectionKind::Testimonials => &TESTIMONIALS,
        SectionKind::Contact => &CONTACT,
        SectionKind::Footer => &FOOTER,
    }
}

const NO_FIELDS: &[FieldSpec] = &[];
const NO_OPTIONS: &[OptionSpec] = &[];

// ============================================================================
// Catalog
// ============================================================================

const HERO_FIELDS: &[FieldSpec] = &[
    field("title", Text),
    field("subtitle", RichText),
    field("cta", Text),
    field("link", Link),
    field("image", Image),
    field("background", Backdrop),
];

static HERO: [TemplateSpec; 3] = [
    TemplateSpec {
        kind: SectionKind::Hero,
        variant: "centered",
        fields: HERO_FIELDS,
        item_fields: NO_FIELDS,
        options: NO_OPTIONS,
        render: hero_centered,
    },
    TemplateSpec {
        kind: SectionKind::Hero,
        variant: "split",
        fields: HERO_FIELDS,
        item_fields: NO_FIELDS,
        options: &[option(OptionKey::ImageWidth, 30, 70, 50)],
        render: hero_split,
    },
    TemplateSpec {
        kind: SectionKind::Hero,
        variant: "fullscreen",
        fields: HERO_FIELDS,
        item_fields: NO_FIELDS,
        options: NO_OPTIONS,
        render: hero_fullscreen,
    },
];

const ABOUT_FIELDS: &[FieldSpec] = &[
    field("title", Text),
    field("body", RichText),
    field("image", Image),
    field("background", Backdrop),
];

static ABOUT: [TemplateSpec; 2] = [
    TemplateSpec {
        kind: SectionKind::About,
        variant: "split",
        fields: ABOUT_FIELDS,
        item_fields: NO_FIELDS,
        options: &[option(OptionKey::ImageWidth, 20, 80, 40)],
        render: about_split,
    },
    TemplateSpec {
        kind: SectionKind::About,
        variant: "stacked",
        fields: ABOUT_FIELDS,
        item_fields: NO_FIELDS,
        options: NO_OPTIONS,
        render: about_stacked,
    },
];

const INTRO_FIELDS: &[FieldSpec] = &[
    field("title", Text),
    field("intro", RichText),
    field("background", Backdrop),
];

const SERVICE_ITEM: &[FieldSpec] = &[
    field("icon", Image),
    field("title", Text),
    field("description", RichText),
];

static SERVICES: [TemplateSpec; 2] = [
    TemplateSpec {
        kind: SectionKind::Services,
        variant: "grid",
        fields: INTRO_FIELDS,
        item_fields: SERVICE_ITEM,
        options: &[option(OptionKey::Columns, 1, 4, 3)],
        render: services_grid,
    },
    TemplateSpec {
        kind: SectionKind::Services,
        variant: "list",
        fields: INTRO_FIELDS,
        item_fields: SERVICE_ITEM,
        options: NO_OPTIONS,
        render: services_list,
    },
];

const PORTFOLIO_ITEM: &[FieldSpec] = &[
    field("image", Image),
    field("caption", Text),
    field("link", Link),
];

static PORTFOLIO: [TemplateSpec; 2] = [
    TemplateSpec {
        kind: SectionKind::Portfolio,
        variant: "grid",
        fields: INTRO_FIELDS,
        item_fields: PORTFOLIO_ITEM,
        options: &[option(OptionKey::Columns, 2, 4, 3)],
        render: portfolio_grid,
    },
    TemplateSpec {
        kind: SectionKind::Portfolio,
        variant: "masonry",
        fields: INTRO_FIELDS,
        item_fields: PORTFOLIO_ITEM,
        options: &[option(OptionKey::Columns, 2, 5, 3)],
        render: portfolio_masonry,
    },
];

const TEAM_ITEM: &[FieldSpec] = &[
    field("photo", Image),
    field("name", Text),
    field("role", Text),
    field("bio", RichText),
];

static TEAM: [TemplateSpec; 2] = [
    TemplateSpec {
        kind: SectionKind::Team,
        variant: "cards",
        fields: INTRO_FIELDS,
        item_fields: TEAM_ITEM,
        options: &[option(OptionKey::Columns, 2, 4, 4)],
        render: team_cards,
    },
    TemplateSpec {
        kind: SectionKind::Team,
        variant: "list",
        fields: INTRO_FIELDS,
        item_fields: TEAM_ITEM,
        options: NO_OPTIONS,
        render: team_list,
    },
];

const TESTIMONIAL_ITEM: &[FieldSpec] = &[
    field("quote", RichText),
    field("author", Text),
    field("role", Text),
    field("avatar", Image),
];

static TESTIMONIALS: [TemplateSpec; 2] = [
    TemplateSpec {
        kind: SectionKind::Testimonials,
        variant: "cards",
        fields: INTRO_FIELDS,
        item_fields: TESTIMONIAL_ITEM,
        options: &[option(OptionKey::Columns, 1, 3, 3)],
        render: testimonials_cards,
    },
    TemplateSpec {
        kind: SectionKind::Testimonials,
        variant: "quote",
        fields: INTRO_FIELDS,
        item_fields: TESTIMONIAL_ITEM,
        options: NO_OPTIONS,
        render: testimonials_quote,
    },
];

const CONTACT_FIELDS: &[FieldSpec] = &[
    field("title", Text),
    field("body", RichText),
    field("email", Text),
    field("phone", Text),
    field("address", Text),
    field("image", Image),
    field("background", Backdrop),
];

static CONTACT: [TemplateSpec; 2] = [
    TemplateSpec {
        kind: SectionKind::Contact,
        variant: "simple",
        fields: CONTACT_FIELDS,
        item_fields: NO_FIELDS,
        options: NO_OPTIONS,
        render: contact_simple,
    },
    TemplateSpec {
        kind: SectionKind::Contact,
        variant: "split",
        fields: CONTACT_FIELDS,
        item_fields: NO_FIELDS,
        options: &[option(OptionKey::ImageWidth, 30, 70, 50)],
        render: contact_split,
    },
];

const FOOTER_FIELDS: &[FieldSpec] = &[
    field("text", RichText),
    field("copyright", Text),
    field("background", Backdrop),
];

const FOOTER_ITEM: &[FieldSpec] = &[field("heading", Text), field("body", RichText)];

static FOOTER: [TemplateSpec; 2] = [
    TemplateSpec {
        kind: SectionKind::Footer,
        variant: "simple",
        fields: FOOTER_FIELDS,
        item_fields: NO_FIELDS,
        options: NO_OPTIONS,
        render: footer_simple,
    },
    TemplateSpec {
        kind: SectionKind::Footer,
        variant: "columns",
        fields: FOOTER_FIELDS,
        item_fields: FOOTER_ITEM,
        options: &[option(OptionKey::Columns, 2, 4, 3)],
        render: footer_columns,
    },
];

// ============================================================================
// Building blocks
// ============================================================================

fn key(node: &RenderNode, name: &str) -> String {
    format!("{}-{}", node.section_id, name)
}

fn item_key(node: &RenderNode, item: &str, name: &str) -> String {
    format!("{}-{}-{}", node.kind.slug(), item, name)
}

/// Outer `<section>`: anchor id, kind/variant classes, backdrop style and
/// layout options as CSS custom properties.
fn shell(node: &RenderNode, body: Markup) -> Markup {
    let mut style: Vec<String> = node.field("background").inline_style().into_iter().collect();
    if let Some(width) = node.option(OptionKey::ImageWidth) {
        style.push(format!("--image-width: {}%", width));
    }
    if let Some(columns) = node.option(OptionKey::Columns) {
        style.push(format!("--columns: {}", columns));
    }
    let style = (!style.is_empty()).then(|| style.join("; "));

    html! {
        section id=(node.section_id)
            class={ "section section-" (node.kind.slug()) " variant-" (node.variant) }
            style=[style] {
            (body)
        }
    }
}

/// Inline content: escaped text, sanitized markup, or an image.
fn inline(el: &ResolvedElement) -> Markup {
    html! {
        @match &el.value {
            ResolvedValue::Empty => {}
            ResolvedValue::Text(text) => { (text) }
            ResolvedValue::Html(markup) => { (PreEscaped(markup)) }
            ResolvedValue::Image(img) => {
                img src=(img.src) alt=(img.alt.as_deref().unwrap_or(""));
            }
        }
    }
}

fn heading(level: u8, el: &ResolvedElement, key: String) -> Markup {
    if el.is_empty() {
        return html! {};
    }
    let style = el.inline_style();
    html! {
        @match level {
            1 => { h1 data-element=(key) style=[style] { (inline(el)) } }
            2 => { h2 data-element=(key) style=[style] { (inline(el)) } }
            _ => { h3 data-element=(key) style=[style] { (inline(el)) } }
        }
    }
}

fn block(class: &str, el: &ResolvedElement, key: String) -> Markup {
    html! {
        @if !el.is_empty() {
            div class=(class) data-element=(key) style=[el.inline_style()] { (inline(el)) }
        }
    }
}

fn image(class: &str, el: &ResolvedElement, key: String) -> Markup {
    html! {
        @if let Some(img) = el.image() {
            img class=(class) data-element=(key) src=(img.src)
                alt=(img.alt.as_deref().unwrap_or("")) style=[el.inline_style()];
        }
    }
}

fn intro(node: &RenderNode) -> Markup {
    html! {
        (heading(2, node.field("title"), key(node, "title")))
        (block("section-intro", node.field("intro"), key(node, "intro")))
    }
}

fn hero_text(node: &RenderNode) -> Markup {
    let cta = node.field("cta");
    let href = match &node.field("link").value {
        ResolvedValue::Text(link) if !link.trim().is_empty() => link.trim().to_string(),
        _ => "#contact".to_string(),
    };
    html! {
        (heading(1, node.field("title"), key(node, "title")))
        (block("hero-subtitle", node.field("subtitle"), key(node, "subtitle")))
        @if !cta.is_empty() {
            a.button.hero-cta href=(href) data-element=(key(node, "cta")) style=[cta.inline_style()] {
                (inline(cta))
            }
        }
    }
}

// ============================================================================
// Renderers
// ============================================================================

fn hero_centered(node: &RenderNode) -> Markup {
    shell(node, html! {
        div.hero-inner {
            (hero_text(node))
            (image("hero-image", node.field("image"), key(node, "image")))
        }
    })
}

fn hero_split(node: &RenderNode) -> Markup {
    shell(node, html! {
        div.split {
            div.split-text { (hero_text(node)) }
            div.split-media { (image("hero-image", node.field("image"), key(node, "image"))) }
        }
    })
}

fn hero_fullscreen(node: &RenderNode) -> Markup {
    shell(node, html! {
        div.hero-inner.hero-fullscreen {
            (hero_text(node))
        }
    })
}

fn about_split(node: &RenderNode) -> Markup {
    shell(node, html! {
        div.split {
            div.split-text {
                (heading(2, node.field("title"), key(node, "title")))
                (block("about-body", node.field("body"), key(node, "body")))
            }
            div.split-media { (image("about-image", node.field("image"), key(node, "image"))) }
        }
    })
}

fn about_stacked(node: &RenderNode) -> Markup {
    shell(node, html! {
        (heading(2, node.field("title"), key(node, "title")))
        (image("about-image", node.field("image"), key(node, "image")))
        (block("about-body", node.field("body"), key(node, "body")))
    })
}

fn service_item(node: &RenderNode, item: &str) -> Markup {
    html! {
        (image("service-icon", node.item_field(item, "icon"), item_key(node, item, "icon")))
        (heading(3, node.item_field(item, "title"), item_key(node, item, "title")))
        (block("service-description", node.item_field(item, "description"), item_key(node, item, "description")))
    }
}

fn services_grid(node: &RenderNode) -> Markup {
    shell(node, html! {
        (intro(node))
        div.grid {
            @for item in &node.items {
                article.card { (service_item(node, item)) }
            }
        }
    })
}

fn services_list(node: &RenderNode) -> Markup {
    shell(node, html! {
        (intro(node))
        ul.item-list {
            @for item in &node.items {
                li { (service_item(node, item)) }
            }
        }
    })
}

fn portfolio_entry(node: &RenderNode, item: &str) -> Markup {
    let link = match &node.item_field(item, "link").value {
        ResolvedValue::Text(link) if !link.trim().is_empty() => Some(link.trim().to_string()),
        _ => None,
    };
    let body = html! {
        (image("portfolio-image", node.item_field(item, "image"), item_key(node, item, "image")))
        @let caption = node.item_field(item, "caption");
        @if !caption.is_empty() {
            figcaption data-element=(item_key(node, item, "caption")) { (inline(caption)) }
        }
    };
    html! {
        figure.portfolio-item {
            @if let Some(href) = link {
                a href=(href) { (body) }
            } @else {
                (body)
            }
        }
    }
}

fn portfolio_grid(node: &RenderNode) -> Markup {
    shell(node, html! {
        (intro(node))
        div.grid {
            @for item in &node.items { (portfolio_entry(node, item)) }
        }
    })
}

fn portfolio_masonry(node: &RenderNode) -> Markup {
    shell(node, html! {
        (intro(node))
        div.masonry {
            @for item in &node.items { (portfolio_entry(node, item)) }
        }
    })
}

fn team_member(node: &RenderNode, item: &str) -> Markup {
    html! {
        (image("team-photo", node.item_field(item, "photo"), item_key(node, item, "photo")))
        (heading(3, node.item_field(item, "name"), item_key(node, item, "name")))
        (block("team-role", node.item_field(item, "role"), item_key(node, item, "role")))
        (block("team-bio", node.item_field(item, "bio"), item_key(node, item, "bio")))
    }
}

fn team_cards(node: &RenderNode) -> Markup {
    shell(node, html! {
        (intro(node))
        div.grid {
            @for item in &node.items {
                article.card { (team_member(node, item)) }
            }
        }
    })
}

fn team_list(node: &RenderNode) -> Markup {
    shell(node, html! {
        (intro(node))
        ul.item-list {
            @for item in &node.items {
                li { (team_member(node, item)) }
            }
        }
    })
}

fn testimonial(node: &RenderNode, item: &str) -> Markup {
    let quote = node.item_field(item, "quote");
    html! {
        @if !quote.is_empty() {
            blockquote data-element=(item_key(node, item, "quote")) { (inline(quote)) }
        }
        div.testimonial-author {
            (image("testimonial-avatar", node.item_field(item, "avatar"), item_key(node, item, "avatar")))
            (block("testimonial-name", node.item_field(item, "author"), item_key(node, item, "author")))
            (block("testimonial-role", node.item_field(item, "role"), item_key(node, item, "role")))
        }
    }
}

fn testimonials_cards(node: &RenderNode) -> Markup {
    shell(node, html! {
        (intro(node))
        div.grid {
            @for item in &node.items {
                article.card { (testimonial(node, item)) }
            }
        }
    })
}

/// One large quote at a time; the rest follow in document order.
fn testimonials_quote(node: &RenderNode) -> Markup {
    shell(node, html! {
        (intro(node))
        div.quote-stack {
            @for item in &node.items {
                div.quote-slide { (testimonial(node, item)) }
            }
        }
    })
}

fn contact_details(node: &RenderNode) -> Markup {
    let email = node.field("email");
    let phone = node.field("phone");
    html! {
        (heading(2, node.field("title"), key(node, "title")))
        (block("contact-body", node.field("body"), key(node, "body")))
        ul.contact-details {
            @if let ResolvedValue::Text(address) = &email.value {
                @if !email.is_empty() {
                    li { a href={ "mailto:" (address.trim()) } data-element=(key(node, "email")) { (address) } }
                }
            }
            @if let ResolvedValue::Text(number) = &phone.value {
                @if !phone.is_empty() {
                    li { a href={ "tel:" (number.replace(' ', "")) } data-element=(key(node, "phone")) { (number) } }
                }
            }
            @let address = node.field("address");
            @if !address.is_empty() {
                li data-element=(key(node, "address")) { (inline(address)) }
            }
        }
    }
}

fn contact_simple(node: &RenderNode) -> Markup {
    shell(node, html! {
        div.contact-inner { (contact_details(node)) }
    })
}

fn contact_split(node: &RenderNode) -> Markup {
    shell(node, html! {
        div.split {
            div.split-text { (contact_details(node)) }
            div.split-media { (image("contact-image", node.field("image"), key(node, "image"))) }
        }
    })
}

fn footer_bottom(node: &RenderNode) -> Markup {
    html! {
        (block("footer-text", node.field("text"), key(node, "text")))
        (block("footer-copyright", node.field("copyright"), key(node, "copyright")))
    }
}

fn footer_simple(node: &RenderNode) -> Markup {
    shell(node, html! {
        footer.site-footer { (footer_bottom(node)) }
    })
}

fn footer_columns(node: &RenderNode) -> Markup {
    shell(node, html! {
        footer.site-footer {
            div.grid {
                @for item in &node.items {
                    div.footer-column {
                        (heading(3, node.item_field(item, "heading"), item_key(node, item, "heading")))
                        (block("footer-column-body", node.item_field(item, "body"), item_key(node, item, "body")))
                    }
                }
            }
            (footer_bottom(node))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::NoImages;
    use crate::compose::compose;
    use crate::content::{ElementContent, StyleDeclarations};
    use crate::test_helpers::*;

    fn render_one(site: &crate::site::SiteConfig) -> String {
        let out = compose(site, &english(), &NoImages);
        let node = &out.nodes[0];
        let spec = crate::registry::registry().get(node.kind, node.variant).unwrap();
        (spec.render)(node).into_string()
    }

    #[test]
    fn every_kind_has_at_least_one_template() {
        for kind in SectionKind::ALL {
            assert!(!catalog(kind).is_empty(), "{kind} has no templates");
            assert!(catalog(kind).iter().all(|spec| spec.kind == kind));
        }
    }

    #[test]
    fn every_template_renders_an_empty_section() {
        for kind in SectionKind::ALL {
            for spec in catalog(kind) {
                let site = SiteBuilder::new()
                    .section_with_template("s", kind.tag(), spec.variant)
                    .order(&["s"])
                    .build();
                let html = render_one(&site);
                assert!(html.starts_with("<section id=\"s\""), "{kind}/{}: {html}", spec.variant);
            }
        }
    }

    #[test]
    fn hero_renders_title_escaped() {
        let site = SiteBuilder::new()
            .section("hero", "Hero")
            .element("hero", "hero-title", ElementContent::text("en", "Fish & <Chips>"))
            .order(&["hero"])
            .build();
        let html = render_one(&site);
        assert!(html.contains(r#"<h1 data-element="hero-title">Fish &amp; &lt;Chips&gt;</h1>"#));
    }

    #[test]
    fn rich_text_is_emitted_as_markup() {
        let site = SiteBuilder::new()
            .section("about", "About")
            .element("about", "about-body", ElementContent::text("en", "<p>Hi <em>there</em></p>"))
            .order(&["about"])
            .build();
        let html = render_one(&site);
        assert!(html.contains("<p>Hi <em>there</em></p>"));
    }

    #[test]
    fn empty_elements_are_omitted() {
        let site = SiteBuilder::new().section("hero", "Hero").order(&["hero"]).build();
        let html = render_one(&site);
        assert!(!html.contains("<h1"));
        assert!(!html.contains("hero-cta"));
    }

    #[test]
    fn layout_options_become_custom_properties() {
        let site = SiteBuilder::new()
            .section_with_layout("about", "About", serde_json::json!({"template": "split", "imageWidth": 60}))
            .order(&["about"])
            .build();
        let html = render_one(&site);
        assert!(html.contains("--image-width: 60%"));
        assert!(html.contains("variant-split"));
    }

    #[test]
    fn backdrop_style_lands_on_section() {
        let site = SiteBuilder::new()
            .section("hero", "Hero")
            .element(
                "hero",
                "hero-background",
                ElementContent::default().with_style(StyleDeclarations::new().with("background", "#123456")),
            )
            .order(&["hero"])
            .build();
        let html = render_one(&site);
        assert!(html.contains(r#"style="background: #123456""#));
    }

    #[test]
    fn team_items_render_in_order() {
        let site = SiteBuilder::new()
            .section("team", "Team")
            .items("team", &["b", "a"])
            .element("team", "team-a-name", ElementContent::text("en", "Alice"))
            .element("team", "team-b-name", ElementContent::text("en", "Bob"))
            .order(&["team"])
            .build();
        let html = render_one(&site);
        let bob = html.find("Bob").unwrap();
        let alice = html.find("Alice").unwrap();
        assert!(bob < alice);
        assert!(html.contains(r#"data-element="team-a-name""#));
    }

    #[test]
    fn contact_links_use_safe_schemes() {
        let site = SiteBuilder::new()
            .section("contact", "Contact")
            .element("contact", "contact-email", ElementContent::text("en", "hi@example.com"))
            .element("contact", "contact-phone", ElementContent::text("en", "+1 555 0100"))
            .order(&["contact"])
            .build();
        let html = render_one(&site);
        assert!(html.contains(r#"href="mailto:hi@example.com""#));
        assert!(html.contains(r#"href="tel:+15550100""#));
    }

    #[test]
    fn script_links_never_reach_href() {
        let site = SiteBuilder::new()
            .section("hero", "Hero")
            .element("hero", "hero-cta", ElementContent::text("en", "Go"))
            .element("hero", "hero-link", ElementContent::text("en", "javascript:alert(document.cookie)"))
            .order(&["hero"])
            .build();
        let html = render_one(&site);
        assert!(!html.contains("javascript:"));
        assert!(html.contains(r##"href="#contact""##));

        let site = SiteBuilder::new()
            .section("work", "Portfolio")
            .items("work", &["1", "2"])
            .element("work", "portfolio-1-caption", ElementContent::text("en", "Bad"))
            .element("work", "portfolio-1-link", ElementContent::text("en", "JaVa&#115;cript:alert(1)"))
            .element("work", "portfolio-2-link", ElementContent::text("en", "https://example.com/case"))
            .order(&["work"])
            .build();
        let html = render_one(&site);
        assert!(!html.contains("cript:"));
        assert_eq!(html.matches("<a ").count(), 1);
        assert!(html.contains(r#"<a href="https://example.com/case">"#));
    }
}
