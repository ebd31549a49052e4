//! Localized content cells.
//!
//! An element's content is a map from language code to value. Resolution is a
//! pure lookup with a single fallback step:
//!
//! ```text
//! content[current]   (if present and non-empty)
//!   → content[default]
//!   → ContentValue::Empty
//! ```
//!
//! Missing content never fails composition; the worst case is the empty
//! sentinel, which templates render as nothing.

use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An image reference stored as element content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// One language's value of an element.
///
/// JSON shape: `null`, a string, or `{ "src": ..., "alt": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentValue {
    #[default]
    Empty,
    Text(String),
    Image(ImageRef),
}

/// The resolution result for a missing cell.
pub static EMPTY: ContentValue = ContentValue::Empty;

impl ContentValue {
    /// Whether this value counts as "no content" for fallback purposes.
    pub fn is_empty(&self) -> bool {
        match self {
            ContentValue::Empty => true,
            ContentValue::Text(s) => s.trim().is_empty(),
            ContentValue::Image(img) => img.src.trim().is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageRef> {
        match self {
            ContentValue::Image(img) => Some(img),
            _ => None,
        }
    }
}

/// A value keyed by language code.
///
/// Keys that parse as language codes are stored in canonical case, so a
/// document keyed `"EN"` or `"pt-br"` matches `en` and `pt-BR`. Keys that do
/// not parse are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, ContentValue>",
    into = "BTreeMap<String, ContentValue>"
)]
pub struct LocalizedContent(BTreeMap<String, ContentValue>);

fn canonical_key(code: &str) -> String {
    Language::new(code)
        .map(String::from)
        .unwrap_or_else(|_| code.to_string())
}

impl From<BTreeMap<String, ContentValue>> for LocalizedContent {
    fn from(cells: BTreeMap<String, ContentValue>) -> Self {
        let mut content = Self::new();
        for (lang, value) in cells {
            content.set(&lang, value);
        }
        content
    }
}

impl From<LocalizedContent> for BTreeMap<String, ContentValue> {
    fn from(content: LocalizedContent) -> Self {
        content.0
    }
}

impl LocalizedContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, lang: &str, value: ContentValue) -> Self {
        self.set(lang, value);
        self
    }

    pub fn set(&mut self, lang: &str, value: ContentValue) {
        self.0.insert(canonical_key(lang), value);
    }

    pub fn get(&self, lang: &str) -> Option<&ContentValue> {
        self.0.get(&canonical_key(lang))
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Resolve the value for `language`, falling back to `default`.
    ///
    /// The requested language must hold a non-empty value to win. The default
    /// language is returned whenever it is present, even if empty; only a
    /// cell with neither yields [`EMPTY`].
    pub fn resolve(&self, language: &Language, default: &Language) -> &ContentValue {
        if let Some(value) = self.0.get(language.as_str()).filter(|v| !v.is_empty()) {
            return value;
        }
        self.0.get(default.as_str()).unwrap_or(&EMPTY)
    }
}

/// How a text value should be interpreted when it reaches a rich-text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    /// Editor-authored markup; sanitized before display.
    #[default]
    Html,
    /// Markdown; converted to HTML, then sanitized.
    Markdown,
    /// Plain text; escaped at render time, never parsed as markup.
    Text,
}

/// Inline style declarations (`property → value`).
///
/// Ordered so serialization and inline `style` attributes are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleDeclarations(BTreeMap<String, String>);

impl StyleDeclarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, property: &str, value: &str) -> Self {
        self.set(property, value);
        self
    }

    pub fn set(&mut self, property: &str, value: &str) {
        self.0.insert(property.to_string(), value.to_string());
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.0.get(property).map(String::as_str)
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        self.0.remove(property)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as an inline `style` attribute value: `a: 1; b: 2`.
    pub fn to_inline(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Persisted content of one element.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementContent {
    #[serde(default)]
    pub content: LocalizedContent,
    #[serde(default, skip_serializing_if = "StyleDeclarations::is_empty")]
    pub style: StyleDeclarations,
    #[serde(default)]
    pub format: ContentFormat,
}

impl ElementContent {
    pub fn text(lang: &str, value: &str) -> Self {
        Self {
            content: LocalizedContent::new().with(lang, ContentValue::Text(value.to_string())),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, lang: &str, value: &str) -> Self {
        self.content.set(lang, ContentValue::Text(value.to_string()));
        self
    }

    pub fn with_style(mut self, style: StyleDeclarations) -> Self {
        self.style = style;
        self
    }

    pub fn with_format(mut self, format: ContentFormat) -> Self {
        self.format = format;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang(code: &str) -> Language {
        Language::new(code).unwrap()
    }

    fn text(s: &str) -> ContentValue {
        ContentValue::Text(s.to_string())
    }

    #[test]
    fn resolve_prefers_requested_language() {
        let cell = LocalizedContent::new()
            .with("en", text("Hello"))
            .with("ar", text("مرحبا"));
        assert_eq!(cell.resolve(&lang("ar"), &lang("en")), &text("مرحبا"));
    }

    #[test]
    fn resolve_falls_back_to_default_language() {
        let cell = LocalizedContent::new().with("en", text("Hello"));
        assert_eq!(cell.resolve(&lang("fr"), &lang("en")), &text("Hello"));
    }

    #[test]
    fn resolve_falls_back_when_requested_is_blank() {
        let cell = LocalizedContent::new()
            .with("en", text("Hello"))
            .with("ar", text("   "));
        assert_eq!(cell.resolve(&lang("ar"), &lang("en")), &text("Hello"));
    }

    #[test]
    fn resolve_missing_everywhere_is_empty_sentinel() {
        let cell = LocalizedContent::new().with("de", text("Hallo"));
        assert_eq!(cell.resolve(&lang("ar"), &lang("en")), &ContentValue::Empty);
        assert_eq!(
            LocalizedContent::new().resolve(&lang("en"), &lang("en")),
            &ContentValue::Empty
        );
    }

    #[test]
    fn content_value_json_shapes() {
        let cell: LocalizedContent = serde_json::from_str(
            r#"{"en": "Title", "ar": null, "img": {"src": "local-img-1", "alt": "Logo"}}"#,
        )
        .unwrap();
        assert_eq!(cell.get("en"), Some(&text("Title")));
        assert_eq!(cell.get("ar"), Some(&ContentValue::Empty));
        assert_eq!(
            cell.get("img").and_then(ContentValue::as_image),
            Some(&ImageRef {
                src: "local-img-1".to_string(),
                alt: Some("Logo".to_string()),
            })
        );
    }

    #[test]
    fn image_with_empty_src_is_empty() {
        let img = ContentValue::Image(ImageRef {
            src: String::new(),
            alt: None,
        });
        assert!(img.is_empty());
    }

    #[test]
    fn element_content_defaults() {
        let el: ElementContent = serde_json::from_str(r#"{"content": {"en": "x"}}"#).unwrap();
        assert_eq!(el.format, ContentFormat::Html);
        assert!(el.style.is_empty());
    }

    #[test]
    fn element_content_parses_style_and_format() {
        let el: ElementContent = serde_json::from_str(
            r#"{"content": {}, "style": {"color": "red", "background": "url(x)"}, "format": "markdown"}"#,
        )
        .unwrap();
        assert_eq!(el.format, ContentFormat::Markdown);
        assert_eq!(el.style.get("color"), Some("red"));
        assert_eq!(el.style.to_inline(), "background: url(x); color: red");
    }

    #[test]
    fn language_keys_match_regardless_of_case() {
        let cell: LocalizedContent =
            serde_json::from_str(r#"{"EN": "Hello", "pt-br": "Olá", "x y": "kept"}"#).unwrap();
        assert_eq!(cell.resolve(&lang("en"), &lang("ar")), &text("Hello"));
        assert_eq!(cell.resolve(&lang("pt-BR"), &lang("en")), &text("Olá"));
        assert_eq!(cell.get("PT-BR"), Some(&text("Olá")));
        assert_eq!(cell.get("x y"), Some(&text("kept")));
        assert_eq!(
            serde_json::to_value(&cell).unwrap(),
            serde_json::json!({"en": "Hello", "pt-BR": "Olá", "x y": "kept"})
        );
    }
}
