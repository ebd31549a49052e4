//! Asset token resolution.
//!
//! Editors reference locally stored images through opaque tokens of the form
//! `local-img-<id>`. Tokens show up in two places:
//!
//! - inside a style declaration's `background` value, wrapped in `url(...)`:
//!   `background: url('local-img-abc') center / cover`
//! - as the bare `src` of an image content value: `local-img-abc`
//!
//! Resolution is a textual substitution of the token (not the `url(...)`
//! wrapper) with the source returned by the image store. Everything else in
//! the value (quotes, gradients, other layers) is preserved byte for byte.
//!
//! Only the first token in a `background` value is substituted. A miss leaves
//! the value untouched, so a broken image is visible rather than silently
//! dropping the whole declaration.

use crate::content::{ImageRef, StyleDeclarations};
use regex::Regex;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

/// Prefix identifying a local asset token.
pub const TOKEN_PREFIX: &str = "local-img-";

/// The only style property scanned for tokens.
pub const BACKGROUND: &str = "background";

/// `url(` + optional quote + token + optional quote + `)`.
/// Group 1 is the whole token, group 2 the id after the prefix.
static URL_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*['"]?(local-img-([^'"()\s]+))['"]?\s*\)"#)
        .expect("asset token pattern is valid")
});

/// Synchronous lookup into a resident image store snapshot.
pub trait ImageLookup {
    /// The displayable source for a token id (the part after `local-img-`).
    fn lookup(&self, id: &str) -> Option<&str>;
}

impl ImageLookup for HashMap<String, String> {
    fn lookup(&self, id: &str) -> Option<&str> {
        self.get(id).map(String::as_str)
    }
}

impl ImageLookup for BTreeMap<String, String> {
    fn lookup(&self, id: &str) -> Option<&str> {
        self.get(id).map(String::as_str)
    }
}

/// An image store with nothing in it. Every token stays literal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImages;

impl ImageLookup for NoImages {
    fn lookup(&self, _id: &str) -> Option<&str> {
        None
    }
}

/// Resolve the first asset token of a `background` value.
pub fn resolve_background<'a>(value: &'a str, images: &dyn ImageLookup) -> Cow<'a, str> {
    let Some(caps) = URL_TOKEN.captures(value) else {
        return Cow::Borrowed(value);
    };
    let (Some(token), Some(id)) = (caps.get(1), caps.get(2)) else {
        return Cow::Borrowed(value);
    };
    match images.lookup(id.as_str()) {
        Some(source) => {
            let mut out = String::with_capacity(value.len() - token.len() + source.len());
            out.push_str(&value[..token.start()]);
            out.push_str(source);
            out.push_str(&value[token.end()..]);
            Cow::Owned(out)
        }
        None => {
            log::debug!("unresolved asset token {}", token.as_str());
            Cow::Borrowed(value)
        }
    }
}

/// Resolve the asset token in a declaration set's `background` value.
///
/// Returns the input borrowed when nothing changed.
pub fn resolve_asset_tokens<'a>(
    styles: &'a StyleDeclarations,
    images: &dyn ImageLookup,
) -> Cow<'a, StyleDeclarations> {
    let Some(background) = styles.get(BACKGROUND) else {
        return Cow::Borrowed(styles);
    };
    match resolve_background(background, images) {
        Cow::Borrowed(_) => Cow::Borrowed(styles),
        Cow::Owned(resolved) => {
            let mut out = styles.clone();
            out.set(BACKGROUND, &resolved);
            Cow::Owned(out)
        }
    }
}

/// Resolve an image value whose `src` is a bare token.
pub fn resolve_image_source<'a>(image: &'a ImageRef, images: &dyn ImageLookup) -> Cow<'a, ImageRef> {
    let Some(id) = image.src.trim().strip_prefix(TOKEN_PREFIX) else {
        return Cow::Borrowed(image);
    };
    match images.lookup(id) {
        Some(source) => Cow::Owned(ImageRef {
            src: source.to_string(),
            alt: image.alt.clone(),
        }),
        None => {
            log::debug!("unresolved image token {}", image.src);
            Cow::Borrowed(image)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_token_inside_quotes() {
        let images = store(&[("abc", "data:image/png;base64,XYZ")]);
        let out = resolve_background("url('local-img-abc') center", &images);
        assert_eq!(out, "url('data:image/png;base64,XYZ') center");
    }

    #[test]
    fn substitutes_token_in_full_declaration_text() {
        let images = store(&[("abc", "data:...XYZ")]);
        let out = resolve_background("background: url('local-img-abc') center", &images);
        assert_eq!(out, "background: url('data:...XYZ') center");
    }

    #[test]
    fn substitutes_unquoted_and_double_quoted_tokens() {
        let images = store(&[("k1", "/img/one.png")]);
        assert_eq!(
            resolve_background("url(local-img-k1) no-repeat", &images),
            "url(/img/one.png) no-repeat"
        );
        assert_eq!(
            resolve_background(r#"url("local-img-k1")"#, &images),
            r#"url("/img/one.png")"#
        );
    }

    #[test]
    fn preserves_gradient_layers() {
        let images = store(&[("hero", "/hero.jpg")]);
        let value = "linear-gradient(rgba(0,0,0,.5), rgba(0,0,0,.5)), url('local-img-hero') center/cover";
        assert_eq!(
            resolve_background(value, &images),
            "linear-gradient(rgba(0,0,0,.5), rgba(0,0,0,.5)), url('/hero.jpg') center/cover"
        );
    }

    #[test]
    fn only_first_token_is_substituted() {
        let images = store(&[("a", "/a.png"), ("b", "/b.png")]);
        assert_eq!(
            resolve_background("url('local-img-a'), url('local-img-b')", &images),
            "url('/a.png'), url('local-img-b')"
        );
    }

    #[test]
    fn lookup_miss_leaves_value_identical() {
        let value = "url('local-img-missing') center";
        let out = resolve_background(value, &NoImages);
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out, value);
    }

    #[test]
    fn values_without_url_are_untouched() {
        let images = store(&[("abc", "/x.png")]);
        assert_eq!(resolve_background("#fff", &images), "#fff");
        assert_eq!(resolve_background("local-img-abc", &images), "local-img-abc");
        assert_eq!(resolve_background("url('/plain.png')", &images), "url('/plain.png')");
    }

    #[test]
    fn declarations_without_background_are_borrowed() {
        let styles = StyleDeclarations::new().with("color", "url('local-img-abc')");
        let images = store(&[("abc", "/x.png")]);
        let out = resolve_asset_tokens(&styles, &images);
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn declarations_background_is_rewritten() {
        let styles = StyleDeclarations::new()
            .with("background", "url('local-img-abc') center")
            .with("color", "white");
        let images = store(&[("abc", "/x.png")]);
        let out = resolve_asset_tokens(&styles, &images);
        assert_eq!(out.get("background"), Some("url('/x.png') center"));
        assert_eq!(out.get("color"), Some("white"));
    }

    #[test]
    fn image_source_token_resolved() {
        let image = ImageRef {
            src: "local-img-logo".to_string(),
            alt: Some("Logo".to_string()),
        };
        let images = store(&[("logo", "data:image/png;base64,AAA")]);
        let out = resolve_image_source(&image, &images);
        assert_eq!(out.src, "data:image/png;base64,AAA");
        assert_eq!(out.alt.as_deref(), Some("Logo"));
    }

    #[test]
    fn image_source_without_token_is_borrowed() {
        let image = ImageRef {
            src: "https://cdn.example.com/a.png".to_string(),
            alt: None,
        };
        assert!(matches!(resolve_image_source(&image, &NoImages), Cow::Borrowed(_)));
    }
}
