//! End-to-end: project directory on disk → composed and rendered page.

use pagewright::compose::{Composer, SkipReason, compose};
use pagewright::config::load_config;
use pagewright::language::{FilePreferenceStore, LanguageContext, PreferenceStore};
use pagewright::page::{PageOptions, render_page};
use pagewright::registry::RegistryError;
use pagewright::site::{FileSiteSource, SitePatch, SiteSource};
use pagewright::store::ImageStore;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// 1x1 transparent PNG.
const PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

const CONFIG: &str = r#"
[language]
default = "en"
supported = ["en", "ar"]
rtl = ["ar"]

[page]
title = "Studio"
"#;

const SITE: &str = r#"{
  "sectionOrder": ["hero", "ghost", "team", "widget", "footer"],
  "sections": {
    "hero": {
      "component": "Hero",
      "layout": { "template": "split", "imageWidth": 95 },
      "elements": {
        "hero-title": { "content": { "en": "Welcome", "ar": "أهلا وسهلا" } },
        "hero-subtitle": { "content": { "en": "<b>Bold</b> work<script>alert(1)</script>" } },
        "hero-image": { "content": { "en": "local-img-logo" } },
        "hero-background": { "style": { "background": "url('local-img-logo') center / cover" } }
      }
    },
    "team": {
      "component": "Team",
      "items": ["1", "bad id"],
      "elements": {
        "team-1-name": { "content": { "en": "Ada" } }
      }
    },
    "widget": { "component": "Carousel" },
    "footer": {
      "component": "Footer",
      "elements": {
        "footer-copyright": { "content": { "en": "© Studio" } }
      }
    }
  }
}"#;

fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("pagewright.toml"), CONFIG).unwrap();
    fs::write(tmp.path().join("site.json"), SITE).unwrap();
    fs::create_dir_all(tmp.path().join("images")).unwrap();
    fs::write(tmp.path().join("images/logo.png"), PNG).unwrap();
    tmp
}

fn language(root: &Path, preference: Option<&str>) -> LanguageContext {
    let config = load_config(&root.join("pagewright.toml")).unwrap();
    LanguageContext::from_config(&config.language, preference)
}

#[test]
fn renders_project_in_default_language() {
    let tmp = project();
    let root = tmp.path();
    let config = load_config(&root.join("pagewright.toml")).unwrap();
    let site = FileSiteSource::new(root.join("site.json")).load().unwrap();
    let images = ImageStore::load_dir(&config.images_dir(root)).unwrap();
    let lang = LanguageContext::from_config(&config.language, None);

    let composition = compose(&site, &lang, &images);
    let ids: Vec<&str> = composition
        .nodes
        .iter()
        .map(|n| n.section_id.as_str())
        .collect();
    assert_eq!(ids, ["hero", "team", "footer"]);

    let html = render_page(&composition, &PageOptions::from_config(&config.page)).into_string();
    assert!(html.contains(r#"<html lang="en" dir="ltr">"#));
    assert!(html.contains("<title>Studio</title>"));
    assert!(html.contains("Welcome"));
    assert!(html.contains("<b>Bold</b> work"));
    assert!(!html.contains("alert(1)"));
    assert!(!html.contains("local-img-logo"));
    assert!(html.contains("data:image/png;base64,iVBORw0KGgo"));
    assert!(html.contains("--image-width: 70%"));
    assert!(html.contains("Ada"));
    assert!(html.contains("© Studio"));
}

#[test]
fn skipped_sections_are_recorded_in_order() {
    let tmp = project();
    let root = tmp.path();
    let site = FileSiteSource::new(root.join("site.json")).load().unwrap();
    let composition = compose(&site, &language(root, None), &ImageStore::new());

    let skipped: Vec<(usize, &str)> = composition
        .skipped
        .iter()
        .map(|s| (s.position, s.section_id.as_str()))
        .collect();
    assert_eq!(skipped, [(1, "ghost"), (3, "widget")]);
    assert_eq!(composition.skipped[0].reason, SkipReason::Missing);
    assert_eq!(
        composition.skipped[1].reason,
        SkipReason::Unresolvable {
            cause: RegistryError::UnknownKind {
                component: "Carousel".to_string()
            }
        }
    );
}

#[test]
fn remembered_language_switches_direction_and_falls_back() {
    let tmp = project();
    let root = tmp.path();
    let prefs = FilePreferenceStore::new(root.join(".pagewright-lang"));
    let mut lang = language(root, prefs.load().as_deref());
    lang.switch_to("ar").unwrap();
    prefs.save(lang.current()).unwrap();

    let lang = language(root, prefs.load().as_deref());
    assert_eq!(lang.current().as_str(), "ar");

    let site = FileSiteSource::new(root.join("site.json")).load().unwrap();
    let composition = compose(&site, &lang, &ImageStore::new());
    let html = render_page(&composition, &PageOptions::default()).into_string();
    assert!(html.contains(r#"<html lang="ar" dir="rtl">"#));
    assert!(html.contains("أهلا وسهلا"));
    // No Arabic name: the English one stands in.
    assert!(html.contains("Ada"));
}

#[test]
fn patch_then_recompose() {
    let tmp = project();
    let root = tmp.path();
    let site = FileSiteSource::new(root.join("site.json")).load().unwrap();
    let lang = language(root, None);

    let edited = SitePatch::SetTemplate {
        section: "hero".to_string(),
        template: Some("fullscreen".to_string()),
    }
    .apply(&site);
    let edited = SitePatch::Reorder {
        order: vec!["footer".to_string(), "hero".to_string()],
    }
    .apply(&edited);

    let before = compose(&site, &lang, &ImageStore::new());
    let after = compose(&edited, &lang, &ImageStore::new());
    assert_eq!(before.nodes[0].variant, "split");
    assert_eq!(after.nodes[0].section_id, "footer");
    assert_eq!(after.nodes[1].variant, "fullscreen");
    assert!(after.skipped.is_empty());
}

#[test]
fn check_flags_what_compose_skips() {
    let tmp = project();
    let root = tmp.path();
    let site = FileSiteSource::new(root.join("site.json")).load().unwrap();
    let images = ImageStore::new();
    let issues = Composer::new(&images).check(&site, &language(root, None));
    assert!(issues.iter().any(|i| i.section_id == "ghost"));
    assert!(issues.iter().any(|i| i.section_id == "widget"));
}

#[test]
fn missing_site_file_is_unavailable() {
    let tmp = TempDir::new().unwrap();
    let err = FileSiteSource::new(tmp.path().join("site.json"))
        .load()
        .unwrap_err();
    assert!(err.to_string().starts_with("site configuration unavailable"));
}
