//! Render cache.
//!
//! Composition is cheap but a rendered page is a large document full of
//! inlined `data:` URIs. Rewriting an unchanged page churns file watchers and
//! live-reload servers, so the `render` command skips work in two steps:
//!
//! 1. **Fingerprint**: SHA-256 of the serialized [`Composition`] plus the page
//!    options. If the manifest records the same fingerprint for the output
//!    path and the file still exists, rendering is skipped entirely.
//! 2. **Write-if-changed**: otherwise the page is rendered and compared with
//!    the file on disk by content hash; identical bytes are not rewritten.
//!
//! The fingerprint covers everything that reaches the page (resolved values,
//! resolved asset sources, variant choices, clamped layout options, language
//! and direction), so any edit that changes output changes the key.
//!
//! ## Storage
//!
//! The manifest is a JSON file, `.render-manifest.json`, next to the output
//! page. A missing, corrupt or outdated manifest loads as empty.

use crate::compose::Composition;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the manifest file within the output directory.
const MANIFEST_FILENAME: &str = ".render-manifest.json";

/// Bump to invalidate every existing manifest when the key computation
/// changes.
const MANIFEST_VERSION: u32 = 1;

/// Output file name → fingerprint of the composition it was rendered from.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct RenderManifest {
    pub version: u32,
    pub entries: HashMap<String, String>,
}

impl RenderManifest {
    /// Create an empty manifest (used for `--no-cache` or a first render).
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
        }
    }

    /// Load from the output directory. Returns an empty manifest if the file
    /// doesn't exist or can't be parsed.
    pub fn load(output_dir: &Path) -> Self {
        let content = match std::fs::read_to_string(manifest_path(output_dir)) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(m) if m.version == MANIFEST_VERSION => m,
            _ => Self::empty(),
        }
    }

    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(output_dir), json)
    }

    /// True when `output` was last rendered from `fingerprint` and is still
    /// on disk.
    pub fn is_fresh(&self, output: &Path, fingerprint: &str) -> bool {
        let Some(name) = entry_name(output) else {
            return false;
        };
        self.entries.get(&name).is_some_and(|f| f == fingerprint) && output.exists()
    }

    pub fn record(&mut self, output: &Path, fingerprint: String) {
        if let Some(name) = entry_name(output) {
            self.entries.insert(name, fingerprint);
        }
    }
}

fn entry_name(output: &Path) -> Option<String> {
    output
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

/// Resolve the manifest path for an output directory.
pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MANIFEST_FILENAME)
}

/// SHA-256 of arbitrary bytes, as a hex string.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Content key of a composition rendered with the given page parameters.
///
/// `params` are extra strings that change the rendered document without
/// changing the composition (title, stylesheet href).
pub fn fingerprint(composition: &Composition, params: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"composition\0");
    // Serializing plain data with string keys cannot fail.
    let json = serde_json::to_vec(composition).unwrap_or_default();
    hasher.update(&json);
    for param in params {
        hasher.update(b"\0");
        hasher.update(param.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

/// Write `contents` to `path` unless the file already holds exactly those
/// bytes. Parent directories are created as needed.
pub fn write_if_changed(path: &Path, contents: &[u8]) -> io::Result<WriteOutcome> {
    if let Ok(existing) = std::fs::read(path)
        && hash_bytes(&existing) == hash_bytes(contents)
    {
        return Ok(WriteOutcome::Unchanged);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(WriteOutcome::Written)
}

/// What happened to one rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// Fingerprint matched; nothing rendered.
    Cached,
    /// Rendered, but the bytes on disk were already identical.
    Unchanged,
    Written,
}

impl fmt::Display for RenderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RenderStatus::Cached => "cached",
            RenderStatus::Unchanged => "unchanged",
            RenderStatus::Written => "written",
        })
    }
}

impl From<WriteOutcome> for RenderStatus {
    fn from(outcome: WriteOutcome) -> Self {
        match outcome {
            WriteOutcome::Written => RenderStatus::Written,
            WriteOutcome::Unchanged => RenderStatus::Unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::NoImages;
    use crate::compose::compose;
    use crate::content::ElementContent;
    use crate::site::SitePatch;
    use crate::test_helpers::*;
    use std::fs;
    use tempfile::TempDir;

    // =========================================================================
    // Fingerprints
    // =========================================================================

    #[test]
    fn fingerprint_is_stable() {
        let site = sample_site();
        let a = fingerprint(&compose(&site, &english(), &NoImages), &["Home"]);
        let b = fingerprint(&compose(&site, &english(), &NoImages), &["Home"]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn fingerprint_changes_with_language() {
        let site = sample_site();
        let en = fingerprint(&compose(&site, &english(), &NoImages), &[]);
        let ar = fingerprint(&compose(&site, &arabic(), &NoImages), &[]);
        assert_ne!(en, ar);
    }

    #[test]
    fn fingerprint_changes_with_content_edit() {
        let site = sample_site();
        let edited = SitePatch::SetContent {
            section: "about".to_string(),
            element: "about-title".to_string(),
            language: "en".to_string(),
            value: crate::content::ContentValue::Text("Who we are".to_string()),
        }
        .apply(&site);
        let before = fingerprint(&compose(&site, &english(), &NoImages), &[]);
        let after = fingerprint(&compose(&edited, &english(), &NoImages), &[]);
        assert_ne!(before, after);
    }

    #[test]
    fn fingerprint_changes_with_params() {
        let out = compose(&sample_site(), &english(), &NoImages);
        assert_ne!(fingerprint(&out, &["Home"]), fingerprint(&out, &["Studio"]));
    }

    #[test]
    fn unused_elements_do_not_change_fingerprint() {
        let site = sample_site();
        let mut noisy = site.clone();
        noisy
            .sections
            .get_mut("about")
            .unwrap()
            .elements
            .insert("about-unused".to_string(), ElementContent::text("en", "ignored"));
        assert_eq!(
            fingerprint(&compose(&site, &english(), &NoImages), &[]),
            fingerprint(&compose(&noisy, &english(), &NoImages), &[])
        );
    }

    // =========================================================================
    // write_if_changed
    // =========================================================================

    #[test]
    fn write_if_changed_skips_identical_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out/index.html");
        assert_eq!(write_if_changed(&path, b"<p>hi</p>").unwrap(), WriteOutcome::Written);
        assert_eq!(write_if_changed(&path, b"<p>hi</p>").unwrap(), WriteOutcome::Unchanged);
        assert_eq!(write_if_changed(&path, b"<p>bye</p>").unwrap(), WriteOutcome::Written);
        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>bye</p>");
    }

    // =========================================================================
    // Manifest
    // =========================================================================

    #[test]
    fn manifest_roundtrip_and_freshness() {
        let tmp = TempDir::new().unwrap();
        let page = tmp.path().join("index.html");
        let mut m = RenderManifest::empty();
        m.record(&page, "abc".to_string());
        m.save(tmp.path()).unwrap();

        let loaded = RenderManifest::load(tmp.path());
        assert_eq!(loaded, m);
        // Not fresh until the page exists
        assert!(!loaded.is_fresh(&page, "abc"));
        fs::write(&page, "x").unwrap();
        assert!(loaded.is_fresh(&page, "abc"));
        assert!(!loaded.is_fresh(&page, "def"));
    }

    #[test]
    fn corrupt_or_outdated_manifest_loads_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(manifest_path(tmp.path()), "{ nope").unwrap();
        assert_eq!(RenderManifest::load(tmp.path()), RenderManifest::empty());

        fs::write(
            manifest_path(tmp.path()),
            r#"{"version": 0, "entries": {"index.html": "abc"}}"#,
        )
        .unwrap();
        assert!(RenderManifest::load(tmp.path()).entries.is_empty());
    }

    #[test]
    fn render_status_display() {
        assert_eq!(RenderStatus::Cached.to_string(), "cached");
        assert_eq!(RenderStatus::from(WriteOutcome::Unchanged), RenderStatus::Unchanged);
    }
}
