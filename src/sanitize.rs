//! Rich text sanitizer.
//!
//! Editor-authored markup is untrusted. Before it is rendered unescaped it is
//! re-tokenized and re-serialized against an allow-list:
//!
//! - allowed elements are re-emitted in canonical form (lowercase names,
//!   double-quoted attribute values, no self-closing slashes)
//! - `script`, `style` and the other raw-text / embedding elements are removed
//!   together with everything inside them
//! - any other unknown element loses its tags but keeps its text
//! - event handler attributes (`on*`) and attributes outside the allow-list are
//!   dropped; `href`/`src` values with a script-capable scheme are dropped
//! - the `style` attribute is kept, unless it carries legacy script vectors
//!   (`expression(`, `javascript:`)
//! - comments, doctypes and processing instructions are dropped
//! - a `<` that does not start markup becomes `&lt;`; a bare `&` becomes
//!   `&amp;`; well-formed character references are kept as written
//!
//! Because the output only contains constructs the tokenizer re-emits
//! unchanged, sanitizing is idempotent. Malformed input never fails: an
//! unterminated tag, comment or quoted value truncates the output at that
//! point, and elements left open are closed at the end.

use std::sync::LazyLock;

/// Elements emitted as-is (attributes filtered).
const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "address", "article", "aside", "b", "bdi", "bdo", "blockquote", "br", "caption",
    "center", "cite", "code", "col", "colgroup", "dd", "del", "details", "dfn", "div", "dl", "dt",
    "em", "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hgroup",
    "hr", "i", "img", "ins", "kbd", "li", "main", "mark", "nav", "ol", "p", "pre", "q", "rp", "rt",
    "ruby", "s", "samp", "section", "small", "span", "strike", "strong", "sub", "summary", "sup",
    "table", "tbody", "td", "tfoot", "th", "thead", "time", "tr", "tt", "u", "ul", "var", "wbr",
];

/// Elements removed together with their content.
const DROPPED_WITH_CONTENT: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "noscript", "noembed", "noframes", "template",
    "textarea", "title", "xmp", "plaintext", "svg", "math", "select", "frameset", "frame",
    "applet",
];

/// Elements without a closing tag.
const VOID_TAGS: &[&str] = &["br", "col", "hr", "img", "wbr"];

/// Attributes allowed on any allowed element.
const ALLOWED_ATTRS: &[&str] = &[
    "align", "alt", "cite", "class", "colspan", "datetime", "dir", "height", "href", "id", "lang",
    "loading", "open", "rel", "reversed", "rowspan", "scope", "span", "src", "start", "style",
    "target", "title", "width",
];

/// Attributes whose value is a URL and gets a scheme check.
const URL_ATTRS: &[&str] = &["href", "src", "cite"];

const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// Allow-list policy for [`Sanitizer`].
#[derive(Debug, Clone)]
pub struct SanitizePolicy {
    allowed_tags: Vec<&'static str>,
    dropped_with_content: Vec<&'static str>,
    allowed_attrs: Vec<&'static str>,
    allow_data_attrs: bool,
}

impl Default for SanitizePolicy {
    /// The general safe HTML profile.
    fn default() -> Self {
        Self {
            allowed_tags: ALLOWED_TAGS.to_vec(),
            dropped_with_content: DROPPED_WITH_CONTENT.to_vec(),
            allowed_attrs: ALLOWED_ATTRS.to_vec(),
            allow_data_attrs: true,
        }
    }
}

impl SanitizePolicy {
    /// Drop `data-*` and `aria-*` attributes as well.
    pub fn without_data_attrs(mut self) -> Self {
        self.allow_data_attrs = false;
        self
    }

    /// Remove `tag` from the allow-list; its text content is kept.
    pub fn forbid_tag(mut self, tag: &str) -> Self {
        self.allowed_tags.retain(|t| !t.eq_ignore_ascii_case(tag));
        self
    }

    fn tag_allowed(&self, name: &str) -> bool {
        self.allowed_tags.contains(&name)
    }

    fn drops_content(&self, name: &str) -> bool {
        self.dropped_with_content.contains(&name)
    }

    fn attr_allowed(&self, name: &str) -> bool {
        if name.starts_with("on") {
            return false;
        }
        if self.allow_data_attrs && (name.starts_with("data-") || name.starts_with("aria-")) {
            return name.len() > 5;
        }
        self.allowed_attrs.contains(&name)
    }
}

/// Sanitizes untrusted markup against a [`SanitizePolicy`].
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    policy: SanitizePolicy,
}

static DEFAULT_SANITIZER: LazyLock<Sanitizer> = LazyLock::new(Sanitizer::default);

/// Sanitize with the default policy.
pub fn sanitize(raw: &str) -> String {
    DEFAULT_SANITIZER.sanitize(raw)
}

pub fn default_sanitizer() -> &'static Sanitizer {
    &DEFAULT_SANITIZER
}

impl Sanitizer {
    pub fn new(policy: SanitizePolicy) -> Self {
        Self { policy }
    }

    pub fn sanitize(&self, raw: &str) -> String {
        let lower = raw.to_ascii_lowercase();
        let bytes = raw.as_bytes();
        let mut out = String::with_capacity(raw.len());
        let mut open: Vec<String> = Vec::new();
        let mut text_start = 0;
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] != b'<' {
                i += 1;
                continue;
            }
            push_text(&mut out, &raw[text_start..i]);

            i = match scan_markup(raw, i) {
                Markup::Literal => {
                    out.push_str("&lt;");
                    i + 1
                }
                Markup::Skip { end } => end,
                Markup::Truncated => bytes.len(),
                Markup::EndTag { name, end } => {
                    self.close(&mut out, &mut open, &name);
                    end
                }
                Markup::StartTag { name, attrs, end } => {
                    if self.policy.drops_content(&name) {
                        skip_raw_text(&lower, &name, end)
                    } else {
                        if self.policy.tag_allowed(&name) {
                            self.emit_start(&mut out, &name, &attrs);
                            if !VOID_TAGS.contains(&name.as_str()) {
                                open.push(name);
                            }
                        }
                        end
                    }
                }
            };
            text_start = i;
        }
        if text_start < bytes.len() {
            push_text(&mut out, &raw[text_start..]);
        }
        while let Some(name) = open.pop() {
            push_close(&mut out, &name);
        }
        out
    }

    fn emit_start(&self, out: &mut String, name: &str, attrs: &[(String, String)]) {
        out.push('<');
        out.push_str(name);
        let mut seen: Vec<&str> = Vec::new();
        for (attr, value) in attrs {
            if seen.contains(&attr.as_str()) || !self.keep_attr(attr, value) {
                continue;
            }
            seen.push(attr);
            out.push(' ');
            out.push_str(attr);
            out.push_str("=\"");
            push_escaped(out, value, true);
            out.push('"');
        }
        out.push('>');
    }

    fn keep_attr(&self, name: &str, value: &str) -> bool {
        let valid_name = !name.is_empty()
            && name.starts_with(|c: char| c.is_ascii_alphabetic())
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'));
        if !valid_name || !self.policy.attr_allowed(name) {
            return false;
        }
        if URL_ATTRS.contains(&name) {
            return url_is_safe(name, value);
        }
        if name == "style" {
            let normalized = normalize(value);
            return !["expression(", "javascript:", "vbscript:", "behavior:", "-moz-binding"]
                .iter()
                .any(|vector| normalized.contains(vector));
        }
        true
    }

    /// Close `name` and every element opened after it. Stray end tags vanish.
    fn close(&self, out: &mut String, open: &mut Vec<String>, name: &str) {
        let Some(pos) = open.iter().rposition(|n| n == name) else {
            return;
        };
        for inner in open.drain(pos..).rev() {
            push_close(out, &inner);
        }
    }
}

enum Markup {
    /// `<` that starts nothing; emitted as text.
    Literal,
    /// Comment, doctype, processing instruction: dropped.
    Skip { end: usize },
    /// Unterminated construct: drop the rest of the input.
    Truncated,
    StartTag {
        name: String,
        attrs: Vec<(String, String)>,
        end: usize,
    },
    EndTag { name: String, end: usize },
}

/// Classify the markup starting at `start` (which holds `<`).
fn scan_markup(s: &str, start: usize) -> Markup {
    let b = s.as_bytes();
    let next = b.get(start + 1).copied();
    match next {
        Some(c) if c.is_ascii_alphabetic() => scan_start_tag(s, start + 1),
        Some(b'/') => match b.get(start + 2) {
            Some(c) if c.is_ascii_alphabetic() => {
                let name_end = find_from(b, start + 2, |c| is_space(c) || c == b'/' || c == b'>');
                match find_byte(b, name_end, b'>') {
                    Some(gt) => Markup::EndTag {
                        name: s[start + 2..name_end].to_ascii_lowercase(),
                        end: gt + 1,
                    },
                    None => Markup::Truncated,
                }
            }
            Some(_) => skip_to_gt(b, start + 2),
            None => Markup::Truncated,
        },
        Some(b'!') if s[start..].starts_with("<!--") => match s[start + 4..].find("-->") {
            Some(off) => Markup::Skip {
                end: start + 4 + off + 3,
            },
            None => Markup::Truncated,
        },
        Some(b'!') | Some(b'?') => skip_to_gt(b, start + 2),
        _ => Markup::Literal,
    }
}

fn scan_start_tag(s: &str, name_start: usize) -> Markup {
    let b = s.as_bytes();
    let name_end = find_from(b, name_start, |c| is_space(c) || c == b'/' || c == b'>');
    let name = s[name_start..name_end].to_ascii_lowercase();
    let mut attrs = Vec::new();
    let mut i = name_end;

    loop {
        while i < b.len() && (is_space(b[i]) || b[i] == b'/') {
            i += 1;
        }
        if i >= b.len() {
            return Markup::Truncated;
        }
        if b[i] == b'>' {
            return Markup::StartTag {
                name,
                attrs,
                end: i + 1,
            };
        }

        let attr_start = i;
        i = find_from(b, i + 1, |c| is_space(c) || c == b'/' || c == b'>' || c == b'=');
        let attr = s[attr_start..i].to_ascii_lowercase();

        let mut j = i;
        while j < b.len() && is_space(b[j]) {
            j += 1;
        }
        if j < b.len() && b[j] == b'=' {
            j += 1;
            while j < b.len() && is_space(b[j]) {
                j += 1;
            }
            if j >= b.len() {
                return Markup::Truncated;
            }
            let value = match b[j] {
                q @ (b'"' | b'\'') => match find_byte(b, j + 1, q) {
                    Some(close) => {
                        let v = &s[j + 1..close];
                        j = close + 1;
                        v
                    }
                    None => return Markup::Truncated,
                },
                _ => {
                    let value_end = find_from(b, j, |c| is_space(c) || c == b'>');
                    let v = &s[j..value_end];
                    j = value_end;
                    v
                }
            };
            attrs.push((attr, value.to_string()));
            i = j;
        } else {
            attrs.push((attr, String::new()));
        }
    }
}

fn skip_to_gt(b: &[u8], from: usize) -> Markup {
    match find_byte(b, from, b'>') {
        Some(gt) => Markup::Skip { end: gt + 1 },
        None => Markup::Truncated,
    }
}

/// Position just past the end tag closing a raw-text element, or the end of
/// input when it is never closed.
fn skip_raw_text(lower: &str, name: &str, from: usize) -> usize {
    let b = lower.as_bytes();
    let needle = format!("</{}", name);
    let mut search = from;
    while let Some(off) = lower[search..].find(&needle) {
        let after = search + off + needle.len();
        match b.get(after) {
            Some(&c) if is_space(c) || c == b'/' || c == b'>' => {
                return find_byte(b, after, b'>').map_or(b.len(), |gt| gt + 1);
            }
            None => return b.len(),
            Some(_) => search = after,
        }
    }
    b.len()
}

fn find_from(b: &[u8], from: usize, stop: impl Fn(u8) -> bool) -> usize {
    b[from.min(b.len())..]
        .iter()
        .position(|&c| stop(c))
        .map_or(b.len(), |p| from + p)
}

fn find_byte(b: &[u8], from: usize, needle: u8) -> Option<usize> {
    b.get(from..)?.iter().position(|&c| c == needle).map(|p| from + p)
}

fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
}

fn push_close(out: &mut String, name: &str) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn push_text(out: &mut String, text: &str) {
    push_escaped(out, text, false);
}

/// Escape markup-significant characters, keeping well-formed character
/// references so a second pass leaves them alone.
fn push_escaped(out: &mut String, text: &str, in_attr: bool) {
    for (idx, ch) in text.char_indices() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attr => out.push_str("&quot;"),
            '&' if char_ref_len(&text[idx..]).is_none() => out.push_str("&amp;"),
            _ => out.push(ch),
        }
    }
}

/// Length of a well-formed character reference at the start of `s`:
/// `&name;`, `&#123;` or `&#x1F;`.
fn char_ref_len(s: &str) -> Option<usize> {
    let body = s.strip_prefix('&')?;
    let semi = body.find(';')?;
    let inner = &body[..semi];
    let ok = if let Some(num) = inner.strip_prefix('#') {
        match num.strip_prefix(['x', 'X']) {
            Some(hex) => !hex.is_empty() && hex.len() <= 6 && hex.chars().all(|c| c.is_ascii_hexdigit()),
            None => !num.is_empty() && num.len() <= 7 && num.chars().all(|c| c.is_ascii_digit()),
        }
    } else {
        !inner.is_empty()
            && inner.len() <= 32
            && inner.starts_with(|c: char| c.is_ascii_alphabetic())
            && inner.chars().all(|c| c.is_ascii_alphanumeric())
    };
    ok.then_some(semi + 2)
}

/// Decode the character references that matter for scheme detection, drop
/// whitespace and control characters, lowercase.
fn normalize(value: &str) -> String {
    let mut decoded = String::with_capacity(value.len());
    let mut i = 0;
    while i < value.len() {
        let rest = &value[i..];
        if rest.starts_with('&') {
            if let Some(len) = char_ref_len(rest) {
                if let Some(ch) = decode_ref(&rest[1..len - 1]) {
                    decoded.push(ch);
                    i += len;
                    continue;
                }
            }
        }
        let ch = rest.chars().next().unwrap_or_default();
        decoded.push(ch);
        i += ch.len_utf8().max(1);
    }
    decoded
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .flat_map(char::to_lowercase)
        .collect()
}

fn decode_ref(inner: &str) -> Option<char> {
    if let Some(num) = inner.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    let ch = match inner.to_ascii_lowercase().as_str() {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "colon" => ':',
        "tab" => '\t',
        "newline" => '\n',
        "lpar" => '(',
        "rpar" => ')',
        "sol" => '/',
        _ => return None,
    };
    Some(ch)
}

/// Whether `url` may be used as a link target: relative, fragment, or one
/// of the allowed schemes, after decoding character references.
pub fn is_safe_url(url: &str) -> bool {
    url_is_safe("href", url)
}

fn url_is_safe(attr: &str, value: &str) -> bool {
    let normalized = normalize(value);
    let scheme_end = normalized.find([':', '/', '?', '#']);
    let Some(pos) = scheme_end.filter(|&p| normalized.as_bytes()[p] == b':') else {
        return true;
    };
    let scheme = &normalized[..pos];
    if SAFE_SCHEMES.contains(&scheme) {
        return true;
    }
    attr == "src" && normalized.starts_with("data:image/")
}
