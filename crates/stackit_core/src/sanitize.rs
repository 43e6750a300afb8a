//! Rich-text sanitizer collaborator.
//!
//! # Responsibility
//! - Clean user-supplied HTML bodies before they are stored.
//!
//! # Invariants
//! - Only allow-listed tags and attributes survive; other tags are dropped
//!   but their text content is kept.
//! - `<script>`/`<style>` blocks and HTML comments are removed with their
//!   content.
//! - Stray angle brackets in text are escaped, so output never contains a
//!   tag that was not rebuilt from the allow-list.
//! - `href`/`src` values are decoded before their scheme is checked; only
//!   relative URLs and allow-listed schemes survive, re-encoded.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));
static BLOCKED_CONTENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("valid blocked content regex")
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9]*)((?:[^>]*?)?)\s*/?>").expect("valid tag regex")
});
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z][A-Za-z0-9_-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("valid attribute regex")
});
static CHAR_REF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&#[xX]([0-9A-Fa-f]+);?|&#([0-9]+);?|&([A-Za-z]+);")
        .expect("valid character reference regex")
});

const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "strong", "em", "u", "ol", "ul", "li", "h1", "h2", "h3", "h4", "h5", "h6",
    "blockquote", "code", "pre", "a", "img",
];
const VOID_TAGS: &[&str] = &["br", "img"];
const URL_ATTRIBUTES: &[&str] = &["href", "src"];
const ALLOWED_URL_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Cleans rich-text input before storage.
pub trait Sanitizer {
    fn sanitize(&self, raw: &str) -> String;
}

/// Allow-list HTML sanitizer used by default for question and answer bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSanitizer;

impl Sanitizer for HtmlSanitizer {
    fn sanitize(&self, raw: &str) -> String {
        let without_comments = COMMENT_RE.replace_all(raw, "");
        let without_blocked = BLOCKED_CONTENT_RE.replace_all(&without_comments, "");
        let source = without_blocked.as_ref();

        let mut cleaned = String::with_capacity(source.len());
        let mut cursor = 0;
        for caps in TAG_RE.captures_iter(source) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            push_escaped_text(&mut cleaned, &source[cursor..whole.start()]);
            if let Some(tag) = rebuild_tag(&caps) {
                cleaned.push_str(&tag);
            }
            cursor = whole.end();
        }
        push_escaped_text(&mut cleaned, &source[cursor..]);

        cleaned.trim().to_string()
    }
}

fn rebuild_tag(caps: &Captures<'_>) -> Option<String> {
    let name = caps.get(2)?.as_str().to_ascii_lowercase();
    if !ALLOWED_TAGS.contains(&name.as_str()) {
        return None;
    }

    let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
    if closing {
        if VOID_TAGS.contains(&name.as_str()) {
            return None;
        }
        return Some(format!("</{name}>"));
    }

    let mut tag = format!("<{name}");
    let raw_attributes = caps.get(3).map_or("", |m| m.as_str());
    for attr in ATTR_RE.captures_iter(raw_attributes) {
        let Some(attr_name) = attr.get(1).map(|m| m.as_str().to_ascii_lowercase()) else {
            continue;
        };
        if !attribute_allowed(&name, &attr_name) {
            continue;
        }
        let raw_value = attr
            .get(2)
            .or_else(|| attr.get(3))
            .or_else(|| attr.get(4))
            .map_or("", |m| m.as_str());
        let value = decode_char_refs(raw_value);
        if URL_ATTRIBUTES.contains(&attr_name.as_str()) && !url_allowed(&value) {
            continue;
        }
        tag.push_str(&format!(" {attr_name}=\"{}\"", escape_attribute(&value)));
    }
    tag.push('>');
    Some(tag)
}

fn attribute_allowed(tag: &str, attribute: &str) -> bool {
    match (tag, attribute) {
        (_, "class") => true,
        ("a", "href" | "title") => true,
        ("img", "src" | "alt" | "width" | "height") => true,
        _ => false,
    }
}

/// Relative URLs pass; absolute ones need an allow-listed scheme.
fn url_allowed(value: &str) -> bool {
    let normalized: String = value
        .chars()
        .filter(|ch| !ch.is_whitespace() && !ch.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    let Some((scheme, _)) = normalized.split_once(':') else {
        return true;
    };
    if scheme.contains(['/', '?', '#']) {
        return true;
    }
    ALLOWED_URL_SCHEMES.contains(&scheme)
}

fn decode_char_refs(value: &str) -> String {
    CHAR_REF_RE
        .replace_all(value, |caps: &Captures<'_>| {
            let code_point = if let Some(hex) = caps.get(1) {
                u32::from_str_radix(hex.as_str(), 16).ok()
            } else if let Some(decimal) = caps.get(2) {
                decimal.as_str().parse::<u32>().ok()
            } else {
                let named = caps.get(3).map_or("", |m| m.as_str());
                match named_char_ref(named) {
                    Some(ch) => return ch.to_string(),
                    None => return caps[0].to_string(),
                }
            };
            code_point
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER)
                .to_string()
        })
        .into_owned()
}

fn named_char_ref(name: &str) -> Option<char> {
    let ch = match name.to_ascii_lowercase().as_str() {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "colon" => ':',
        "tab" => '\t',
        "newline" => '\n',
        "nbsp" => '\u{a0}',
        _ => return None,
    };
    Some(ch)
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn push_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
}
