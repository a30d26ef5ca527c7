//! Track URL normalization and validation.
//!
//! Uploaded lines are either plain `http(s)://` URLs or URLs wrapped in one
//! or more playback tags:
//!
//! ```text
//! annotate:title="Intro: Part 1",liq_fade_in="2.0":http://files/intro.mp3
//! replaygain:http://files/track.mp3
//! ```
//!
//! Tags are peeled off outermost first and kept verbatim; only the innermost
//! URL is rewritten, percent re-encoded, and probed for reachability. Bad
//! URLs must be caught here because nobody is watching when automation
//! dispenses a track.

use std::sync::Arc;

use async_trait::async_trait;
use percent_encoding::{percent_encode, AsciiSet, CONTROLS};
use regex::Regex;

use crate::error::CoreError;
use crate::types::MAX_TRACK_URL_LEN;

/// Tag whose first field is a `key=value` list (values may be quoted and
/// contain colons) and whose second field is the inner URL.
pub const ANNOTATE_TAG: &str = "annotate";

/// Effect tags that take exactly one argument: the inner URL.
pub const EFFECT_TAGS: &[&str] = &["replaygain"];

/// Characters that must be escaped in the path/query of a track URL.
const UNSAFE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'^')
    .add(b'%');

/// Delimiters whose escaped form means something different from the literal
/// character (`%3F` is part of a file name, `?` starts the query).
const RESERVED: &[u8] = b":/?#[]@!$&'()*+,;=";

// ---------------------------------------------------------------------------
// Reachability probe
// ---------------------------------------------------------------------------

/// Checks that a URL points at something that can actually be fetched.
///
/// Implementations perform network I/O and are expected to enforce their own
/// timeout. A failure is final; callers do not retry.
#[async_trait]
pub trait UrlProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Result<(), String>;
}

// ---------------------------------------------------------------------------
// Rewrite rules
// ---------------------------------------------------------------------------

/// A regex substitution applied to plain URLs (e.g. public host → internal host).
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pattern: Regex,
    replacement: String,
}

impl RewriteRule {
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, CoreError> {
        let pattern = Regex::new(pattern).map_err(|e| {
            CoreError::Validation(format!("invalid rewrite pattern '{pattern}': {e}"))
        })?;
        Ok(Self {
            pattern,
            replacement: replacement.to_string(),
        })
    }

    /// Parse `pattern=>replacement` pairs separated by `;`.
    pub fn parse_list(spec: &str) -> Result<Vec<Self>, CoreError> {
        spec.split(';')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(|entry| {
                let (pattern, replacement) = entry.split_once("=>").ok_or_else(|| {
                    CoreError::Validation(format!(
                        "rewrite rule '{entry}' must look like pattern=>replacement"
                    ))
                })?;
                Self::new(pattern.trim(), replacement.trim())
            })
            .collect()
    }

    pub fn apply(&self, url: &str) -> String {
        self.pattern
            .replace_all(url, self.replacement.as_str())
            .into_owned()
    }
}

/// Apply every rule in order.
pub fn apply_rewrites(rules: &[RewriteRule], url: &str) -> String {
    rules
        .iter()
        .fold(url.to_string(), |acc, rule| rule.apply(&acc))
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Validates and canonicalizes track URLs before they are stored.
pub struct UrlNormalizer {
    rewrites: Vec<RewriteRule>,
    probe: Option<Arc<dyn UrlProbe>>,
}

impl UrlNormalizer {
    /// `probe = None` disables reachability checks entirely.
    pub fn new(rewrites: Vec<RewriteRule>, probe: Option<Arc<dyn UrlProbe>>) -> Self {
        Self { rewrites, probe }
    }

    /// Normalize one raw playlist line.
    ///
    /// With `skip_validate`, strings that are neither URLs nor recognized tags
    /// pass through unchanged and no reachability check is made.
    pub async fn normalize(&self, raw: &str, skip_validate: bool) -> Result<String, CoreError> {
        let raw = raw.trim();
        let (prefix, inner) = split_tags(raw);

        let normalized = if is_http_url(inner) {
            let rewritten = apply_rewrites(&self.rewrites, inner);
            let encoded = reencode(&rewritten);
            if !skip_validate {
                if let Some(probe) = &self.probe {
                    probe
                        .probe(&encoded)
                        .await
                        .map_err(|e| CoreError::InvalidUrl(format!("{encoded}: {e}")))?;
                }
            }
            format!("{prefix}{encoded}")
        } else if skip_validate {
            raw.to_string()
        } else {
            return Err(CoreError::InvalidUrl(format!(
                "'{raw}' is not an http(s) URL or a recognized tag"
            )));
        };

        if normalized.len() > MAX_TRACK_URL_LEN {
            return Err(CoreError::InvalidUrl(format!(
                "URL is {} characters long (maximum {MAX_TRACK_URL_LEN})",
                normalized.len()
            )));
        }
        Ok(normalized)
    }
}

fn is_http_url(s: &str) -> bool {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Peel recognized tags off `raw`, returning the verbatim tag prefix and the
/// innermost payload.
fn split_tags(raw: &str) -> (&str, &str) {
    let mut rest = raw;
    loop {
        if is_http_url(rest) {
            break;
        }
        let Some((tag, payload)) = rest.split_once(':') else {
            break;
        };
        let inner = if tag == ANNOTATE_TAG {
            match split_unquoted_colon(payload) {
                Some((fields, inner)) if !fields.is_empty() => inner,
                _ => break,
            }
        } else if EFFECT_TAGS.contains(&tag) {
            payload
        } else {
            break;
        };
        rest = inner;
    }
    let prefix_len = raw.len() - rest.len();
    (&raw[..prefix_len], rest)
}

/// Split at the first `:` that is not inside a double-quoted string.
///
/// Backslash escapes inside quotes are honoured.
fn split_unquoted_colon(s: &str) -> Option<(&str, &str)> {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ':' if !in_quotes => return Some((&s[..i], &s[i + 1..])),
            _ => {}
        }
    }
    None
}

/// Percent re-encode everything after the authority of an http(s) URL.
///
/// Escapes of reserved delimiters are kept as they are; every other escape is
/// decoded and re-encoded, so already-encoded URLs come out the same.
fn reencode(url: &str) -> String {
    let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
    let authority_end = url[scheme_end..]
        .find(['/', '?', '#'])
        .map(|i| scheme_end + i)
        .unwrap_or(url.len());
    let (head, tail) = url.split_at(authority_end);

    let bytes = tail.as_bytes();
    let mut out = String::with_capacity(url.len());
    out.push_str(head);
    let mut pending: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match escaped_byte(bytes, i) {
            Some(byte) if RESERVED.contains(&byte) => {
                out.extend(percent_encode(&pending, UNSAFE));
                pending.clear();
                out.push_str(&format!("%{byte:02X}"));
                i += 3;
            }
            Some(byte) => {
                pending.push(byte);
                i += 3;
            }
            None => {
                pending.push(bytes[i]);
                i += 1;
            }
        }
    }
    out.extend(percent_encode(&pending, UNSAFE));
    out
}

/// The byte encoded by a `%XX` escape starting at `i`, if there is one.
fn escaped_byte(bytes: &[u8], i: usize) -> Option<u8> {
    match bytes.get(i..i + 3)? {
        [b'%', hi, lo] if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
            let hex = [*hi, *lo];
            u8::from_str_radix(std::str::from_utf8(&hex).ok()?, 16).ok()
        }
        _ => None,
    }
}
