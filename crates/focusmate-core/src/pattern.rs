//! URL normalization and site specifier matching.
//!
//! A rule's site specifier is one of three shapes, classified purely from
//! the string itself:
//!
//! - `/pattern/flags` -- a delimited regular expression
//! - anything containing `*` or `?` -- a glob-style wildcard
//!   (with `*.suffix` special-cased as a subdomain suffix match)
//! - anything else -- an exact domain
//!
//! Matching runs against the normalized domain of the candidate URL,
//! except when the specifier itself encodes path information (contains a
//! `/`), in which case the full normalized URL is used.
//!
//! A specifier that fails to compile never blocks: it is logged and
//! treated as no-match so the remaining rules still evaluate.

use log::warn;
use regex::{Regex, RegexBuilder};
use url::Url;

/// Classified shape of a site specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specifier<'a> {
    /// `/body/flags` regular expression
    Regex { body: &'a str, flags: &'a str },
    /// `*.suffix` -- candidate domain must end with `.suffix`
    Subdomain(&'a str),
    /// Glob pattern with `*`/`?`
    Wildcard(&'a str),
    /// Plain domain, compared case-insensitively after normalization
    Exact(&'a str),
}

/// Classify a specifier string. Pure function: the same string always
/// classifies the same way, on every evaluation.
pub fn classify(specifier: &str) -> Specifier<'_> {
    if let Some(rest) = specifier.strip_prefix('/') {
        if let Some(last) = rest.rfind('/') {
            return Specifier::Regex {
                body: &rest[..last],
                flags: &rest[last + 1..],
            };
        }
    }
    if let Some(suffix) = specifier.strip_prefix("*.") {
        if !suffix.contains(['*', '?', '/']) {
            return Specifier::Subdomain(suffix);
        }
    }
    if specifier.contains(['*', '?']) {
        return Specifier::Wildcard(specifier);
    }
    Specifier::Exact(specifier)
}

/// Test a candidate URL (or bare domain) against a specifier.
pub fn matches(candidate: &str, specifier: &str) -> bool {
    match classify(specifier) {
        Specifier::Regex { body, flags } => {
            // A slash inside the body means the rule targets paths, not
            // just the domain.
            let target = if body.contains('/') {
                normalize_url(candidate)
            } else {
                extract_domain(candidate)
            };
            match compile_delimited(body, flags) {
                Some(re) => re.is_match(&target),
                None => {
                    warn!("skipping rule with invalid regex specifier: /{body}/{flags}");
                    false
                }
            }
        }
        Specifier::Subdomain(suffix) => {
            let domain = extract_domain(candidate).to_ascii_lowercase();
            domain.ends_with(&format!(".{}", suffix.to_ascii_lowercase()))
        }
        Specifier::Wildcard(pattern) => {
            let target = if pattern.contains('/') {
                normalize_url(candidate)
            } else {
                extract_domain(candidate)
            };
            match compile_wildcard(pattern) {
                Some(re) => re.is_match(&target),
                None => {
                    warn!("skipping rule with invalid wildcard specifier: {pattern}");
                    false
                }
            }
        }
        Specifier::Exact(domain) => {
            extract_domain(candidate).eq_ignore_ascii_case(&extract_domain(domain))
        }
    }
}

/// Extract the normalized domain from a URL.
///
/// Inputs without a scheme are assumed to be `https://`. A leading `www.`
/// is stripped. Unparsable input falls back to the trimmed original string
/// so matching can proceed on a best-effort basis.
pub fn extract_domain(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match Url::parse(&with_scheme(trimmed)) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => strip_www(host).to_ascii_lowercase(),
            None => trimmed.to_string(),
        },
        Err(_) => trimmed.to_string(),
    }
}

/// Normalize a URL to `domain/path[?query]` for path-aware specifiers.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match Url::parse(&with_scheme(trimmed)) {
        Ok(parsed) => {
            let host = match parsed.host_str() {
                Some(host) => strip_www(host).to_ascii_lowercase(),
                None => return trimmed.to_string(),
            };
            match parsed.query() {
                Some(query) => format!("{}{}?{}", host, parsed.path(), query),
                None => format!("{}{}", host, parsed.path()),
            }
        }
        Err(_) => trimmed.to_string(),
    }
}

/// Compile the body/flags of a `/pattern/flags` specifier.
///
/// Supports the `i`, `m`, `s` and `x` flags; `g`, `u` and `y` have no
/// meaning here and are ignored. Any other flag fails the compile.
pub(crate) fn compile_delimited(body: &str, flags: &str) -> Option<Regex> {
    let mut builder = RegexBuilder::new(body);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'x' => {
                builder.ignore_whitespace(true);
            }
            'g' | 'u' | 'y' => {}
            _ => return None,
        }
    }
    builder.build().ok()
}

/// Translate a glob pattern to an anchored case-insensitive regex.
///
/// Every regex metacharacter except `*` and `?` is escaped, then `*`
/// becomes `.*` and `?` becomes `.`.
pub(crate) fn compile_wildcard(pattern: &str) -> Option<Regex> {
    let mut translated = String::with_capacity(pattern.len() * 2);
    for c in pattern.chars() {
        match c {
            '*' => translated.push_str(".*"),
            '?' => translated.push('.'),
            '.' | '+' | '^' | '$' | '{' | '}' | '(' | ')' | '|' | '[' | ']' | '\\' => {
                translated.push('\\');
                translated.push(c);
            }
            _ => translated.push(c),
        }
    }
    RegexBuilder::new(&format!("^{translated}$"))
        .case_insensitive(true)
        .build()
        .ok()
}

fn with_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}
