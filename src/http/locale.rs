//! Locale derivation from the request path.
//!
//! # Responsibilities
//! - Detect a recognized two-letter locale prefix in the first path segment
//! - Strip the prefix and re-root the remaining path before routing
//! - Fall back to the default locale for everything else
//!
//! # Design Decisions
//! - Matching is case-insensitive and segment-based ("/enfoo" is not "en")
//! - Unrecognized two-letter prefixes keep the default locale and leave the
//!   path untouched; the permissive fallback is deliberate and mirrors the
//!   behavior applications already depend on
//! - Paths shorter than 3 characters never trigger stripping

use crate::config::schema::LocaleConfig;

/// Outcome of locale derivation for one request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedLocale {
    /// Locale tag for the request.
    pub tag: String,
    /// Path to route on; differs from the input only when a recognized
    /// prefix was stripped.
    pub path: String,
}

/// Derive the locale for `path` and rewrite it when a recognized prefix
/// leads it.
pub fn derive(config: &LocaleConfig, path: &str) -> DerivedLocale {
    if let Some(code) = leading_code(path) {
        if let Some(tag) = lookup(config, &code) {
            return DerivedLocale {
                tag,
                path: strip_prefix(path),
            };
        }
    }

    DerivedLocale {
        tag: config.default.clone(),
        path: path.to_string(),
    }
}

/// The first path segment, lowercased, when it is exactly two characters.
fn leading_code(path: &str) -> Option<String> {
    let rest = path.strip_prefix('/')?;
    if rest.len() < 2 || !rest.is_char_boundary(2) {
        return None;
    }
    let (segment, tail) = rest.split_at(2);
    if !tail.is_empty() && !tail.starts_with('/') {
        return None;
    }
    Some(segment.to_ascii_lowercase())
}

fn lookup(config: &LocaleConfig, code: &str) -> Option<String> {
    config
        .prefixes
        .iter()
        .find(|(prefix, _)| prefix.eq_ignore_ascii_case(code))
        .map(|(_, tag)| tag.clone())
}

/// Drop the leading "/xx", re-rooting the remainder with "/".
fn strip_prefix(path: &str) -> String {
    let remainder = &path[3..];
    if remainder.is_empty() || !remainder.starts_with('/') {
        format!("/{}", remainder)
    } else {
        remainder.to_string()
    }
}
