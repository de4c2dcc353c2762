//! Redirect URI parsing and classification.
//!
//! Configured redirect entries come in two shapes: an exact callback URL
//! (`https://app.example/cb`) or a wildcard origin (`https://app.example/*`)
//! that allows any path under that origin. This module normalizes both and
//! derives the origin (scheme + host + non-default port) used for
//! origin-based client matching.
//!
//! Malformed input yields `None` at every stage; callers drop such entries
//! silently and never store partial matches.

use url::{Origin, Url};

/// Suffix marking a wildcard-origin entry.
const WILDCARD_SUFFIX: &str = "/*";

/// A parsed redirect configuration entry.
///
/// A wildcard entry carries only its origin; an exact entry carries both the
/// normalized URL and its derived origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRedirect {
    /// An exact callback URL.
    Exact {
        /// The normalized URL.
        url: Url,
        /// The URL's origin (scheme + host + port).
        origin: String,
    },
    /// A wildcard entry matching any path under an origin.
    WildcardOrigin {
        /// The allowed origin (scheme + host + port).
        origin: String,
    },
}

impl ParsedRedirect {
    /// Returns the exact normalized URL, if this is an exact entry.
    #[must_use]
    pub fn exact_url(&self) -> Option<&Url> {
        match self {
            Self::Exact { url, .. } => Some(url),
            Self::WildcardOrigin { .. } => None,
        }
    }

    /// Returns the entry's origin.
    #[must_use]
    pub fn origin(&self) -> &str {
        match self {
            Self::Exact { origin, .. } | Self::WildcardOrigin { origin } => origin,
        }
    }
}

/// Trims a configuration value, treating empty as absent.
#[must_use]
pub fn sanitize(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parses and canonicalizes a URL, returning `None` on malformed input.
///
/// Normalization is whatever [`Url::parse`] performs: lowercased scheme and
/// host, default ports dropped, percent-encoding canonicalized.
#[must_use]
pub fn normalize_url(value: &str) -> Option<Url> {
    Url::parse(value.trim()).ok()
}

/// Derives a URL's origin as its ASCII serialization
/// (e.g. `https://app.example:8443`).
///
/// Returns `None` for URLs with an opaque origin (`data:`, `mailto:`, ...),
/// which cannot participate in origin matching.
#[must_use]
pub fn origin_of(url: &Url) -> Option<String> {
    match url.origin() {
        origin @ Origin::Tuple(..) => Some(origin.ascii_serialization()),
        Origin::Opaque(_) => None,
    }
}

/// Splits a comma/newline-delimited configuration string into trimmed,
/// non-empty entries.
#[must_use]
pub fn parse_redirect_list(value: &str) -> Vec<String> {
    value
        .split([',', '\n'])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses a single redirect entry.
///
/// An entry ending in `/*` is a wildcard: the suffix is stripped, the
/// remainder normalized, and only the derived origin is kept. Any other
/// entry is normalized whole and kept with both its exact URL and origin.
#[must_use]
pub fn parse_redirect_entry(raw: &str) -> Option<ParsedRedirect> {
    let raw = sanitize(raw)?;

    if let Some(base) = raw.strip_suffix(WILDCARD_SUFFIX) {
        let url = normalize_url(base)?;
        let origin = origin_of(&url)?;
        return Some(ParsedRedirect::WildcardOrigin { origin });
    }

    let url = normalize_url(&raw)?;
    let origin = origin_of(&url)?;
    Some(ParsedRedirect::Exact { url, origin })
}
