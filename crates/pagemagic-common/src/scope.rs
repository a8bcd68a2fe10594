//! Storage scope for a page: one exact page or a whole origin.
//!
//! History and applied CSS are namespaced by a [`ScopeKey`]. The key is
//! built from the page URL (query and fragment ignored) and serialises to
//! `origin + path` for page scope or to `origin` alone for domain scope.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::PageMagicError;

/// Granularity of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    #[default]
    Page,
    Domain,
}

impl ScopeKind {
    pub fn from_domain_wide(domain_wide: bool) -> Self {
        if domain_wide {
            Self::Domain
        } else {
            Self::Page
        }
    }

    pub fn is_domain_wide(self) -> bool {
        matches!(self, Self::Domain)
    }

    /// Human label used in site listings.
    pub fn label(self) -> &'static str {
        match self {
            Self::Page => "Specific page",
            Self::Domain => "Entire domain",
        }
    }
}

/// Structured storage scope: an origin plus an optional normalised path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeKey {
    origin: String,
    path: Option<String>,
}

impl ScopeKey {
    /// Build the scope of `url` at the given granularity.
    ///
    /// Fails for URLs with an opaque origin (`file:`, `data:`, `chrome:` ...),
    /// which cannot be customised.
    pub fn from_url(url: &Url, kind: ScopeKind) -> Result<Self, PageMagicError> {
        let origin = url.origin();
        if !origin.is_tuple() {
            return Err(PageMagicError::InvalidUrl(format!(
                "{url} has no web origin"
            )));
        }

        let path = match kind {
            ScopeKind::Domain => None,
            ScopeKind::Page => Some(normalize_path(url.path())),
        };

        Ok(Self {
            origin: origin.ascii_serialization(),
            path,
        })
    }

    /// Parse `raw` as a URL and build its scope.
    pub fn parse_url(raw: &str, kind: ScopeKind) -> Result<Self, PageMagicError> {
        let url = Url::parse(raw).map_err(|e| PageMagicError::InvalidUrl(format!("{raw}: {e}")))?;
        Self::from_url(&url, kind)
    }

    /// Rebuild a scope from its serialised suffix (see [`ScopeKey::to_suffix`]).
    pub fn from_suffix(suffix: &str) -> Result<Self, PageMagicError> {
        let url =
            Url::parse(suffix).map_err(|e| PageMagicError::InvalidUrl(format!("{suffix}: {e}")))?;
        let origin = url.origin();
        if !origin.is_tuple() {
            return Err(PageMagicError::InvalidUrl(format!(
                "{suffix} has no web origin"
            )));
        }
        let origin = origin.ascii_serialization();

        if suffix == origin {
            Ok(Self { origin, path: None })
        } else {
            Ok(Self {
                origin,
                path: Some(url.path().to_string()),
            })
        }
    }

    pub fn kind(&self) -> ScopeKind {
        if self.path.is_some() {
            ScopeKind::Page
        } else {
            ScopeKind::Domain
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Serialised form used as the storage-key suffix.
    pub fn to_suffix(&self) -> String {
        match &self.path {
            Some(path) => format!("{}{}", self.origin, path),
            None => self.origin.clone(),
        }
    }

    /// A navigable URL for this scope.
    pub fn display_url(&self) -> String {
        format!("{}{}", self.origin, self.path.as_deref().unwrap_or("/"))
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_suffix())
    }
}

/// Drop a single trailing slash unless the path is the root.
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_scope_ignores_query_and_fragment() {
        let scope =
            ScopeKey::parse_url("https://example.com/docs/intro?x=1#top", ScopeKind::Page).unwrap();
        assert_eq!(scope.origin(), "https://example.com");
        assert_eq!(scope.path(), Some("/docs/intro"));
        assert_eq!(scope.to_suffix(), "https://example.com/docs/intro");
        assert_eq!(scope.kind(), ScopeKind::Page);
    }

    #[test]
    fn page_scope_strips_trailing_slash() {
        let scope = ScopeKey::parse_url("https://example.com/docs/", ScopeKind::Page).unwrap();
        assert_eq!(scope.to_suffix(), "https://example.com/docs");
    }

    #[test]
    fn page_scope_keeps_root_slash() {
        let scope = ScopeKey::parse_url("https://example.com", ScopeKind::Page).unwrap();
        assert_eq!(scope.to_suffix(), "https://example.com/");
        assert_eq!(scope.kind(), ScopeKind::Page);
    }

    #[test]
    fn domain_scope_is_origin_only() {
        let scope =
            ScopeKey::parse_url("http://example.com:8080/a/b", ScopeKind::Domain).unwrap();
        assert_eq!(scope.to_suffix(), "http://example.com:8080");
        assert_eq!(scope.kind(), ScopeKind::Domain);
        assert_eq!(scope.display_url(), "http://example.com:8080/");
    }

    #[test]
    fn opaque_origin_is_rejected() {
        let err = ScopeKey::parse_url("data:text/html,hello", ScopeKind::Page).unwrap_err();
        assert!(matches!(err, PageMagicError::InvalidUrl(_)));
    }

    #[test]
    fn unparsable_url_is_rejected() {
        assert!(ScopeKey::parse_url("not a url", ScopeKind::Domain).is_err());
    }

    #[test]
    fn suffix_round_trips_for_both_kinds() {
        for (raw, kind) in [
            ("https://example.com/a/b/", ScopeKind::Page),
            ("https://example.com/", ScopeKind::Page),
            ("https://example.com/a", ScopeKind::Domain),
        ] {
            let scope = ScopeKey::parse_url(raw, kind).unwrap();
            let parsed = ScopeKey::from_suffix(&scope.to_suffix()).unwrap();
            assert_eq!(parsed, scope, "{raw}");
        }
    }

    #[test]
    fn scope_kind_from_domain_wide() {
        assert_eq!(ScopeKind::from_domain_wide(true), ScopeKind::Domain);
        assert_eq!(ScopeKind::from_domain_wide(false), ScopeKind::Page);
        assert!(ScopeKind::Domain.is_domain_wide());
        assert_eq!(ScopeKind::Page.label(), "Specific page");
    }
}
