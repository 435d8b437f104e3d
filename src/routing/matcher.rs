//! Path prefix matching.
//!
//! # Design Decisions
//! - Prefixes are normalized to `/segment[/segment...]` at load time
//! - Matching is segment-aware: `/patients` never matches `/patientsx`
//! - Path matching is case-sensitive
//! - No regex to guarantee O(n) matching

use crate::error::RouteError;

/// Matches an inbound path against one configured prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMatcher {
    prefix: String,
}

impl PrefixMatcher {
    /// Create a matcher from a configured prefix such as `patients`,
    /// `/patients` or `api/v1/`.
    pub fn new(raw: &str) -> Result<Self, RouteError> {
        let trimmed = raw.trim_matches('/');
        let invalid = |reason: &str| RouteError::InvalidPrefix {
            prefix: raw.to_string(),
            reason: reason.to_string(),
        };

        if trimmed.is_empty() {
            return Err(invalid("prefix must not be empty"));
        }
        if trimmed.split('/').any(str::is_empty) {
            return Err(invalid("prefix contains an empty segment"));
        }
        if trimmed
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '?' || c == '#')
        {
            return Err(invalid("prefix contains a character not allowed in a path"));
        }

        Ok(Self {
            prefix: format!("/{}", trimmed),
        })
    }

    /// Normalized prefix, always starting with `/` and never ending with one.
    pub fn as_str(&self) -> &str {
        &self.prefix
    }

    /// Strip the prefix from `path`, returning the remainder (always starting
    /// with `/`), or `None` if the path is outside this prefix.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    /// True if some path could be matched by both matchers.
    pub fn conflicts_with(&self, other: &PrefixMatcher) -> bool {
        self.strip(&other.prefix).is_some() || other.strip(&self.prefix).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        assert_eq!(PrefixMatcher::new("patients").unwrap().as_str(), "/patients");
        assert_eq!(PrefixMatcher::new("/patients/").unwrap().as_str(), "/patients");
        assert_eq!(PrefixMatcher::new("api/v1").unwrap().as_str(), "/api/v1");
    }

    #[test]
    fn test_rejects_bad_prefixes() {
        assert!(PrefixMatcher::new("").is_err());
        assert!(PrefixMatcher::new("/").is_err());
        assert!(PrefixMatcher::new("api//v1").is_err());
        assert!(PrefixMatcher::new("pat ients").is_err());
        assert!(PrefixMatcher::new("patients?x=1").is_err());
    }

    #[test]
    fn test_strip() {
        let matcher = PrefixMatcher::new("patients").unwrap();

        assert_eq!(matcher.strip("/patients/42"), Some("/42"));
        assert_eq!(matcher.strip("/patients/42/visits/"), Some("/42/visits/"));
        assert_eq!(matcher.strip("/patients"), Some("/"));
        assert_eq!(matcher.strip("/patients/"), Some("/"));
        assert_eq!(matcher.strip("/patientsx/1"), None);
        assert_eq!(matcher.strip("/doctors/1"), None);
        assert_eq!(matcher.strip("/Patients/1"), None); // Case sensitive
    }

    #[test]
    fn test_conflicts() {
        let api = PrefixMatcher::new("api").unwrap();
        let api_v1 = PrefixMatcher::new("api/v1").unwrap();
        let apix = PrefixMatcher::new("apix").unwrap();

        assert!(api.conflicts_with(&api_v1));
        assert!(api_v1.conflicts_with(&api));
        assert!(api.conflicts_with(&api.clone()));
        assert!(!api.conflicts_with(&apix));
    }
}
