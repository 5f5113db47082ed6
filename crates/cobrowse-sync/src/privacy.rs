//! Private route classification.
//!
//! Only the host classifies. The guest adopts whatever the host last
//! announced in a `PRIVACY_TOGGLE`.

/// Route prefixes private when no configuration overrides them.
pub const DEFAULT_PRIVATE_PREFIXES: &[&str] =
    &["/account", "/checkout", "/wallet", "/orders", "/profile"];

/// Whether the currently mirrored view must be hidden from the guest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrivacyState {
    pub is_private: bool,
}

/// Prefix list deciding which routes are private.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivacyPolicy {
    prefixes: Vec<String>,
}

impl Default for PrivacyPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PRIVATE_PREFIXES.iter().copied())
    }
}

impl PrivacyPolicy {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefixes = prefixes
            .into_iter()
            .map(|p| p.as_ref().trim().trim_end_matches('/').to_string())
            .collect();
        Self { prefixes }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// True iff `path` equals a prefix or continues it at a `/` boundary.
    /// Query strings and fragments are ignored.
    pub fn classify(&self, path: &str) -> bool {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        self.prefixes.iter().any(|prefix| {
            // An empty prefix came from "/" and covers every route.
            prefix.is_empty()
                || path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}
