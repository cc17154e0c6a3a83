//! API key set and bearer token extraction.

use std::collections::HashSet;

use axum::http::{header, HeaderMap};

/// Immutable set of valid bearer tokens, loaded once at startup.
///
/// An empty set authorizes nothing.
#[derive(Debug, Clone, Default)]
pub struct ApiKeySet {
    keys: HashSet<String>,
}

impl ApiKeySet {
    /// Build the set, discarding empty keys.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys
                .into_iter()
                .map(Into::into)
                .filter(|k: &String| !k.is_empty())
                .collect(),
        }
    }

    /// Exact match against the set. Empty tokens never match.
    pub fn contains(&self, token: &str) -> bool {
        !token.is_empty() && self.keys.contains(token)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

/// Extract the token of an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively; every `Authorization` value is
/// inspected and the first bearer token wins.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::AUTHORIZATION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| {
            let (scheme, token) = value.trim().split_once(' ')?;
            let token = token.trim();
            (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
        })
}
