//! URL rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! HTML text
//!     → prepass.rs (bare/quoted absolute URLs in raw text)
//!     → html.rs (href/src attributes, <style>, style=, inline <script>, bootstrap)
//!         → css.rs (url(...) references)
//!         → js.rs (prepass, location.origin, import(...))
//! CSS text → css.rs
//! JS / JSON text → js.rs
//!
//! every reference → UrlRewriter::rewrite (this module)
//!     → "<proxy_base>?url=<percent-encoded absolute URL>[&token=<token>]"
//! ```
//!
//! # Design Decisions
//! - `UrlRewriter` is the single place the proxy URL formula lives
//! - Rewriting is pure: same base, reference and token give the same output
//! - References that already point at the proxy are left alone, which makes
//!   every content rewriter idempotent on proxy URLs
//! - Content rewriters return `RewriteError`; callers fall back to the
//!   original text

pub mod bootstrap;
pub mod css;
pub mod html;
pub mod js;
pub mod prepass;

use std::borrow::Cow;

use thiserror::Error;
use url::Url;

/// Failure inside a content rewriter. Never fatal to a request.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// The document URL could not serve as a base for resolution.
    #[error("invalid base url {url}: {source}")]
    InvalidBase {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The HTML rewriter rejected the document.
    #[error("html rewriting failed: {0}")]
    Html(#[from] lol_html::errors::RewritingError),
}

/// Builds proxy URLs that route a reference back through the proxy.
#[derive(Debug, Clone)]
pub struct UrlRewriter {
    proxy_base: String,
    proxied_prefix: String,
}

impl UrlRewriter {
    /// Create a rewriter whose proxy URLs start with `proxy_base` (e.g. `/web`).
    pub fn new(proxy_base: impl Into<String>) -> Self {
        let proxy_base = proxy_base.into();
        let proxied_prefix = format!("{proxy_base}?url=");
        Self {
            proxy_base,
            proxied_prefix,
        }
    }

    /// The configured proxy endpoint path.
    pub fn proxy_base(&self) -> &str {
        &self.proxy_base
    }

    /// `proxy_base + "?url=" + percentEncode(target) + tokenSuffix`.
    pub fn proxy_url(&self, target: &str, token: Option<&str>) -> String {
        let mut out = String::with_capacity(self.proxied_prefix.len() + target.len() * 2);
        out.push_str(&self.proxied_prefix);
        out.push_str(&urlencoding::encode(target));
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            out.push_str("&token=");
            out.push_str(token);
        }
        out
    }

    /// True when `reference` already routes through this proxy.
    pub fn is_proxied(&self, reference: &str) -> bool {
        reference.starts_with(&self.proxied_prefix)
    }

    /// Resolve `reference` against `base` and wrap it in a proxy URL.
    ///
    /// Returns the reference untouched when it is empty, a fragment, a
    /// `data:` URI, already proxied, unresolvable, or resolves to a
    /// non-http(s) scheme.
    pub fn rewrite<'r>(&self, base: &Url, reference: &'r str, token: Option<&str>) -> Cow<'r, str> {
        if is_exempt(reference) || self.is_proxied(reference) {
            return Cow::Borrowed(reference);
        }

        match base.join(reference) {
            Ok(absolute) if matches!(absolute.scheme(), "http" | "https") => {
                Cow::Owned(self.proxy_url(absolute.as_str(), token))
            }
            _ => Cow::Borrowed(reference),
        }
    }
}

/// References the rewriter never touches.
fn is_exempt(reference: &str) -> bool {
    reference.is_empty()
        || reference.starts_with('#')
        || reference
            .get(..5)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Everything a content rewriter needs to rewrite one document.
#[derive(Debug, Clone, Copy)]
pub struct RewriteScope<'a> {
    pub rewriter: &'a UrlRewriter,
    /// URL of the document being rewritten.
    pub base: &'a Url,
    pub token: Option<&'a str>,
}

impl<'a> RewriteScope<'a> {
    pub fn new(rewriter: &'a UrlRewriter, base: &'a Url, token: Option<&'a str>) -> Self {
        Self {
            rewriter,
            base,
            token,
        }
    }

    /// Rewrite one reference found in this document.
    pub fn url<'r>(&self, reference: &'r str) -> Cow<'r, str> {
        self.rewriter.rewrite(self.base, reference, self.token)
    }
}

/// Parse a document URL for use as a resolution base.
pub fn parse_base(url: &str) -> Result<Url, RewriteError> {
    Url::parse(url).map_err(|source| RewriteError::InvalidBase {
        url: url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/a/b.html").unwrap()
    }

    fn target_of(proxy_url: &str) -> String {
        let query = proxy_url.split_once('?').unwrap().1;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == "url")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[test]
    fn test_relative_reference_resolves_against_base() {
        let rewriter = UrlRewriter::new("/web");
        let out = rewriter.rewrite(&base(), "../img/logo.png", Some("K"));

        assert_eq!(target_of(&out), "https://example.com/img/logo.png");
        assert!(out.ends_with("&token=K"));
    }

    #[test]
    fn test_token_suffix_only_when_present() {
        let rewriter = UrlRewriter::new("/web");
        for token in [None, Some("")] {
            let out = rewriter.rewrite(&base(), "c.css", token);
            assert_eq!(out, "/web?url=https%3A%2F%2Fexample.com%2Fa%2Fc.css");
        }
    }

    #[test]
    fn test_exempt_references_are_untouched() {
        let rewriter = UrlRewriter::new("/web");
        for reference in ["", "#", "#top", "data:image/png;base64,AAAA", "DATA:text/plain,x"] {
            let out = rewriter.rewrite(&base(), reference, Some("K"));
            assert!(matches!(out, Cow::Borrowed(_)));
            assert_eq!(out, reference);
        }
    }

    #[test]
    fn test_malformed_reference_is_untouched() {
        let rewriter = UrlRewriter::new("/web");
        assert_eq!(rewriter.rewrite(&base(), "http://[::1", None), "http://[::1");
        assert_eq!(rewriter.rewrite(&base(), "https://exa mple.com/", None), "https://exa mple.com/");
    }

    #[test]
    fn test_non_http_schemes_are_untouched() {
        let rewriter = UrlRewriter::new("/web");
        for reference in ["javascript:void(0)", "mailto:a@b.c", "tel:123"] {
            assert_eq!(rewriter.rewrite(&base(), reference, None), reference);
        }
    }

    #[test]
    fn test_proxied_reference_is_not_wrapped_twice() {
        let rewriter = UrlRewriter::new("/web");
        let once = rewriter.rewrite(&base(), "/x.js", Some("K")).into_owned();
        let twice = rewriter.rewrite(&base(), &once, Some("K"));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_absolute_reference_is_encoded() {
        let rewriter = UrlRewriter::new("/web");
        let out = rewriter.rewrite(&base(), "http://other.org/p?q=1&r=2", None);
        assert_eq!(out, "/web?url=http%3A%2F%2Fother.org%2Fp%3Fq%3D1%26r%3D2");
    }

    #[test]
    fn test_custom_proxy_base() {
        let rewriter = UrlRewriter::new("/p/web");
        assert_eq!(rewriter.proxy_base(), "/p/web");
        assert!(rewriter.rewrite(&base(), "x", None).starts_with("/p/web?url="));
    }

    #[test]
    fn test_invalid_base() {
        assert!(matches!(
            parse_base("not a url"),
            Err(RewriteError::InvalidBase { .. })
        ));
    }
}
