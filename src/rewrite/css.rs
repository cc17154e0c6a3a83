//! CSS rewriting: every `url(...)` reference goes through the proxy.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::RewriteScope;

static CSS_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)url\(([^)]+)\)").expect("css url pattern"));

/// Rewrite the `url(...)` references of a stylesheet or style attribute.
///
/// `data:` references, fragments and unresolvable references keep their
/// original `url(...)` text. Rewritten references are emitted unquoted.
pub fn rewrite_css<'t>(scope: &RewriteScope<'_>, css: &'t str) -> Cow<'t, str> {
    CSS_URL.replace_all(css, |caps: &Captures<'_>| {
        let reference = caps[1].trim().trim_matches(|c| c == '"' || c == '\'');
        match scope.url(reference) {
            Cow::Owned(proxied) => format!("url({proxied})"),
            Cow::Borrowed(_) => caps[0].to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::UrlRewriter;
    use url::Url;

    fn run(css: &str, base: &str, token: Option<&str>) -> String {
        let rewriter = UrlRewriter::new("/web");
        let base = Url::parse(base).unwrap();
        rewrite_css(&RewriteScope::new(&rewriter, &base, token), css).into_owned()
    }

    #[test]
    fn test_relative_url_resolves_against_stylesheet() {
        assert_eq!(
            run("background: url(../img.png)", "https://example.com/a/b/c.css", None),
            "background: url(/web?url=https%3A%2F%2Fexample.com%2Fa%2Fimg.png)"
        );
    }

    #[test]
    fn test_parent_ref_in_a_b_css_is_root_img_per_rfc3986_not_a_img() {
        // `../` from directory `/a/` climbs to `/`, so `/a/img.png` would be wrong
        assert_eq!(
            run("background: url(../img.png)", "https://example.com/a/b.css", None),
            "background: url(/web?url=https%3A%2F%2Fexample.com%2Fimg.png)"
        );
    }

    #[test]
    fn test_quoted_urls_and_token() {
        let out = run(
            r#"a{src:url("f.woff2")} b{src:url( 'g.woff' )}"#,
            "https://example.com/css/site.css",
            Some("K"),
        );
        assert_eq!(
            out,
            "a{src:url(/web?url=https%3A%2F%2Fexample.com%2Fcss%2Ff.woff2&token=K)} \
             b{src:url(/web?url=https%3A%2F%2Fexample.com%2Fcss%2Fg.woff&token=K)}"
        );
    }

    #[test]
    fn test_data_and_fragment_urls_untouched() {
        let css = r#"a{background:url("data:image/png;base64,AAA")} b{filter:url(#blur)}"#;
        assert_eq!(run(css, "https://example.com/", None), css);
    }

    #[test]
    fn test_malformed_url_untouched() {
        let css = "a{background:url(http://[::1)}";
        assert_eq!(run(css, "https://example.com/", None), css);
    }

    #[test]
    fn test_idempotent() {
        let once = run("a{background:url(x.png)} b{background:URL('y.png')}", "https://example.com/", Some("K"));
        let twice = run(&once, "https://example.com/", Some("K"));
        assert_eq!(once, twice);
    }
}
