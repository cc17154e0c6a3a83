//! Absolute URL pre-pass.
//!
//! Catches `http(s)://` URLs in places a tree walk never sees as
//! attributes: plain text, string literals, JSON values.
//!
//! - `"https://…"` / `'https://…'`: rewritten, quotes kept
//! - bare `https://…`: rewritten unless directly preceded by `=`
//!   (an unquoted attribute value, left for the attribute pass); the match
//!   stops at CSS and JS delimiters so `url(...)` and call syntax survive
//!
//! Over markup, values after `=` and inside `url(` are skipped entirely:
//! the attribute and CSS passes own them. URLs found in markup text are
//! entity-decoded before they reach the engine.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::RewriteScope;

static ABSOLUTE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"(https?://[^"]+)"|'(https?://[^']+)'|(https?://[^\s"'<>`(){}\[\];,]+)"#)
        .expect("absolute url pattern")
});

/// Rewrite every absolute http(s) URL found in script or plain text.
pub fn rewrite_absolute_urls<'t>(scope: &RewriteScope<'_>, text: &'t str) -> Cow<'t, str> {
    rewrite(scope, text, false)
}

/// Rewrite absolute URLs in raw HTML, leaving attribute values and CSS
/// `url(...)` references to the tree pass.
pub fn rewrite_absolute_urls_in_markup<'t>(scope: &RewriteScope<'_>, text: &'t str) -> Cow<'t, str> {
    rewrite(scope, text, true)
}

fn rewrite<'t>(scope: &RewriteScope<'_>, text: &'t str, markup: bool) -> Cow<'t, str> {
    ABSOLUTE_URL.replace_all(text, |caps: &Captures<'_>| {
        let whole = &caps[0];
        let start = caps.get(0).map_or(0, |m| m.start());
        let before = &text[..start];

        if markup && owned_by_tree_pass(before) {
            return whole.to_string();
        }

        if let Some(quoted) = caps.get(1).or_else(|| caps.get(2)) {
            let quote = &whole[..1];
            return format!("{quote}{}{quote}", proxy(scope, quoted.as_str(), markup));
        }

        if before.ends_with('=') {
            return whole.to_string();
        }

        proxy(scope, whole, markup)
    })
}

/// Attribute values and CSS `url(` arguments.
fn owned_by_tree_pass(before: &str) -> bool {
    let before = before.trim_end();
    if before.ends_with('=') {
        return true;
    }
    let len = before.len();
    len >= 4
        && before.is_char_boundary(len - 4)
        && before[len - 4..].eq_ignore_ascii_case("url(")
}

fn proxy(scope: &RewriteScope<'_>, url: &str, markup: bool) -> String {
    if !markup {
        return scope.url(url).into_owned();
    }
    let decoded = html_escape::decode_html_entities(url);
    match scope.url(&decoded) {
        Cow::Owned(proxied) => proxied,
        Cow::Borrowed(_) => url.to_string(),
    }
}
