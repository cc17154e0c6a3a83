//! JavaScript (and JSON) rewriting.
//!
//! Three passes, in order:
//! 1. absolute URL pre-pass (see `prepass`)
//! 2. `location.origin` → string literal of the target's origin
//! 3. relative `import("…")` / `import('…')` specifiers → proxy URLs
//!
//! Step 2 is a blind textual substitution: code that assigns to
//! `location.origin` is corrupted.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::prepass::rewrite_absolute_urls;
use super::RewriteScope;

static LOCATION_ORIGIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\blocation\.origin\b").expect("location.origin pattern"));

static DYNAMIC_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)import\(\s*(?:"([^"']+)"|'([^"']+)')\s*\)"#).expect("dynamic import pattern")
});

/// Rewrite a script so the URLs it loads route through the proxy.
pub fn rewrite_js<'t>(scope: &RewriteScope<'_>, js: &'t str) -> Cow<'t, str> {
    let js = rewrite_absolute_urls(scope, js);

    let origin = scope.base.origin().ascii_serialization();
    let js = replace_cow(js, |text| {
        LOCATION_ORIGIN.replace_all(text, |_: &Captures<'_>| format!("\"{origin}\""))
    });

    replace_cow(js, |text| {
        DYNAMIC_IMPORT.replace_all(text, |caps: &Captures<'_>| {
            let specifier = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            if specifier.get(..4).is_some_and(|s| s.eq_ignore_ascii_case("http")) {
                return caps[0].to_string();
            }
            match scope.url(specifier) {
                Cow::Owned(proxied) => format!("import('{proxied}')"),
                Cow::Borrowed(_) => caps[0].to_string(),
            }
        })
    })
}

/// Apply a borrowing pass to a `Cow`, keeping it borrowed when nothing changed.
fn replace_cow<'t, F>(text: Cow<'t, str>, pass: F) -> Cow<'t, str>
where
    F: for<'x> Fn(&'x str) -> Cow<'x, str>,
{
    match text {
        Cow::Borrowed(text) => pass(text),
        Cow::Owned(text) => match pass(&text) {
            Cow::Borrowed(_) => Cow::Owned(text),
            Cow::Owned(changed) => Cow::Owned(changed),
        },
    }
}
