//! HTML rewriting.
//!
//! # Responsibilities
//! - Run the absolute URL pre-pass over the raw document
//! - Rewrite `href`/`src` attributes through the engine
//! - Rewrite CSS in `<style>` elements and `style` attributes
//! - Rewrite JS in inline `<script>` elements (no `src`)
//! - Inject the fetch/XHR bootstrap at the end of `<head>`
//!
//! # Design Decisions
//! - The pre-pass runs before the tree pass and leaves attribute values and
//!   CSS `url(...)` to it; the engine's proxied-URL check keeps reruns stable
//! - Attribute values are entity-decoded before resolution
//! - lol_html tokenizes the document and edits attributes and text nodes in
//!   place; no string splicing over markup
//! - Script and style text arrives in chunks and is buffered until the last
//!   chunk of the text node
//! - Documents without `<head>` get no bootstrap

use std::borrow::Cow;

use html_escape::{decode_html_entities, encode_double_quoted_attribute};
use lol_html::html_content::{ContentType, Element};
use lol_html::{element, rewrite_str, text, RewriteStrSettings};

use super::bootstrap::{bootstrap_script, BOOTSTRAP_MARKER};
use super::css::rewrite_css;
use super::js::rewrite_js;
use super::prepass::rewrite_absolute_urls_in_markup;
use super::{RewriteError, RewriteScope};

/// Rewrite an HTML document so every reference routes through the proxy.
pub fn rewrite_html(scope: &RewriteScope<'_>, html: &str) -> Result<String, RewriteError> {
    let html = rewrite_absolute_urls_in_markup(scope, html);

    let bootstrap = if html.contains(BOOTSTRAP_MARKER) {
        None
    } else {
        Some(bootstrap_script(
            scope.rewriter,
            scope.base.as_str(),
            scope.token,
        ))
    };

    let mut style_text = String::new();
    let mut script_text = String::new();

    let output = rewrite_str(
        &html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("[href]", |el| {
                    rewrite_url_attribute(scope, el, "href");
                    Ok(())
                }),
                element!("[src]", |el| {
                    rewrite_url_attribute(scope, el, "src");
                    Ok(())
                }),
                element!("[style]", |el| {
                    if let Some(style) = el.get_attribute("style") {
                        let style = decode_html_entities(&style);
                        let rewritten = rewrite_css(scope, &style);
                        if rewritten != style {
                            el.set_attribute("style", &encode_double_quoted_attribute(&rewritten))?;
                        }
                    }
                    Ok(())
                }),
                text!("style", |chunk| {
                    style_text.push_str(chunk.as_str());
                    if chunk.last_in_text_node() {
                        let css = std::mem::take(&mut style_text);
                        chunk.replace(&rewrite_css(scope, &css), ContentType::Html);
                    } else {
                        chunk.remove();
                    }
                    Ok(())
                }),
                text!("script:not([src])", |chunk| {
                    script_text.push_str(chunk.as_str());
                    if chunk.last_in_text_node() {
                        let js = std::mem::take(&mut script_text);
                        chunk.replace(&rewrite_js(scope, &js), ContentType::Html);
                    } else {
                        chunk.remove();
                    }
                    Ok(())
                }),
                element!("head", |el| {
                    if let Some(script) = &bootstrap {
                        el.append(script, ContentType::Html);
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    )?;

    Ok(output)
}

fn rewrite_url_attribute(scope: &RewriteScope<'_>, el: &mut Element<'_, '_>, name: &str) {
    let Some(value) = el.get_attribute(name) else {
        return;
    };
    let decoded = decode_html_entities(&value);
    if let Cow::Owned(rewritten) = scope.url(&decoded) {
        if let Err(e) = el.set_attribute(name, &rewritten) {
            tracing::debug!(attribute = name, error = %e, "Skipping attribute");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::UrlRewriter;
    use url::Url;

    fn run(html: &str, token: Option<&str>) -> String {
        let rewriter = UrlRewriter::new("/web");
        let base = Url::parse("https://example.com/dir/page.html").unwrap();
        rewrite_html(&RewriteScope::new(&rewriter, &base, token), html).unwrap()
    }

    #[test]
    fn test_href_and_src_are_rewritten() {
        let out = run(
            r##"<a href="/about">a</a><img src="img/x.png"><a href="#top">t</a>"##,
            Some("K"),
        );
        assert!(out.contains(r#"href="/web?url=https%3A%2F%2Fexample.com%2Fabout&token=K""#));
        assert!(out.contains(r#"src="/web?url=https%3A%2F%2Fexample.com%2Fdir%2Fimg%2Fx.png&token=K""#));
        assert!(out.contains(r##"href="#top""##));
    }

    #[test]
    fn test_absolute_links_go_through_prepass_once() {
        let out = run(r#"<a href="https://other.org/x">x</a> see https://other.org/y"#, None);
        assert!(out.contains(r#"href="/web?url=https%3A%2F%2Fother.org%2Fx""#));
        assert!(out.contains("see /web?url=https%3A%2F%2Fother.org%2Fy"));
        assert!(!out.contains("%252F"));
    }

    #[test]
    fn test_style_element_and_attribute() {
        let out = run(
            r#"<style>body{background:url(bg.png)}</style><div style="background:url('d.png')"></div>"#,
            None,
        );
        assert!(out.contains("url(/web?url=https%3A%2F%2Fexample.com%2Fdir%2Fbg.png)"));
        assert!(out.contains("url(/web?url=https%3A%2F%2Fexample.com%2Fdir%2Fd.png)"));
    }

    #[test]
    fn test_inline_script_is_rewritten_and_external_kept() {
        let out = run(
            r#"<script>var o = location.origin; import("./m.js");</script><script src="app.js"></script>"#,
            None,
        );
        assert!(out.contains(r#"var o = "https://example.com";"#));
        assert!(out.contains("import('/web?url=https%3A%2F%2Fexample.com%2Fdir%2Fm.js')"));
        assert!(out.contains(r#"src="/web?url=https%3A%2F%2Fexample.com%2Fdir%2Fapp.js""#));
    }

    #[test]
    fn test_script_markup_is_not_escaped() {
        let out = run("<script>if (a < b && c > d) {}</script>", None);
        assert!(out.contains("if (a < b && c > d) {}"));
    }

    #[test]
    fn test_bootstrap_injected_into_head() {
        let out = run("<html><head><title>t</title></head><body></body></html>", Some("K"));
        let head_end = out.find("</head>").unwrap();
        let marker = out.find(BOOTSTRAP_MARKER).unwrap();
        assert!(marker < head_end);
        assert!(out.contains("window.fetch = function"));
    }

    #[test]
    fn test_no_head_no_bootstrap() {
        let out = run("<p>fragment</p>", None);
        assert!(!out.contains(BOOTSTRAP_MARKER));
        assert_eq!(out, "<p>fragment</p>");
    }

    #[test]
    fn test_rewriting_twice_is_stable() {
        let html = r#"<html><head><link rel="stylesheet" href="s.css"><style>a{background:url(a.png)}</style></head>
<body><a href="https://other.org/">o</a><img src="/i.png" style="background:url(b.png)">
<script>fetch("https://api.org/v1"); import("./c.js");</script>https://plain.org/z</body></html>"#;

        let once = run(html, Some("K"));
        let twice = run(&once, Some("K"));
        assert_eq!(once, twice);
        assert_eq!(once.matches(BOOTSTRAP_MARKER).count(), 1);
    }

    #[test]
    fn test_absolute_css_urls_keep_their_parentheses() {
        let out = run(
            r#"<style>body{background:url(https://x.org/a.png)}</style><div style="background:url(https://x.org/b.png)"></div>"#,
            None,
        );
        assert!(out.contains("<style>body{background:url(/web?url=https%3A%2F%2Fx.org%2Fa.png)}</style>"));
        assert!(out.contains(r#"style="background:url(/web?url=https%3A%2F%2Fx.org%2Fb.png)""#));
    }

    #[test]
    fn test_attribute_entities_are_decoded_before_proxying() {
        let out = run(
            r#"<a href="/p?a=1&amp;b=2">p</a><a href="https://x.org/q?a=1&amp;b=2">q</a>"#,
            None,
        );
        assert!(out.contains(r#"href="/web?url=https%3A%2F%2Fexample.com%2Fp%3Fa%3D1%26b%3D2""#));
        assert!(out.contains(r#"href="/web?url=https%3A%2F%2Fx.org%2Fq%3Fa%3D1%26b%3D2""#));
    }

    #[test]
    fn test_rewritten_style_attribute_is_escaped() {
        let out = run(r#"<div style="background:url(&quot;d.png&quot;)"></div>"#, Some("K"));
        assert!(out.contains(
            r#"style="background:url(/web?url=https%3A%2F%2Fexample.com%2Fdir%2Fd.png&amp;token=K)""#
        ));
        assert_eq!(run(&out, Some("K")), out);
    }
}
