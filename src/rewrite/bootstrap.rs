//! Client-side bootstrap injected into proxied HTML documents.
//!
//! At runtime the script wraps `window.fetch` and
//! `XMLHttpRequest.prototype.open` so requests issued by page scripts use the
//! same proxy URL formula as `UrlRewriter::proxy_url`.
//!
//! The source must stay a fixpoint of the JS rewriter: no literal
//! `http(s)://`, no `location.origin`, no `import(`. The document URL is
//! embedded percent-encoded for that reason.

use super::UrlRewriter;

/// Attribute marking the injected `<script>`; its presence skips injection.
pub const BOOTSTRAP_MARKER: &str = "data-rewrite-proxy";

const TEMPLATE: &str = r#"<script data-rewrite-proxy="bootstrap">
(function() {
    var token = __TOKEN__;
    var proxyPath = __PROXY_BASE__;
    var documentUrl = decodeURIComponent(__DOCUMENT_URL__);
    var proxyPrefix = window.location.protocol + '//' + window.location.host + proxyPath + '?url=';

    function proxied(original) {
        var raw = String(original);
        if (raw.indexOf(proxyPath + '?url=') === 0 || raw.indexOf(proxyPrefix) === 0) {
            return raw;
        }
        var absolute;
        try {
            absolute = new URL(raw, documentUrl);
        } catch (e) {
            return raw;
        }
        if (absolute.protocol !== 'http:' && absolute.protocol !== 'https:') {
            return raw;
        }
        var suffix = token ? '&token=' + token : '';
        return proxyPath + '?url=' + encodeURIComponent(absolute.href) + suffix;
    }

    var originalFetch = window.fetch;
    if (originalFetch) {
        window.fetch = function(input, init) {
            if (input instanceof Request) {
                input = new Request(proxied(input.url), input);
            } else {
                input = proxied(input);
            }
            return originalFetch.call(this, input, init);
        };
    }

    var originalOpen = window.XMLHttpRequest.prototype.open;
    window.XMLHttpRequest.prototype.open = function(method, url) {
        var args = Array.prototype.slice.call(arguments);
        args[1] = proxied(url);
        return originalOpen.apply(this, args);
    };
})();
</script>"#;

/// Render the bootstrap `<script>` for one document.
pub fn bootstrap_script(rewriter: &UrlRewriter, document_url: &str, token: Option<&str>) -> String {
    TEMPLATE
        .replace("__TOKEN__", &js_string(token.unwrap_or_default()))
        .replace("__PROXY_BASE__", &js_string(rewriter.proxy_base()))
        .replace(
            "__DOCUMENT_URL__",
            &js_string(&urlencoding::encode(document_url)),
        )
}

/// JSON string literals are valid JavaScript string literals.
fn js_string(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    // keep "</script>" inside a token from closing the element
    quoted.replace("</", "<\\/")
}
