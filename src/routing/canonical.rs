//! Canonical URL comparison

use url::{form_urlencoded, Url};

use super::request::RequestContext;

/// Comparison form of a URL: no query or fragment, lowercase, trailing slash
pub fn normalize_for_compare(url: &str) -> String {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let mut normalized = url[..end].to_lowercase();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

/// Absolute URL the request was made for, without its query
pub fn requested_url(base_url: &Url, ctx: &RequestContext) -> String {
    format!("{}{}", base_url.as_str(), ctx.path())
}

/// `url` with the request's query pairs appended
pub fn with_query(url: &Url, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return url.to_string();
    }

    let mut target = url.clone();
    target.set_query(None);
    let encoded = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish();
    target.set_query(Some(&encoded));
    target.to_string()
}

/// Redirect target when the request differs from `canonical`, query reattached
pub fn canonical_redirect(base_url: &Url, ctx: &RequestContext, canonical: &Url) -> Option<String> {
    let requested = normalize_for_compare(&requested_url(base_url, ctx));
    if requested == normalize_for_compare(canonical.as_str()) {
        return None;
    }
    Some(with_query(canonical, ctx.query()))
}
