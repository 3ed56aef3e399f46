//! Request context handed to the route resolver

use url::form_urlencoded;

/// Path and query of one inbound request
///
/// `path` is relative to the site base path and carries no leading slash
/// (`news/7/`); a trailing slash is kept as sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    path: String,
    query: Vec<(String, String)>,
}

impl RequestContext {
    /// Create from an already-relative path and query pairs
    pub fn new(path: impl Into<String>, query: Vec<(String, String)>) -> Self {
        let path = path.into();
        Self {
            path: path.trim_start_matches('/').to_string(),
            query,
        }
    }

    /// Create from a request path, its raw query string and the site base path
    ///
    /// The base path prefix (`/blog/`) is stripped when present.
    pub fn from_parts(path: &str, query: Option<&str>, base_path: &str) -> Self {
        let base = base_path.trim_matches('/');
        let trimmed = path.trim_start_matches('/');

        let relative = if base.is_empty() {
            trimmed
        } else if trimmed == base {
            ""
        } else {
            trimmed
                .strip_prefix(base)
                .and_then(|rest| rest.strip_prefix('/'))
                .unwrap_or(trimmed)
        };

        let query = query
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Self::new(relative, query)
    }

    /// Parse a request target such as `/news/7/?utm=x`
    pub fn parse(target: &str, base_path: &str) -> Self {
        match target.split_once('?') {
            Some((path, query)) => Self::from_parts(path, Some(query), base_path),
            None => Self::from_parts(target, None, base_path),
        }
    }

    /// Relative path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query pairs in request order
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// First value for a query parameter
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Copy without the named query parameter
    pub fn without_query_param(&self, name: &str) -> Self {
        Self {
            path: self.path.clone(),
            query: self
                .query
                .iter()
                .filter(|(k, _)| k != name)
                .cloned()
                .collect(),
        }
    }
}
