use crate::endpoint::Endpoint;
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tracing::{debug, info, trace, warn};

static TEMPLATE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}/]+)\}").expect("valid template param regex"));

/// Resolves observed requests to the operations declared in a contract.
///
/// Each (path, method, operation) triple is registered once in a radix tree
/// per HTTP method. The router is immutable once built: one build per run,
/// then any number of lookups.
pub struct RequestMatcher {
    /// matchit trie for each HTTP method. Values index into `routes`.
    method_trees: HashMap<String, matchit::Router<usize>>,
    /// Templates matchit cannot express (several params in one segment,
    /// e.g. `/reports/{year}-{month}`), tried in registration order after
    /// the trie misses.
    segment_patterns: HashMap<String, Vec<SegmentPattern>>,
    /// Registered routes, in registration order.
    routes: Vec<RouteTarget>,
}

/// A registered route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTarget {
    pub operation_id: String,
    pub method: String,
    /// Template as written in the contract
    pub template: String,
    /// Parameter names in template order
    pub param_names: Vec<String>,
}

/// Anchored regex for a template registered outside the trie.
struct SegmentPattern {
    pattern: Regex,
    route: usize,
}

/// Result of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub operation_id: String,
    pub template: String,
    pub params: Vec<(String, String)>,
}

impl RequestMatcher {
    /// Build the route table from the extracted endpoints.
    ///
    /// Endpoints repeat once per status code; only the first occurrence of
    /// each (path, method, operation) is registered. When two operations
    /// claim the same path and method, the first one registered wins.
    pub fn build(endpoints: &[Endpoint]) -> Self {
        let mut method_trees: HashMap<String, matchit::Router<usize>> = HashMap::new();
        let mut segment_patterns: HashMap<String, Vec<SegmentPattern>> = HashMap::new();
        let mut routes = Vec::new();
        let mut seen: HashSet<(&str, &str, &str)> = HashSet::new();

        for endpoint in endpoints {
            let key = (
                endpoint.path.as_str(),
                endpoint.method.as_str(),
                endpoint.operation_id.as_str(),
            );
            if !seen.insert(key) {
                continue;
            }

            let (path, param_names) = normalize_template(&endpoint.path);
            let method = endpoint.method.to_ascii_uppercase();
            let tree = method_trees
                .entry(method.clone())
                .or_insert_with(matchit::Router::new);

            match tree.insert(path.as_str(), routes.len()) {
                Ok(()) => {}
                Err(e @ matchit::InsertError::Conflict { .. }) => {
                    warn!(
                        operation_id = %endpoint.operation_id,
                        method = %method,
                        path = %endpoint.path,
                        "Failed to register route: {e}"
                    );
                    continue;
                }
                Err(e) => {
                    let Some(pattern) = segment_pattern(&path) else {
                        warn!(
                            operation_id = %endpoint.operation_id,
                            method = %method,
                            path = %endpoint.path,
                            "Failed to register route: {e}"
                        );
                        continue;
                    };
                    debug!(
                        path = %endpoint.path,
                        "Template outside trie syntax, matching by pattern"
                    );
                    segment_patterns
                        .entry(method.clone())
                        .or_default()
                        .push(SegmentPattern {
                            pattern,
                            route: routes.len(),
                        });
                }
            }

            routes.push(RouteTarget {
                operation_id: endpoint.operation_id.clone(),
                method,
                template: endpoint.path.clone(),
                param_names,
            });
        }

        info!(
            routes = routes.len(),
            methods = method_trees.len(),
            patterns = segment_patterns.values().map(Vec::len).sum::<usize>(),
            "Request matcher built"
        );

        Self {
            method_trees,
            segment_patterns,
            routes,
        }
    }

    /// Resolve a method and raw URL to the operation that would serve it.
    ///
    /// Not-found and method-not-allowed both come back as `None`.
    pub fn resolve(&self, method: &str, raw_url: &str) -> Option<RouteMatch> {
        let Some(path) = canonical_path(raw_url) else {
            debug!(url = %raw_url, "Unparseable request target");
            return None;
        };

        let method = method.to_ascii_uppercase();
        let Some((route, values)) = self.lookup(&method, &path) else {
            trace!(method = %method, path = %path, "No route matched");
            return None;
        };

        let target = &self.routes[route];
        let params = target.param_names.iter().cloned().zip(values).collect();

        trace!(
            operation_id = %target.operation_id,
            method = %method,
            path = %path,
            "Route matched"
        );
        Some(RouteMatch {
            operation_id: target.operation_id.clone(),
            template: target.template.clone(),
            params,
        })
    }

    /// Trie first, then pattern routes. Returns the route index and the
    /// parameter values in template order.
    fn lookup(&self, method: &str, path: &str) -> Option<(usize, Vec<String>)> {
        if let Some(tree) = self.method_trees.get(method)
            && let Ok(matched) = tree.at(path)
            // `{param}` stands for exactly one non-empty segment.
            && matched.params.iter().all(|(_, value)| !value.is_empty())
        {
            let values = matched.params.iter().map(|(_, value)| value.to_string()).collect();
            return Some((*matched.value, values));
        }

        self.segment_patterns.get(method)?.iter().find_map(|sp| {
            let caps = sp.pattern.captures(path)?;
            let values = caps
                .iter()
                .skip(1)
                .map(|m| m.map_or_else(String::new, |m| m.as_str().to_string()))
                .collect();
            Some((sp.route, values))
        })
    }

    /// Registered routes in registration order.
    pub fn routes(&self) -> &[RouteTarget] {
        &self.routes
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Rewrite `{name}` placeholders to positional `{p0}`, `{p1}`, ... so that
/// templates differing only in parameter names share tree nodes.
///
/// Returns the rewritten path and the original names in order.
fn normalize_template(template: &str) -> (String, Vec<String>) {
    let mut names = Vec::new();
    let path = TEMPLATE_PARAM
        .replace_all(template, |caps: &Captures<'_>| {
            let position = names.len();
            names.push(caps[1].to_string());
            format!("{{p{position}}}")
        })
        .into_owned();
    (path, names)
}

/// Anchored regex for a normalized template: literals match verbatim and
/// each `{pN}` captures a non-empty run within one segment.
fn segment_pattern(normalized: &str) -> Option<Regex> {
    let mut pattern = String::from("^");
    let mut last = 0;
    for m in TEMPLATE_PARAM.find_iter(normalized) {
        pattern.push_str(&regex::escape(&normalized[last..m.start()]));
        pattern.push_str("([^/]+?)");
        last = m.end();
    }
    pattern.push_str(&regex::escape(&normalized[last..]));
    pattern.push('$');
    Regex::new(&pattern).ok()
}

/// Reduce a raw log URL to the path a router would see.
///
/// Scheme and authority are dropped, as are the query string and fragment.
/// Relative targets (`users/1`) and anything `http::Uri` rejects yield `None`.
pub fn canonical_path(raw_url: &str) -> Option<String> {
    let without_fragment = raw_url.split('#').next().unwrap_or_default();
    if without_fragment.is_empty() {
        return None;
    }

    let uri: http::Uri = without_fragment.parse().ok()?;
    if uri.scheme().is_none() && !without_fragment.starts_with('/') {
        return None;
    }

    let path = uri.path();
    if path.is_empty() {
        Some("/".to_string())
    } else {
        Some(path.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ep(path: &str, method: &str, op: &str) -> Endpoint {
        Endpoint::new(path, method, "200", op)
    }

    #[test]
    fn test_basic_routing() {
        let endpoints = vec![
            ep("/users", "GET", "listUsers"),
            ep("/users", "POST", "createUser"),
            ep("/health", "GET", "health"),
        ];
        let matcher = RequestMatcher::build(&endpoints);

        assert_eq!(matcher.resolve("GET", "/users").unwrap().operation_id, "listUsers");
        assert_eq!(matcher.resolve("POST", "/users").unwrap().operation_id, "createUser");
        assert_eq!(matcher.resolve("GET", "/health").unwrap().operation_id, "health");
        assert!(matcher.resolve("GET", "/not/found").is_none());
    }

    #[test]
    fn test_parametric_route_keeps_contract_names() {
        let matcher =
            RequestMatcher::build(&[ep("/users/{userId}/posts/{postId}", "GET", "getPost")]);

        let m = matcher.resolve("GET", "/users/7/posts/99").unwrap();
        assert_eq!(m.operation_id, "getPost");
        assert_eq!(m.template, "/users/{userId}/posts/{postId}");
        assert_eq!(
            m.params,
            vec![
                ("userId".to_string(), "7".to_string()),
                ("postId".to_string(), "99".to_string()),
            ]
        );
    }

    #[test]
    fn test_duplicates_collapse_to_one_route() {
        let endpoints = vec![
            Endpoint::new("/users/{id}", "GET", "200", "getUser"),
            Endpoint::new("/users/{id}", "GET", "404", "getUser"),
            Endpoint::new("/users/{id}", "GET", "500", "getUser"),
        ];
        let matcher = RequestMatcher::build(&endpoints);
        assert_eq!(matcher.len(), 1);
    }

    #[test]
    fn test_conflicting_operation_first_registered_wins() {
        let endpoints = vec![
            ep("/users/{id}", "GET", "first"),
            ep("/users/{uid}", "GET", "second"),
        ];
        let matcher = RequestMatcher::build(&endpoints);
        assert_eq!(matcher.len(), 1);
        assert_eq!(matcher.resolve("GET", "/users/1").unwrap().operation_id, "first");
    }

    #[test]
    fn test_several_params_in_one_segment() {
        let endpoints = vec![
            ep("/reports/{year}-{month}", "GET", "getReport"),
            ep("/reports/latest", "GET", "latestReport"),
            ep("/files/{name}.json", "GET", "getFile"),
        ];
        let matcher = RequestMatcher::build(&endpoints);
        assert_eq!(matcher.len(), 3);

        let m = matcher.resolve("GET", "/reports/2024-05").unwrap();
        assert_eq!(m.operation_id, "getReport");
        assert_eq!(
            m.params,
            vec![
                ("year".to_string(), "2024".to_string()),
                ("month".to_string(), "05".to_string()),
            ]
        );

        assert_eq!(matcher.resolve("GET", "/reports/latest").unwrap().operation_id, "latestReport");
        assert_eq!(matcher.resolve("GET", "/files/a.json").unwrap().operation_id, "getFile");
        assert!(matcher.resolve("GET", "/reports/2024").is_none());
        assert!(matcher.resolve("GET", "/reports/2024-05/x").is_none());
        assert!(matcher.resolve("POST", "/reports/2024-05").is_none());
    }

    #[test]
    fn test_segment_pattern_escapes_literals() {
        let re = segment_pattern("/v1.0/{p0}-{p1}").unwrap();
        assert!(re.is_match("/v1.0/a-b"));
        assert!(!re.is_match("/v1x0/a-b"));
        assert!(!re.is_match("/v1.0/a/b-c"));
    }

    #[test]
    fn test_normalize_template() {
        let (path, names) = normalize_template("/orgs/{org}/repos/{repo}");
        assert_eq!(path, "/orgs/{p0}/repos/{p1}");
        assert_eq!(names, vec!["org".to_string(), "repo".to_string()]);

        let (path, names) = normalize_template("/static/path");
        assert_eq!(path, "/static/path");
        assert!(names.is_empty());
    }

    #[test]
    fn test_canonical_path() {
        assert_eq!(canonical_path("/users/42").as_deref(), Some("/users/42"));
        assert_eq!(canonical_path("/users/42?expand=true").as_deref(), Some("/users/42"));
        assert_eq!(canonical_path("/users/42#frag").as_deref(), Some("/users/42"));
        assert_eq!(
            canonical_path("http://localhost:8080/users/42?v=1#top").as_deref(),
            Some("/users/42")
        );
        assert_eq!(canonical_path("https://example.com").as_deref(), Some("/"));
        assert_eq!(canonical_path("users/42"), None);
        assert_eq!(canonical_path(""), None);
    }
}
