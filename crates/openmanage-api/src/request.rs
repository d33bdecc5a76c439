use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use url::Url;
use url::form_urlencoded;

use crate::error::Error;

/// One logical request against a session.
///
/// A stateless value object: method, a path relative to the family root
/// (or host-absolute when it already starts with that root), unique query
/// parameters, an optional JSON body, extra headers, and an optional
/// timeout override for slow endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    method: Method,
    path: String,
    query: BTreeMap<String, String>,
    body: Option<Value>,
    headers: BTreeMap<String, String>,
    timeout: Option<Duration>,
}

impl RequestSpec {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: BTreeMap::new(),
            body: None,
            headers: BTreeMap::new(),
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a query parameter. A repeated key replaces the earlier value.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_params(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    pub fn json_body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn timeout_override(&self) -> Option<Duration> {
        self.timeout
    }

    /// Resolve against the device base URL and the family's resource root.
    pub(crate) fn resolve(&self, base: &Url, root: &str) -> Result<Url, Error> {
        let path = self.path.trim();
        let full_path = if is_under_root(path, root) {
            path.to_owned()
        } else if path.trim_start_matches('/').is_empty() {
            root.to_owned()
        } else {
            format!("{root}/{}", path.trim_start_matches('/'))
        };

        let mut url = base.join(&full_path)?;
        if !self.query.is_empty() {
            let encoded = encode_query(&self.query);
            let merged = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
                _ => encoded,
            };
            url.set_query(Some(&merged));
        }
        Ok(url)
    }
}

fn is_under_root(path: &str, root: &str) -> bool {
    path.strip_prefix(root)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'))
}

/// Form-encode query pairs with spaces as `%20`.
///
/// OData filters on OME reject `+` for spaces. `byte_serialize` escapes a
/// literal `+` as `%2B`, so every remaining `+` is an encoded space.
fn encode_query(query: &BTreeMap<String, String>) -> String {
    query
        .iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode_component(raw: &str) -> String {
    form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://192.168.0.1").expect("base url")
    }

    #[test]
    fn relative_paths_join_the_family_root() {
        let url = RequestSpec::get("Systems")
            .resolve(&base(), "/redfish/v1")
            .expect("url");
        assert_eq!(url.as_str(), "https://192.168.0.1/redfish/v1/Systems");

        let url = RequestSpec::get("/Consoles")
            .resolve(&base(), "/omevv/GatewayService/v1")
            .expect("url");
        assert_eq!(url.path(), "/omevv/GatewayService/v1/Consoles");
    }

    #[test]
    fn rooted_paths_are_used_as_is() {
        let url = RequestSpec::post("/redfish/v1/Systems/System.Embedded.1/Actions/ComputerSystem.Reset")
            .resolve(&base(), "/redfish/v1")
            .expect("url");
        assert_eq!(
            url.path(),
            "/redfish/v1/Systems/System.Embedded.1/Actions/ComputerSystem.Reset"
        );
    }

    #[test]
    fn query_spaces_encode_as_percent_twenty() {
        let url = RequestSpec::get("JobService/Jobs")
            .query("$filter", "JobType/Id eq 8")
            .query("$top", "2")
            .resolve(&base(), "/api")
            .expect("url");
        let query = url.query().expect("query");
        assert!(query.contains("JobType%2FId%20eq%208"), "{query}");
        assert!(!query.contains('+'));
    }

    #[test]
    fn literal_plus_survives_encoding() {
        assert_eq!(encode_component("a+b c"), "a%2Bb%20c");
    }

    #[test]
    fn next_link_query_is_merged() {
        let url = RequestSpec::get("/api/JobService/Jobs?$skip=20")
            .query("$top", "10")
            .resolve(&base(), "/api")
            .expect("url");
        assert_eq!(url.query(), Some("$skip=20&%24top=10"));
    }

    #[test]
    fn repeated_query_key_keeps_last_value() {
        let spec = RequestSpec::get("x").query("a", "1").query("a", "2");
        assert_eq!(spec.query_params().get("a").map(String::as_str), Some("2"));
    }
}
