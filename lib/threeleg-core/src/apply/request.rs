use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::{Deserialize, Serialize};

/// Multi-valued, insertion-ordered string map.
///
/// Keys are compared as-is: `Authorization` and `authorization` are distinct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MultiMap {
    entries: IndexMap<String, Vec<String>>,
}

impl MultiMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value, keeping the existing ones.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries
            .entry(name.into())
            .or_default()
            .push(value.into());
    }

    /// Replaces every value of `name` with a single one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        match self.entries.entry(name.into()) {
            Entry::Occupied(mut entry) => *entry.get_mut() = vec![value.into()],
            Entry::Vacant(entry) => {
                entry.insert(vec![value.into()]);
            }
        }
    }

    /// Removes every value of `name`, returning them.
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.entries.shift_remove(name)
    }

    /// Values of `name`, empty when absent.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// First value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// Returns `true` when `name` has at least one value.
    pub fn contains(&self, name: &str) -> bool {
        !self.get_all(name).is_empty()
    }

    /// Total number of values, across all names.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Returns `true` when the map holds no value.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(name, values)| {
            values
                .iter()
                .map(move |value| (name.as_str(), value.as_str()))
        })
    }
}

impl<K, V> FromIterator<(K, V)> for MultiMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.append(name, value);
        }
        map
    }
}

/// Request headers.
pub type RequestHeaders = MultiMap;

/// Request query parameters.
pub type RequestParams = MultiMap;

/// The parts of an outbound HTTP request a bearer token can be placed in.
///
/// The request is owned by the caller, which turns it into its own HTTP
/// request type once the token is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundRequest {
    /// Header map.
    pub headers: RequestHeaders,
    /// Query parameters.
    pub params: RequestParams,
    /// Raw body content.
    pub body: String,
}

impl OutboundRequest {
    /// Creates an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.append(name, value);
        self
    }

    /// Sets the body content.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_keep_multiple_values_in_order() {
        let mut headers = RequestHeaders::new();
        headers.append("Accept", "text/html");
        headers.append("X-Trace", "1");
        headers.append("Accept", "application/json");

        assert_eq!(headers.get_all("Accept"), ["text/html", "application/json"]);
        assert_eq!(headers.len(), 3);
        let pairs: Vec<_> = headers.iter().collect();
        assert_eq!(
            pairs,
            [
                ("Accept", "text/html"),
                ("Accept", "application/json"),
                ("X-Trace", "1"),
            ]
        );
    }

    #[test]
    fn should_replace_all_values_on_set() {
        let mut headers: RequestHeaders = [("Authorization", "a"), ("Authorization", "b")]
            .into_iter()
            .collect();

        headers.set("Authorization", "c");

        assert_eq!(headers.get_all("Authorization"), ["c"]);
    }

    #[test]
    fn should_compare_names_case_sensitively() {
        let mut headers: RequestHeaders = [("authorization", "lower")].into_iter().collect();

        assert!(headers.remove("Authorization").is_none());
        assert_eq!(headers.get("authorization"), Some("lower"));
    }
}
