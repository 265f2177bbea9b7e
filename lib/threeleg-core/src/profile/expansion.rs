use std::fmt::Debug;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::{Captures, Regex};

/// Regular expression for matching placeholders in the format `${name}`.
static RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(?<name>[^{}]+)}").expect("a valid regex"));

/// Expands placeholders embedded in raw profile values.
///
/// Expansion never fails: an unknown placeholder is left as written so that
/// the validator reports the offending value.
pub trait PropertyExpander: Debug + Send + Sync {
    /// Returns `value` with every known placeholder replaced.
    fn expand(&self, value: &str) -> String;
}

/// Expander that returns values unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExpansion;

impl PropertyExpander for NoExpansion {
    fn expand(&self, value: &str) -> String {
        value.to_string()
    }
}

/// Property lookup table for `${name}` placeholders.
///
/// ```rust
/// use threeleg_core::{PropertyContext, PropertyExpander};
///
/// let context = PropertyContext::new()
///     .with_property("host", "auth.example.com");
///
/// assert_eq!(
///     context.expand("https://${host}/authorize"),
///     "https://auth.example.com/authorize"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct PropertyContext {
    properties: IndexMap<String, String>,
}

impl PropertyContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a property.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Returns the value of a property.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for PropertyContext
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let properties = iter
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        Self { properties }
    }
}

impl PropertyExpander for PropertyContext {
    fn expand(&self, value: &str) -> String {
        RE.replace_all(value, |caps: &Captures<'_>| {
            let name = &caps["name"];
            match self.get(name.trim()) {
                Some(replacement) => replacement.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
    }
}
