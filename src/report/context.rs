//! CI context captured from the process environment.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Environment variables copied into the report context, in output order.
pub const CONTEXT_KEYS: [&str; 9] = [
    "GIT_BRANCH",
    "GIT_REPOSITORY_URL",
    "GIT_REVISION",
    "GIT_TAG",
    "YAMATO_JOB_ID",
    "YAMATO_JOBDEFINITION_NAME",
    "YAMATO_OWNER_EMAIL",
    "YAMATO_PROJECT_ID",
    "YAMATO_PROJECT_NAME",
];

/// Key/value pairs describing the CI job that produced a report.
///
/// Only keys from [`CONTEXT_KEYS`] with a non-empty value are kept, and they
/// serialise in the order that list defines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    entries: Vec<(&'static str, String)>,
}

impl Context {
    /// Creates an empty context.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Captures the context from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Captures the context through `lookup`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pvpcheck::Context;
    ///
    /// let context = Context::from_lookup(|key| (key == "GIT_TAG").then(|| "v1.0.0".to_owned()));
    /// assert_eq!(context.get("GIT_TAG"), Some("v1.0.0"));
    /// assert_eq!(context.len(), 1);
    /// ```
    #[must_use]
    pub fn from_lookup<F>(mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let entries = CONTEXT_KEYS
            .iter()
            .filter_map(|&key| {
                lookup(key)
                    .filter(|value| !value.is_empty())
                    .map(|value| (key, value))
            })
            .collect();
        Self { entries }
    }

    /// Returns the value captured for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == key)
            .map(|(_, value)| value.as_str())
    }

    /// Iterates over captured pairs in output order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (*key, value.as_str()))
    }

    /// Number of captured keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Context {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn keeps_set_keys_in_declared_order() {
        temp_env::with_vars(
            [
                ("YAMATO_PROJECT_NAME", Some("tools")),
                ("GIT_BRANCH", Some("main")),
                ("GIT_TAG", None),
                ("YAMATO_JOB_ID", Some("")),
                ("GIT_REVISION", Some("abc123")),
                ("GIT_REPOSITORY_URL", None),
                ("YAMATO_JOBDEFINITION_NAME", None),
                ("YAMATO_OWNER_EMAIL", None),
                ("YAMATO_PROJECT_ID", None),
                ("UNRELATED", Some("ignored")),
            ],
            || {
                let context = Context::from_env();
                let pairs: Vec<(&str, &str)> = context.iter().collect();
                assert_eq!(
                    pairs,
                    vec![
                        ("GIT_BRANCH", "main"),
                        ("GIT_REVISION", "abc123"),
                        ("YAMATO_PROJECT_NAME", "tools"),
                    ]
                );
            },
        );
    }

    #[rstest]
    #[case::unset(None)]
    #[case::empty(Some(""))]
    fn omits_missing_values(#[case] value: Option<&str>) {
        let context = Context::from_lookup(|_| value.map(str::to_owned));
        assert!(context.is_empty());
        assert_eq!(context.get("GIT_BRANCH"), None);
    }

    #[test]
    fn serialises_as_an_ordered_object() {
        let context = Context::from_lookup(|key| match key {
            "YAMATO_OWNER_EMAIL" => Some("ci@example.com".to_owned()),
            "GIT_REPOSITORY_URL" => Some("https://example.com/tools.git".to_owned()),
            _ => None,
        });

        let json = serde_json::to_string(&context).expect("serialise context");
        assert_eq!(
            json,
            r#"{"GIT_REPOSITORY_URL":"https://example.com/tools.git","YAMATO_OWNER_EMAIL":"ci@example.com"}"#
        );
    }

    #[test]
    fn empty_context_serialises_as_empty_object() {
        let json = serde_json::to_string(&Context::empty()).expect("serialise context");
        assert_eq!(json, "{}");
    }
}
