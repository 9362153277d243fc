// Query keys: stable composite identifiers for cached fetches.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum KeySegment {
    Name(String),
    Id(i64),
    /// Sorted map, so parameter order never changes the key.
    Params(BTreeMap<String, String>),
}

impl From<&str> for KeySegment {
    fn from(value: &str) -> Self {
        KeySegment::Name(value.to_string())
    }
}

impl From<String> for KeySegment {
    fn from(value: String) -> Self {
        KeySegment::Name(value)
    }
}

impl From<&String> for KeySegment {
    fn from(value: &String) -> Self {
        KeySegment::Name(value.clone())
    }
}

impl From<i64> for KeySegment {
    fn from(value: i64) -> Self {
        KeySegment::Id(value)
    }
}

impl From<i32> for KeySegment {
    fn from(value: i32) -> Self {
        KeySegment::Id(i64::from(value))
    }
}

impl From<u32> for KeySegment {
    fn from(value: u32) -> Self {
        KeySegment::Id(i64::from(value))
    }
}

impl From<BTreeMap<String, String>> for KeySegment {
    fn from(value: BTreeMap<String, String>) -> Self {
        KeySegment::Params(value)
    }
}

/// A path component of a key once `/`-joined names are split apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPart<'a> {
    Name(&'a str),
    Id(i64),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct QueryKey(Vec<KeySegment>);

impl QueryKey {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_segments(segments: Vec<KeySegment>) -> Self {
        Self(segments)
    }

    pub fn segment(mut self, segment: impl Into<KeySegment>) -> Self {
        self.0.push(segment.into());
        self
    }

    /// Append request parameters. Consecutive parameter segments merge.
    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let incoming = params.into_iter().map(|(k, v)| (k.into(), v.into()));
        match self.0.last_mut() {
            Some(KeySegment::Params(existing)) => existing.extend(incoming),
            _ => self.0.push(KeySegment::Params(incoming.collect())),
        }
        self
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Prefix match used by invalidation: `["teams"]` covers
    /// `["teams", 7, "messages"]`. The empty key covers everything.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Path components with `/`-separated names split, the `api` prefix
    /// dropped and numeric names read as ids. Parameters are skipped.
    pub fn path_parts(&self) -> Vec<PathPart<'_>> {
        let mut parts = Vec::new();
        for segment in &self.0 {
            match segment {
                KeySegment::Name(name) => {
                    for piece in name.split('/').filter(|piece| !piece.is_empty()) {
                        match piece.parse::<i64>() {
                            Ok(id) => parts.push(PathPart::Id(id)),
                            Err(_) => parts.push(PathPart::Name(piece)),
                        }
                    }
                }
                KeySegment::Id(id) => parts.push(PathPart::Id(*id)),
                KeySegment::Params(_) => {}
            }
        }
        if matches!(parts.first(), Some(PathPart::Name("api"))) {
            parts.remove(0);
        }
        parts
    }

    /// `teams/7/messages`
    pub fn path(&self) -> String {
        self.path_parts()
            .iter()
            .map(|part| match part {
                PathPart::Name(name) => name.to_string(),
                PathPart::Id(id) => id.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn query_params(&self) -> Vec<(String, String)> {
        let mut merged = BTreeMap::new();
        for segment in &self.0 {
            if let KeySegment::Params(params) = segment {
                merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        merged.into_iter().collect()
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.path())?;
        let params = self.query_params();
        if !params.is_empty() {
            let rendered = params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&");
            write!(f, "?{}", rendered)?;
        }
        Ok(())
    }
}

/// Build a [`QueryKey`] from segments: `query_key!["teams", team_id, "messages"]`.
#[macro_export]
macro_rules! query_key {
    ($($segment:expr),* $(,)?) => {
        $crate::infrastructure::query_key::QueryKey::from_segments(vec![
            $($crate::infrastructure::query_key::KeySegment::from($segment)),*
        ])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matching() {
        let teams = query_key!["teams"];
        let messages = query_key!["teams", 7, "messages"];
        assert!(messages.starts_with(&teams));
        assert!(teams.starts_with(&teams));
        assert!(!teams.starts_with(&messages));
        assert!(!query_key!["players"].starts_with(&teams));
        assert!(messages.starts_with(&QueryKey::new()));
    }

    #[test]
    fn test_params_are_order_insensitive() {
        let a = query_key!["events"].params([("type", "game"), ("status", "scheduled")]);
        let b = query_key!["events"].params([("status", "scheduled"), ("type", "game")]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "[events]?status=scheduled&type=game");
    }

    #[test]
    fn test_path_normalization() {
        let legacy = query_key!["/api/teams", 3i64, "members"];
        assert_eq!(legacy.path(), "teams/3/members");
        assert_eq!(
            legacy.path_parts(),
            vec![PathPart::Name("teams"), PathPart::Id(3), PathPart::Name("members")]
        );
        assert_eq!(query_key!["notifications", "unread"].path(), "notifications/unread");
    }
}
