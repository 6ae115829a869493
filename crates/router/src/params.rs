//! Path parameters extracted from a matched request path.

use serde::Serialize;
use serde::ser::SerializeMap;
use std::sync::Arc;

/// Represents the path parameters bound by a matched route.
///
/// Parameters keep the order in which their names appear in the pattern. For example, matching
/// `/articles/{category}[/{title}]` against `/articles/tech` yields `category = "tech"` followed
/// by `title` bound to no value, since the optional group is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: Vec<(Arc<str>, Option<String>)>,
}

impl PathParams {
    #[inline]
    pub(crate) fn new(params: Vec<(Arc<str>, Option<String>)>) -> Self {
        Self { params }
    }

    /// Creates an empty PathParams instance with no parameters
    #[inline]
    pub fn empty() -> Self {
        Self { params: Vec::new() }
    }

    /// Returns true if there are no path parameters
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns the number of path parameters, bound or not
    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Gets the value of a path parameter by its name
    ///
    /// Returns None if the parameter doesn't exist or belongs to an absent optional group
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = key.as_ref();
        self.params.iter().find(|(name, _)| name.as_ref() == key).and_then(|(_, value)| value.as_deref())
    }

    /// Whether the pattern declares a parameter with this name
    pub fn contains(&self, key: impl AsRef<str>) -> bool {
        let key = key.as_ref();
        self.params.iter().any(|(name, _)| name.as_ref() == key)
    }

    /// Parameter values in declaration order
    pub fn values(&self) -> impl Iterator<Item = Option<&str>> {
        self.params.iter().map(|(_, value)| value.as_deref())
    }

    /// `(name, value)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.params.iter().map(|(name, value)| (name.as_ref(), value.as_deref()))
    }
}

/// Serializes as a JSON object keeping declaration order, absent values become `null`.
impl Serialize for PathParams {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.params.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::PathParams;
    use std::sync::Arc;

    fn params() -> PathParams {
        PathParams::new(vec![(Arc::from("category"), Some("tech".to_string())), (Arc::from("title"), None)])
    }

    #[test]
    fn test_get() {
        let params = params();
        assert_eq!(params.get("category"), Some("tech"));
        assert_eq!(params.get("title"), None);
        assert_eq!(params.get("missing"), None);
        assert!(params.contains("title"));
        assert!(!params.contains("missing"));
    }

    #[test]
    fn test_values_keep_declaration_order() {
        let params = params();
        assert_eq!(params.values().collect::<Vec<_>>(), vec![Some("tech"), None]);
        assert_eq!(params.len(), 2);
        assert!(!params.is_empty());
        assert!(PathParams::empty().is_empty());
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&params()).unwrap();
        assert_eq!(json, r#"{"category":"tech","title":null}"#);
    }
}
