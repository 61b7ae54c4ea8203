use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;

/// Namespace for ids derived from a type name with [`TypeDescriptor::derived`].
const DESCRIPTOR_NAMESPACE: Uuid = Uuid::from_u128(0x6f62_6a72_6567_4d00_8000_7479_7065_7331);

/// Stable identity for a class of storable object.
///
/// A descriptor carries a short human-readable `name`, a globally unique
/// `id`, and an optional category path used for grouping in listings.
/// Equality and hashing use the `id` only: two descriptors with the same
/// id are the same type even if one was built with a different category.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "RawDescriptor")]
pub struct TypeDescriptor {
    name: String,
    id: Uuid,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    category: Vec<String>,
}

#[derive(Deserialize)]
struct RawDescriptor {
    name: String,
    id: Uuid,
    #[serde(default)]
    category: Vec<String>,
}

impl TryFrom<RawDescriptor> for TypeDescriptor {
    type Error = TypeError;

    fn try_from(raw: RawDescriptor) -> Result<Self, Self::Error> {
        Ok(Self::new(raw.name, raw.id)?.with_category(raw.category))
    }
}

impl TypeDescriptor {
    /// Create a descriptor with an explicit id.
    pub fn new(name: impl Into<String>, id: Uuid) -> Result<Self, TypeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TypeError::EmptyTypeName);
        }
        Ok(Self {
            name,
            id,
            category: Vec::new(),
        })
    }

    /// Create a descriptor whose id is derived (UUID v5) from its name.
    ///
    /// The same name always yields the same id, which keeps built-in types
    /// stable across processes without hard-coding UUIDs.
    pub fn derived(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        let id = Uuid::new_v5(&DESCRIPTOR_NAMESPACE, name.as_bytes());
        Self::new(name, id)
    }

    /// Attach a category path, replacing any existing one.
    pub fn with_category<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.category = path.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn category(&self) -> &[String] {
        &self.category
    }

    /// Category path joined with `/`, or `None` when uncategorized.
    pub fn category_path(&self) -> Option<String> {
        if self.category.is_empty() {
            None
        } else {
            Some(self.category.join("/"))
        }
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDescriptor({}, {})", self.name, self.id)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn empty_name_is_rejected() {
        assert_eq!(
            TypeDescriptor::new("", Uuid::new_v4()).unwrap_err(),
            TypeError::EmptyTypeName
        );
        assert!(TypeDescriptor::derived("   ").is_err());
    }

    #[test]
    fn derived_ids_are_stable() {
        let a = TypeDescriptor::derived("vector").unwrap();
        let b = TypeDescriptor::derived("vector").unwrap();
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), TypeDescriptor::derived("scalar").unwrap().id());
    }

    #[test]
    fn equality_ignores_name_and_category() {
        let id = Uuid::new_v4();
        let a = TypeDescriptor::new("curve", id).unwrap();
        let b = TypeDescriptor::new("yield-curve", id)
            .unwrap()
            .with_category(["rates", "curves"]);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
    }

    #[test]
    fn category_path_joins_segments() {
        let d = TypeDescriptor::derived("matrix")
            .unwrap()
            .with_category(["linalg", "dense"]);
        assert_eq!(d.category_path().as_deref(), Some("linalg/dense"));
        assert_eq!(TypeDescriptor::derived("x").unwrap().category_path(), None);
    }

    #[test]
    fn serde_roundtrip_keeps_category() {
        let d = TypeDescriptor::derived("matrix")
            .unwrap()
            .with_category(["linalg"]);
        let json = serde_json::to_string(&d).unwrap();
        let parsed: TypeDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, d);
        assert_eq!(parsed.name(), "matrix");
        assert_eq!(parsed.category(), ["linalg".to_string()]);
    }

    #[test]
    fn deserialize_rejects_empty_name() {
        let json = format!(r#"{{"name":"","id":"{}"}}"#, Uuid::new_v4());
        assert!(serde_json::from_str::<TypeDescriptor>(&json).is_err());
    }

    proptest! {
        #[test]
        fn distinct_ids_are_never_equal(name in "[a-z]{1,12}") {
            let a = TypeDescriptor::new(name.clone(), Uuid::new_v4()).unwrap();
            let b = TypeDescriptor::new(name, Uuid::new_v4()).unwrap();
            prop_assert_ne!(a, b);
        }
    }
}
