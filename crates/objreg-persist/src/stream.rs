//! The boundary between the coordinator and concrete stream formats.

use chrono::{DateTime, Utc};
use objreg_store::ObjectRecord;
use objreg_types::{Recipe, TypeDescriptor};
use serde::{Deserialize, Serialize};

use crate::error::PersistResult;

/// Which items a load asks the reader for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadSelector {
    All,
    ByName(Vec<String>),
    ByType(Vec<TypeDescriptor>),
}

/// One item yielded by a reader.
///
/// `type_desc` is `None` when the reader has no usable data for `name`
/// (requested but absent, or unreadable).
#[derive(Clone, Debug, PartialEq)]
pub struct StreamItem {
    pub type_desc: Option<TypeDescriptor>,
    pub name: String,
    pub recipe: Option<Recipe>,
}

impl StreamItem {
    /// An item for a name the reader found no data for.
    pub fn missing(name: impl Into<String>) -> Self {
        Self {
            type_desc: None,
            name: name.into(),
            recipe: None,
        }
    }
}

/// Serialized form of one record as written by the bundled adapters.
///
/// Only the recipe is persisted, never the value: loading reruns the
/// factory. Dependencies are kept by name for inspection; the recipe is
/// what the factory uses to resolve them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StreamEntry {
    #[serde(rename = "type")]
    pub type_desc: TypeDescriptor,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub recipe: Recipe,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl StreamEntry {
    pub fn from_record(record: &ObjectRecord) -> Self {
        Self {
            type_desc: record.type_desc().clone(),
            name: record.name().to_string(),
            created_at: record.created_at(),
            recipe: record.recipe().clone(),
            dependencies: record
                .dependencies()
                .iter()
                .map(|d| d.name().to_string())
                .collect(),
        }
    }

    pub fn into_item(self) -> StreamItem {
        StreamItem {
            type_desc: Some(self.type_desc),
            name: self.name,
            recipe: Some(self.recipe),
        }
    }
}

/// Source of items for a load.
///
/// Filtering by name or type is the reader's job. The provided methods
/// implement it on top of [`ObjectReader::all`]; readers with an index may
/// override them.
pub trait ObjectReader {
    /// Every item in stream order.
    fn all(&self) -> PersistResult<Vec<StreamItem>>;

    /// `(type, name)` of every readable item, without recipes.
    fn names(&self) -> PersistResult<Vec<(TypeDescriptor, String)>> {
        Ok(self
            .all()?
            .into_iter()
            .filter_map(|item| item.type_desc.map(|t| (t, item.name)))
            .collect())
    }

    /// Items with the requested names, in stream order, followed by a
    /// [`StreamItem::missing`] for every requested name not found.
    fn by_name(&self, names: &[String]) -> PersistResult<Vec<StreamItem>> {
        let all = self.all()?;
        let mut found = Vec::new();
        for item in all {
            if item.type_desc.is_some()
                && names.contains(&item.name)
                && !found.iter().any(|f: &StreamItem| f.name == item.name)
            {
                found.push(item);
            }
        }
        let mut seen_missing: Vec<&String> = Vec::new();
        for name in names {
            if !found.iter().any(|f| &f.name == name) && !seen_missing.contains(&name) {
                seen_missing.push(name);
            }
        }
        found.extend(seen_missing.into_iter().map(StreamItem::missing));
        Ok(found)
    }

    /// Items whose type is one of `types`, in stream order.
    fn by_type(&self, types: &[TypeDescriptor]) -> PersistResult<Vec<StreamItem>> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|item| item.type_desc.as_ref().is_some_and(|t| types.contains(t)))
            .collect())
    }

    /// Dispatch on a [`LoadSelector`].
    fn select(&self, selector: &LoadSelector) -> PersistResult<Vec<StreamItem>> {
        match selector {
            LoadSelector::All => self.all(),
            LoadSelector::ByName(names) => self.by_name(names),
            LoadSelector::ByType(types) => self.by_type(types),
        }
    }
}

/// Sink for a save.
pub trait ObjectWriter {
    fn write_object(&mut self, record: &ObjectRecord) -> PersistResult<()>;
}
